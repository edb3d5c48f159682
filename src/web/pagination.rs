//! Page slicing for list endpoints.

use serde::{Deserialize, Serialize};

use super::error::AppError;

/// `?page=N` query parameter (1-based).
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Cut `items` down to the requested page.
///
/// An empty list still has one (empty) first page; any page past the last
/// one, or page 0, is a 404.
pub fn paginate<T>(items: Vec<T>, query: PageQuery, per_page: usize) -> Result<Page<T>, AppError> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page).max(1);
    let page = query.page.unwrap_or(1);

    if page == 0 || page > total_pages {
        return Err(AppError::PageNotFound(page));
    }

    let items = items
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    Ok(Page {
        items,
        page,
        per_page,
        total_items,
        total_pages,
        has_next: page < total_pages,
        has_previous: page > 1,
    })
}
