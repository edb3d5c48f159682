//! Landing page.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::projections;
use crate::web::{AppError, AppState, CurrentUser};

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub num_drivers: i64,
    pub num_cars: i64,
    pub num_manufacturers: i64,
    pub num_visits: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(index))
}

/// GET / - fleet totals plus this session's visit count (0 on first view)
async fn index(State(state): State<AppState>, user: CurrentUser) -> Result<Json<IndexResponse>, AppError> {
    let counts = state.db.read(projections::counts)?;
    let num_visits = state.visits.get_and_increment(&user.session_token)?;

    Ok(Json(IndexResponse {
        num_drivers: counts.driver_count,
        num_cars: counts.car_count,
        num_manufacturers: counts.manufacturer_count,
        num_visits,
    }))
}
