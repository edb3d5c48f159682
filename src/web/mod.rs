//! HTTP request layer.
//!
//! Authentication, pagination and JSON rendering around the core store.
//! Handlers take the store lock only for the duration of one call into the
//! core and never hold it across an `.await`.

pub mod auth;
pub mod error;
pub mod extract;
pub mod pagination;
pub mod routes;

pub use auth::CurrentUser;
pub use error::AppError;
pub use extract::{ApiJson, ApiPath};

use std::sync::Arc;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Database;
use crate::session::{SqliteVisitCounter, VisitCounter};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub visits: Arc<dyn VisitCounter>,
    pub config: Arc<Config>,
}

impl AppState {
    /// State backed by `db`, with visit counts stored in the same database.
    pub fn new(db: Arc<Database>, config: Config) -> Self {
        let visits = Arc::new(SqliteVisitCounter::new(Arc::clone(&db)));
        Self {
            db,
            visits,
            config: Arc::new(config),
        }
    }

    pub fn with_visit_counter(mut self, visits: Arc<dyn VisitCounter>) -> Self {
        self.visits = visits;
        self
    }

    pub fn page_size(&self) -> usize {
        self.config.fleet.page_size
    }
}

/// Build the router with every route and middleware layer.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .merge(auth::routes())
        .merge(routes::index::routes())
        .merge(routes::manufacturers::routes())
        .merge(routes::cars::routes())
        .merge(routes::drivers::routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
