//! Axum router configuration for all endpoints

use axum::{
  routing::{get, post},
  Router,
};

use crate::server::handlers::{self, AppState};

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
  Router::new()
    .route("/status", get(handlers::status))
    .route("/roles", get(handlers::roles))
    .route("/statistics", get(handlers::statistics))
    .route("/filters/options", get(handlers::filter_options))
    .route("/search", post(handlers::search))
    .route("/research", post(handlers::research))
    .with_state(state)
}
