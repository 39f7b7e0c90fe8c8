//! REST API for chronicle
//!
//! Exposes search and research over HTTP with axum, wrapped in the same response envelope for
//! every endpoint.

pub mod handlers;
pub mod routing;
pub mod startup;
pub mod types;

pub use handlers::AppState;
pub use routing::create_router;
pub use startup::start_server;
