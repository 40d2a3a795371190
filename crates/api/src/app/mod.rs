//! HTTP application wiring (Axum router).
//!
//! - `routes/`: handlers
//! - `errors.rs`: consistent JSON error responses

use axum::{Router, routing::get};

pub mod errors;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app() -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .fallback(errors::not_found)
}
