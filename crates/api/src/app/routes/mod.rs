use axum::{Router, routing::get};

pub mod system;

/// Router for the public demo endpoints.
pub fn router() -> Router {
    Router::new().route("/hello", get(system::hello))
}
