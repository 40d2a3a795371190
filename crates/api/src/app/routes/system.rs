use axum::{Json, http::StatusCode};

use bhvr_core::ApiResponse;

/// Fixed greeting returned by `/hello`.
pub const HELLO_MESSAGE: &str = "Hello BHVR!";

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn hello() -> Json<ApiResponse> {
    tracing::debug!("serving /hello");
    Json(ApiResponse::ok(HELLO_MESSAGE))
}
