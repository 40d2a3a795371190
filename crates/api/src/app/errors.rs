use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use serde_json::json;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub async fn not_found(uri: Uri) -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", format!("no route for {uri}"))
}
