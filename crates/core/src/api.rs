//! Payload shared between the companion backend and its clients.

use serde::{Deserialize, Serialize};

/// Body of `GET /hello`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub message: String,
    pub success: bool,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }
}
