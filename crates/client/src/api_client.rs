//! Demo call to the companion backend.

use bhvr_core::ApiResponse;
use bhvr_infra::ClientConfig;

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("network error: {0}")]
    Network(String),
    #[error("API error ({0})")]
    Status(u16),
    #[error("parse error: {0}")]
    Parse(String),
}

/// Client for `GET {server_url}/hello`.
#[derive(Debug, Clone)]
pub struct HelloClient {
    http: reqwest::Client,
    base_url: String,
}

impl HelloClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.server_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Call `/hello` and decode the payload.
    pub async fn fetch(&self) -> Result<ApiResponse, ApiClientError> {
        let url = format!("{}/hello", self.base_url);

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiClientError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ApiClientError::Status(resp.status().as_u16()));
        }

        resp.json::<ApiResponse>()
            .await
            .map_err(|e| ApiClientError::Parse(e.to_string()))
    }

    /// The "Call API" button: the response on success, otherwise logged and dropped.
    pub async fn send_request(&self) -> Option<ApiResponse> {
        match self.fetch().await {
            Ok(resp) => Some(resp),
            Err(err) => {
                tracing::warn!(base_url = %self.base_url, error = %err, "hello request failed");
                None
            }
        }
    }
}
