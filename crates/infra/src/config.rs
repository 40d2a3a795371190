//! Client configuration loading.
//!
//! Two values come from the environment, each with a hardcoded fallback:
//!
//! | variable          | meaning                                   | fallback                                |
//! |-------------------|-------------------------------------------|-----------------------------------------|
//! | `BHVR_SERVER_URL` | base URL of the companion backend         | `http://localhost:3000`                 |
//! | `BHVR_APP_ID`     | hosted namespace the collection lives in  | `19a9cbb9-2c1b-4591-a5f5-498e93c5803d`  |

use bhvr_core::AppId;
use thiserror::Error;

pub const SERVER_URL_VAR: &str = "BHVR_SERVER_URL";
pub const APP_ID_VAR: &str = "BHVR_APP_ID";

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";
pub const DEFAULT_APP_ID: &str = "19a9cbb9-2c1b-4591-a5f5-498e93c5803d";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("BHVR_APP_ID is not a valid app id: {0}")]
    InvalidAppId(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL without a trailing slash.
    pub server_url: String,
    pub app_id: AppId,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the environment, a map in tests, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_url = match lookup(SERVER_URL_VAR).filter(|v| !v.trim().is_empty()) {
            Some(url) => url.trim().trim_end_matches('/').to_string(),
            None => {
                tracing::debug!("{SERVER_URL_VAR} not set; using {DEFAULT_SERVER_URL}");
                DEFAULT_SERVER_URL.to_string()
            }
        };

        let raw_app_id = lookup(APP_ID_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_APP_ID.to_string());
        let app_id = raw_app_id
            .parse::<AppId>()
            .map_err(|e| ConfigError::InvalidAppId(e.to_string()))?;

        Ok(Self { server_url, app_id })
    }
}
