//! API configuration.

use crate::error::{OrmError, Result};
use crate::transport::RequestOptions;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

fn default_validate_ssl() -> bool {
    true
}

fn default_timeout() -> Option<f64> {
    Some(1.0)
}

/// Where the API lives and how requests to it are made.
///
/// Deserializes from the upper-case keys `API_ROOT`, `VALIDATE_SSL` and `TIMEOUT`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ApiConfig {
    pub api_root: String,
    #[serde(default = "default_validate_ssl")]
    pub validate_ssl: bool,
    /// Seconds; `None` disables the timeout.
    #[serde(default = "default_timeout")]
    pub timeout: Option<f64>,
}

impl ApiConfig {
    pub fn new(api_root: impl Into<String>) -> Self {
        Self {
            api_root: api_root.into(),
            validate_ssl: default_validate_ssl(),
            timeout: default_timeout(),
        }
    }

    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| OrmError::Config(e.to_string()))
    }

    pub fn with_timeout(mut self, timeout: Option<f64>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_validate_ssl(mut self, validate_ssl: bool) -> Self {
        self.validate_ssl = validate_ssl;
        self
    }

    /// Per-call options handed to the transport.
    pub fn request_options(&self) -> RequestOptions {
        RequestOptions {
            timeout: self
                .timeout
                .filter(|secs| secs.is_finite() && *secs > 0.0)
                .map(Duration::from_secs_f64),
            validate_ssl: self.validate_ssl,
        }
    }

    /// Absolute URL of an endpoint path. Absolute paths pass through untouched.
    pub fn url_for(&self, path: &str) -> String {
        if path.contains("://") {
            return path.to_owned();
        }
        let root = self.api_root.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{root}/{path}")
    }
}
