//! # Transport Boundary
//!
//! The HTTP layer is an external collaborator. The ORM hands it fully formed
//! [`ApiRequest`]s and expects a status code plus an optional JSON body back.
//! Anything that implements [`Transport`] can sit behind an API: a real HTTP
//! client, the in-memory [`MockTransport`](crate::mock::MockTransport), or a
//! local server used in end-to-end tests.

use crate::error::TransportError;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call options derived from [`ApiConfig`](crate::config::ApiConfig).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    pub timeout: Option<Duration>,
    pub validate_ssl: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            validate_ssl: true,
        }
    }
}

/// A request ready to go over the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Endpoint path relative to the API root, e.g. `articles/1`.
    pub path: String,
    /// Absolute URL of the endpoint.
    pub url: String,
    /// JSON:API payload; `None` for bodiless requests.
    pub body: Option<Value>,
    pub options: RequestOptions,
}

/// What came back: the status code and the decoded JSON body, if there was one.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl RawResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            body: Some(body),
        }
    }

    pub fn empty(status: u16) -> Self {
        Self { status, body: None }
    }
}

/// Sends requests to a JSON:API server.
///
/// Implementations report connection-level failures as
/// [`TransportError::Connection`] and a body that is not JSON as
/// [`TransportError::InvalidResponse`]. Status classification happens above
/// this layer, so 4xx and 5xx answers come back as ordinary [`RawResponse`]s.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, request: ApiRequest) -> Result<RawResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() {
        assert_eq!(Method::Patch.to_string(), "PATCH");
        assert_eq!(Method::Get.as_str(), "GET");
    }

    #[test]
    fn test_default_options_validate_ssl() {
        let options = RequestOptions::default();
        assert!(options.validate_ssl);
        assert_eq!(options.timeout, None);
    }
}
