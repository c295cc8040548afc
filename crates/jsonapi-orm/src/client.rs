//! # API Client
//!
//! [`Api`] binds a [`Transport`] to an [`ApiConfig`]; [`Endpoint`] is a handle on
//! one path below the API root. Requests carry the object as `{"data": …}`,
//! non-success statuses become [`TransportError`]s and every successful body is
//! decoded into a [`Document`].

use crate::config::ApiConfig;
use crate::document::{Document, ResourceObject};
use crate::error::{Result, TransportError};
use crate::transport::{ApiRequest, Method, RawResponse, Transport};
use crate::value::JsonData;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// A transport plus the configuration it is used with. Cheap to clone.
#[derive(Clone)]
pub struct Api {
    transport: Arc<dyn Transport>,
    config: Arc<ApiConfig>,
}

impl Api {
    pub fn new(transport: Arc<dyn Transport>, config: ApiConfig) -> Self {
        Self {
            transport,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn endpoint(&self, path: impl Into<String>) -> Endpoint {
        Endpoint {
            path: path.into(),
            api: self.clone(),
        }
    }
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api").field("config", &self.config).finish()
    }
}

/// A successful answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status_code: u16,
    pub content: Document,
}

impl ApiResponse {
    /// True for `201 Created`, the only status whose body describes a new resource.
    pub fn is_created(&self) -> bool {
        self.status_code == 201
    }
}

/// One path below the API root.
#[derive(Clone)]
pub struct Endpoint {
    path: String,
    api: Api,
}

impl Endpoint {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn url(&self) -> String {
        self.api.config.url_for(&self.path)
    }

    pub async fn get(&self) -> Result<ApiResponse> {
        self.request(Method::Get, None).await
    }

    pub async fn post(&self, object: &ResourceObject) -> Result<ApiResponse> {
        self.request(Method::Post, Some(object)).await
    }

    pub async fn put(&self, object: &ResourceObject) -> Result<ApiResponse> {
        self.request(Method::Put, Some(object)).await
    }

    pub async fn patch(&self, object: &ResourceObject) -> Result<ApiResponse> {
        self.request(Method::Patch, Some(object)).await
    }

    pub async fn delete(&self) -> Result<ApiResponse> {
        self.request(Method::Delete, None).await
    }

    #[tracing::instrument(skip(self, object), fields(path = %self.path))]
    pub async fn request(
        &self,
        method: Method,
        object: Option<&ResourceObject>,
    ) -> Result<ApiResponse> {
        let body = object.map(|object| {
            let mut payload = Map::new();
            payload.insert("data".to_owned(), object.as_data());
            Value::Object(payload)
        });
        let request = ApiRequest {
            method,
            path: self.path.clone(),
            url: self.url(),
            body,
            options: self.api.config.request_options(),
        };

        debug!("Sending request");
        let raw = self.api.transport.request(request).await.map_err(|e| {
            warn!(error = %e, "Transport failed");
            e
        })?;
        let response = parse_response(raw)?;
        debug!(status = response.status_code, "Received response");
        Ok(response)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint").field("path", &self.path).finish()
    }
}

fn parse_response(raw: RawResponse) -> Result<ApiResponse> {
    let RawResponse { status, body } = raw;
    if status >= 500 {
        warn!(status, "Server error");
        return Err(TransportError::Server {
            status,
            content: body.unwrap_or_default(),
        }
        .into());
    }
    if status >= 400 {
        debug!(status, "Client error");
        return Err(TransportError::Client {
            status,
            content: body.unwrap_or_default(),
        }
        .into());
    }

    let content = match body {
        Some(body) => Document::from_data(&body)?,
        None => Document::default(),
    };
    Ok(ApiResponse {
        status_code: status,
        content,
    })
}
