//! # Mock Transport & Testing Guide
//!
//! [`MockTransport`] implements [`Transport`] entirely in memory. Queue the
//! requests you expect together with the answers to give, run the code under
//! test, then inspect what was actually sent.
//!
//! ## When to use the mock vs a local server
//!
//! | Feature | MockTransport | In-memory server |
//! |---------|---------------|------------------|
//! | **State** | None (scripted answers) | Real resource store |
//! | **Determinism** | Exact request order is asserted | Any order works |
//! | **Error Injection** | Easy (`return_err`, 4xx/5xx bodies) | Only what the server models |
//! | **Use Case** | Unit testing ORM and model logic | End-to-end flows |
//!
//! ## Example
//!
//! ```rust
//! use jsonapi_orm::config::ApiConfig;
//! use jsonapi_orm::mock::MockTransport;
//! use jsonapi_orm::orm::OrmApi;
//! use jsonapi_orm::fields::ModelDecl;
//! use jsonapi_orm::transport::Method;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     // 1. Script the server
//!     let mock = Arc::new(MockTransport::new());
//!     mock.expect(Method::Get, "people/1")
//!         .return_ok(200, json!({"data": {"type": "people", "id": "1", "attributes": {"name": "Dan"}}}));
//!
//!     // 2. Build the ORM on top of it
//!     let orm = OrmApi::new(mock.clone(), ApiConfig::new("http://localhost/api"));
//!     let people = orm.register(ModelDecl::new("people").attribute("name", "name")).unwrap();
//!
//!     // 3. Exercise the code under test
//!     let person = people.from_id("1");
//!     assert_eq!(person.attribute("name").await.unwrap(), json!("Dan"));
//!
//!     // 4. Check that every expectation was used
//!     mock.verify();
//! }
//! ```
//!
//! ## Testing Failure Scenarios
//!
//! Answers with a 4xx or 5xx status surface as
//! [`TransportError::Client`] / [`TransportError::Server`] once they pass
//! through an endpoint. Connection-level failures are injected with
//! [`ExpectationBuilder::return_err`].

use crate::error::TransportError;
use crate::transport::{ApiRequest, Method, RawResponse, Transport};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;

struct Expectation {
    method: Method,
    path: String,
    response: Result<RawResponse, TransportError>,
}

/// A scripted transport that records every request it receives.
#[derive(Default)]
pub struct MockTransport {
    expectations: Mutex<VecDeque<Expectation>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    /// Creates a mock with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects a request with the given method and path, in queue order.
    pub fn expect(&self, method: Method, path: impl Into<String>) -> ExpectationBuilder<'_> {
        ExpectationBuilder {
            transport: self,
            method,
            path: path.into(),
        }
    }

    pub fn expect_get(&self, path: impl Into<String>) -> ExpectationBuilder<'_> {
        self.expect(Method::Get, path)
    }

    pub fn expect_post(&self, path: impl Into<String>) -> ExpectationBuilder<'_> {
        self.expect(Method::Post, path)
    }

    pub fn expect_patch(&self, path: impl Into<String>) -> ExpectationBuilder<'_> {
        self.expect(Method::Patch, path)
    }

    pub fn expect_delete(&self, path: impl Into<String>) -> ExpectationBuilder<'_> {
        self.expect(Method::Delete, path)
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<ApiRequest> {
        self.requests.lock().last().cloned()
    }

    /// Body of the most recent request that carried one.
    pub fn last_body(&self) -> Option<Value> {
        self.requests
            .lock()
            .iter()
            .rev()
            .find_map(|request| request.body.clone())
    }

    /// Panics unless every expectation was consumed.
    pub fn verify(&self) {
        let remaining = self.expectations.lock();
        if !remaining.is_empty() {
            let pending: Vec<String> = remaining
                .iter()
                .map(|e| format!("{} {}", e.method, e.path))
                .collect();
            panic!(
                "Not all expectations were met. {} remaining: {}",
                remaining.len(),
                pending.join(", ")
            );
        }
    }

    fn push(&self, expectation: Expectation) {
        self.expectations.lock().push_back(expectation);
    }
}

/// Builder completing an expectation with its answer.
pub struct ExpectationBuilder<'a> {
    transport: &'a MockTransport,
    method: Method,
    path: String,
}

impl ExpectationBuilder<'_> {
    /// Answers with `status` and a JSON body.
    pub fn return_ok(self, status: u16, body: Value) {
        self.finish(Ok(RawResponse::new(status, body)));
    }

    /// Answers with `status` and no body.
    pub fn return_empty(self, status: u16) {
        self.finish(Ok(RawResponse::empty(status)));
    }

    /// Fails at the transport level.
    pub fn return_err(self, error: TransportError) {
        self.finish(Err(error));
    }

    fn finish(self, response: Result<RawResponse, TransportError>) {
        self.transport.push(Expectation {
            method: self.method,
            path: self.path,
            response,
        });
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        let expectation = self.expectations.lock().pop_front();
        let (method, path) = (request.method, request.path.clone());
        self.requests.lock().push(request);

        match expectation {
            Some(expected) if expected.method == method && expected.path == path => {
                expected.response
            }
            Some(expected) => panic!(
                "Unexpected request {method} {path}; expected {} {}",
                expected.method, expected.path
            ),
            None => panic!("Unexpected request {method} {path}; no expectations left"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RequestOptions;
    use serde_json::json;

    fn request(method: Method, path: &str) -> ApiRequest {
        ApiRequest {
            method,
            path: path.to_owned(),
            url: format!("http://localhost/{path}"),
            body: None,
            options: RequestOptions::default(),
        }
    }

    #[tokio::test]
    async fn test_answers_in_queue_order() {
        let mock = MockTransport::new();
        mock.expect_get("a").return_ok(200, json!({"meta": 1}));
        mock.expect_delete("a").return_empty(204);

        let first = mock.request(request(Method::Get, "a")).await.unwrap();
        assert_eq!(first.body, Some(json!({"meta": 1})));
        let second = mock.request(request(Method::Delete, "a")).await.unwrap();
        assert_eq!(second.status, 204);

        assert_eq!(mock.requests().len(), 2);
        mock.verify();
    }

    #[tokio::test]
    #[should_panic(expected = "Unexpected request POST a")]
    async fn test_mismatch_panics() {
        let mock = MockTransport::new();
        mock.expect_get("a").return_empty(200);
        let _ = mock.request(request(Method::Post, "a")).await;
    }

    #[test]
    #[should_panic(expected = "Not all expectations were met")]
    fn test_verify_reports_leftovers() {
        let mock = MockTransport::new();
        mock.expect_patch("a/1").return_empty(200);
        mock.verify();
    }
}
