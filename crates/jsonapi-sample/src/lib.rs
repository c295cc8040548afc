//! # Blog Sample
//!
//! A small blog client built on `jsonapi-orm`, with a server to talk to.
//!
//! - **[model]**: typed wrappers ([`Article`](model::Article),
//!   [`Comment`](model::Comment), [`Person`](model::Person)) implementing
//!   [`ApiModel`](jsonapi_orm::ApiModel).
//! - **[server]**: an in-memory JSON:API server running as a Tokio task, reached
//!   through a [`Transport`](jsonapi_orm::Transport) handle.
//! - **[lifecycle]**: the [`Blog`](lifecycle::Blog) orchestrator and logging setup.
//!
//! The binary in `main.rs` walks through a full session. The tests use
//! [`MockTransport`](jsonapi_orm::mock::MockTransport) where the exact requests
//! matter and the in-memory server where the round trip does.

pub mod lifecycle;
pub mod model;
pub mod server;
