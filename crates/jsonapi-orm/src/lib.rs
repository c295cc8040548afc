//! # JSON:API ORM
//!
//! This crate is a client-side object mapper for [JSON:API](https://jsonapi.org)
//! servers. Declare your resource types once; the crate fetches, creates, updates
//! and deletes them over a pluggable transport and links every response into a
//! graph of shared model handles.
//!
//! ## Architecture Overview
//!
//! The crate is built in layers:
//!
//! 1. **Schema Engine** ([`value`], [`record`]) - symmetric JSON ↔ typed value conversion
//! 2. **Document Model** ([`document`]) - JSON:API records built on the schema engine
//! 3. **Transport** ([`transport`], [`client`]) - the HTTP boundary and endpoint handles
//! 4. **ORM** ([`registry`], [`repository`], [`model`], [`orm`]) - registered types, identity map, model lifecycle
//!
//! ## Core Abstractions
//!
//! ### [`OrmApi`] - The Entry Point
//!
//! ```rust
//! use jsonapi_orm::{ApiConfig, ModelDecl, OrmApi};
//! use jsonapi_orm::mock::MockTransport;
//! use std::sync::Arc;
//!
//! let transport = Arc::new(MockTransport::new());
//! let orm = OrmApi::new(transport, ApiConfig::new("http://localhost/api"));
//!
//! let articles = orm
//!     .register(
//!         ModelDecl::new("articles")
//!             .attribute("title", "title")
//!             .to_one("author", "author")
//!             .to_many("comments", "comments"),
//!     )
//!     .unwrap();
//! orm.register(ModelDecl::new("people").attribute("name", "name")).unwrap();
//!
//! let draft = articles.new_instance();
//! assert!(draft.id().is_none());
//! ```
//!
//! ### [`Model`] - Shared Resource Handles
//!
//! Models are handles: clones share state and compare by identity. A model
//! created from an id alone is a stub that loads itself on first field access.
//! See the [`model`] module for the lifecycle (`save`, `refresh`, `delete`).
//!
//! ### [`ApiModel`] - Typed Wrappers
//!
//! Domain types wrap a [`Model`] and implement [`ApiModel`] to get typed
//! constructors on [`OrmApi`] and the provided `save`/`refresh`/`delete`.
//!
//! ## Concurrency Model
//!
//! - All network-facing operations are `async`; the transport decides how requests run
//! - Model state sits behind a short-lived lock that is never held across an `.await`
//! - Handles are `Send + Sync` and may be shared between tasks
//!
//! ## Testing
//!
//! The [`mock`] module provides [`MockTransport`](mock::MockTransport), a scripted
//! in-memory transport for fast, deterministic tests of model logic.

pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod fields;
pub mod mock;
pub mod model;
pub mod orm;
pub mod record;
pub mod registry;
pub mod repository;
pub mod transport;
pub mod value;

#[doc(hidden)]
pub mod __private {
    pub use paste::paste;
    pub use serde_json::{Map, Value};
}

// Re-export core types for convenience
pub use client::{Api, ApiResponse, Endpoint};
pub use config::ApiConfig;
pub use document::{Cardinality, Document, Relationship, ResourceIdentifier, ResourceObject};
pub use error::{OrmError, Result, SchemaMismatch, TransportError};
pub use fields::{FieldDescriptor, ModelDecl};
pub use model::{Model, ModelType, RelationValue};
pub use orm::{ApiModel, OrmApi};
pub use registry::TypeRegistry;
pub use repository::{ObjectKey, Repository};
pub use transport::{ApiRequest, Method, RawResponse, Transport};
pub use value::{Alternative, Dictionary, JsonData, List, Nullable, Presence, Scalar};
