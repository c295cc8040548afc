//! # Blog Lifecycle
//!
//! Wiring for the sample application.
//!
//! - [`Blog`] registers the typed models on an [`OrmApi`](jsonapi_orm::OrmApi)
//!   and, with [`Blog::start`], runs a [`MemoryServer`](crate::server::MemoryServer)
//!   behind it in its own task.
//! - [`setup_tracing`] installs the log subscriber used by `main`.
//!
//! Shutdown mirrors startup: dropping the ORM drops the last
//! [`ServerHandle`](crate::server::ServerHandle), the server's channel closes and
//! its task returns, which [`Blog::shutdown`] awaits.
//!
//! Models hold their [`ModelType`](jsonapi_orm::ModelType), not the ORM itself,
//! so a model kept past shutdown fails with
//! [`OrmError::Detached`](jsonapi_orm::OrmError::Detached) on its next request
//! instead of keeping the server alive.

mod blog;
pub mod tracing;

pub use blog::Blog;
pub use tracing::setup_tracing;
