//! # Logging Setup
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter filtered
//! by `RUST_LOG`.
//!
//! ```bash
//! # Lifecycle calls and server activity
//! RUST_LOG=info cargo run -p jsonapi-sample
//!
//! # Every request with its path and method
//! RUST_LOG=debug cargo run -p jsonapi-sample
//!
//! # Schema fallbacks inside the document decoder
//! RUST_LOG=jsonapi_orm=trace cargo run -p jsonapi-sample
//! ```
//!
//! Model operations open spans named after the call (`create`, `update`,
//! `refresh`, `delete`) with the type tag and id as fields, and every request
//! inside them runs under a `request` span carrying the endpoint path:
//!
//! ```text
//! DEBUG create{type_tag="articles"}:request{method=Post path="articles"}: Sending request
//! INFO Created resource kind="articles" id="2"
//! DEBUG create{type_tag="articles"}:request{method=Post path="articles"}: Received response status=201
//! INFO create{type_tag="articles"}: Created id=Some("2")
//! ```

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Call once, at the start of `main`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
