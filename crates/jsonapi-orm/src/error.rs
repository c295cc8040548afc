//! # Errors
//!
//! Every fallible operation in the crate returns [`OrmError`]. Decode-time shape
//! violations start out as the narrower [`SchemaMismatch`] so that the schema engine
//! can try alternatives before giving up, and transport failures arrive as
//! [`TransportError`] from whatever [`Transport`](crate::transport::Transport) the
//! caller plugged in.

use serde_json::Value;

/// A raw value did not have the shape a schema expected.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("Schema mismatch: expected {expected}, found {found}")]
pub struct SchemaMismatch {
    pub expected: &'static str,
    pub found: &'static str,
}

impl SchemaMismatch {
    pub fn new(expected: &'static str, found: &Value) -> Self {
        Self {
            expected,
            found: kind_name(found),
        }
    }
}

/// Short name of a JSON value's kind, used in error messages.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Failures reported by the transport collaborator.
///
/// The ORM never retries these; they surface to the caller unchanged.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum TransportError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Client error {status}: {content}")]
    Client { status: u16, content: Value },
    #[error("Server error {status}: {content}")]
    Server { status: u16, content: Value },
    #[error("Invalid response {status}: {content}")]
    InvalidResponse { status: u16, content: String },
}

impl TransportError {
    /// Status code carried by the error, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Connection(_) => None,
            TransportError::Client { status, .. }
            | TransportError::Server { status, .. }
            | TransportError::InvalidResponse { status, .. } => Some(*status),
        }
    }
}

/// Errors raised by the ORM layer.
#[derive(Debug, thiserror::Error)]
pub enum OrmError {
    #[error(transparent)]
    Schema(#[from] SchemaMismatch),
    #[error("Type already registered: {0}")]
    DuplicateType(String),
    #[error("Unknown type: {0}")]
    UnknownType(String),
    #[error("Declaration for {expected} uses type tag {declared}")]
    TypeTagMismatch { expected: String, declared: String },
    #[error("Invalid identifier: type={kind}, id={id}")]
    InvalidIdentifier { kind: Value, id: Value },
    #[error("Model {model} has no field {field}")]
    UnknownField { model: String, field: String },
    #[error("Field {field} of {model} is not {expected}")]
    FieldKind {
        model: String,
        field: String,
        expected: &'static str,
    },
    #[error("Relationship {field} does not hold {expected} data")]
    Cardinality {
        field: String,
        expected: &'static str,
    },
    #[error("{0} has no id")]
    MissingIdentifier(String),
    #[error("Model of type {0} outlived its API")]
    Detached(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    Config(String),
}

impl OrmError {
    /// True for 4xx answers from the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, OrmError::Transport(TransportError::Client { .. }))
    }
}

pub type Result<T> = std::result::Result<T, OrmError>;
