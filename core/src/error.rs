//! Error types for the remote mapping layer.
//!
//! # Design
//! Every failure surfaces synchronously to the caller of the operation that
//! triggered it. Nothing is retried here: transport failures are wrapped in
//! `RemoteError::Transport` without altering the inner `TransportError`, so
//! callers can still inspect the status the transport reported.

use thiserror::Error;

use crate::http::HttpMethod;
use crate::transport::TransportError;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, RemoteError>;

/// Errors returned by schema lookups, record access and query execution.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The record type was never registered.
    #[error("unknown record type `{name}`")]
    UnknownType { name: String },

    /// The field is not part of the record type's descriptor map.
    #[error("`{record_type}` has no field named `{field}`")]
    UnknownField { record_type: String, field: String },

    /// A query was built or executed before `from` bound a record type.
    #[error("query has no target record type")]
    UnboundQuery,

    /// A value could not be coerced to the field's declared logical type.
    #[error("field `{field}` expects {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    #[error("`{record_type}` does not support {operation}")]
    UnsupportedOperation {
        record_type: String,
        operation: &'static str,
    },

    #[error("`{record_type}` does not support the {method} method")]
    UnsupportedMethod {
        record_type: String,
        method: HttpMethod,
    },

    /// Required fields were left unset.
    #[error("`{record_type}` is missing required fields: {}", fields.join(", "))]
    MissingRequired {
        record_type: String,
        fields: Vec<String>,
    },

    #[error("configuration error: {0}")]
    Config(String),

    /// Propagated unchanged from the transport collaborator.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl RemoteError {
    pub(crate) fn mismatch(field: &str, expected: impl ToString, found: impl ToString) -> Self {
        RemoteError::TypeMismatch {
            field: field.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}
