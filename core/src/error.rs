//! Error types for the synthetics client and the reconciler.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers distinguish "the
//! monitor does not exist" from "the server returned an unexpected status."
//! Every other non-2xx response lands in `RemoteError` with the raw status and
//! body. `ProtocolError` is kept apart from `RemoteError`: the server accepted
//! the call but its answer could not be understood.

use crate::http::TransportError;

/// Errors returned by `SyntheticsClient` and the request builders/parsers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed caller input, detected before any request is sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The server returned 404 for a single-monitor fetch.
    #[error("monitor not found")]
    NotFound,

    /// The server returned a non-2xx status.
    #[error("remote error: HTTP {status}: {body}")]
    RemoteError { status: u16, body: String },

    /// Success status, but the body or headers could not be interpreted.
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// A timestamp in a monitor representation did not match the wire format.
    #[error("could not parse timestamp {value:?}: {source}")]
    ParseError {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The round-trip itself failed.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound)
    }

    /// HTTP status carried by the error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound => Some(404),
            ApiError::RemoteError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors returned by `Reconciler` operations.
///
/// Each variant carries the operation and monitor id so the caller can report
/// or retry without extra bookkeeping.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// The desired spec cannot be sent as-is.
    #[error("invalid monitor spec: {0}")]
    InvalidSpec(String),

    /// A client call failed. `id` is empty when no monitor exists yet.
    #[error("could not {operation} monitor {id:?}: {source}")]
    Api {
        operation: &'static str,
        id: String,
        #[source]
        source: ApiError,
    },

    /// The monitor exists but its script could not be written. Retrying only
    /// the script step, or deleting `id`, are both valid recoveries.
    #[error("monitor {id:?} was saved but its script could not be updated: {source}")]
    ScriptProvisioning {
        id: String,
        #[source]
        source: ApiError,
    },
}

impl ReconcileError {
    pub(crate) fn api(operation: &'static str, id: &str, source: ApiError) -> Self {
        ReconcileError::Api {
            operation,
            id: id.to_string(),
            source,
        }
    }

    /// The monitor id the failed operation targeted, if one was known.
    pub fn monitor_id(&self) -> Option<&str> {
        match self {
            ReconcileError::InvalidSpec(_) => None,
            ReconcileError::Api { id, .. } if id.is_empty() => None,
            ReconcileError::Api { id, .. } | ReconcileError::ScriptProvisioning { id, .. } => {
                Some(id)
            }
        }
    }

    /// The underlying client error, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            ReconcileError::InvalidSpec(_) => None,
            ReconcileError::Api { source, .. } | ReconcileError::ScriptProvisioning { source, .. } => {
                Some(source)
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.api_error().is_some_and(ApiError::is_not_found)
    }
}
