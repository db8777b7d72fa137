//! Error types for ariarpc
//!
//! Two error types live here:
//!
//! - **Error**: everything a call can fail with, as seen by the caller
//! - **JsonRpcErrorData**: the wire-format `error` object carried by a reply
//!
//! # Error Taxonomy
//!
//! Callers of `invoke` need to tell apart failures that happened on the way
//! to the daemon from failures the daemon itself reported:
//!
//! - **Transport**: `Transport`, `HttpStatus`, `ConnectionClosed`
//! - **Protocol**: `JsonRpc` (the daemon answered with an error object)
//! - **Timeout**: no reply before the per-call deadline
//! - **Backpressure**: the outbound queue was full at submission time
//! - **Decode**: the reply did not have the expected shape
//!
//! Nothing in this crate retries. [`Error::is_retryable`] is a hint for the
//! layer above.
//!
//! # Examples
//!
//! ```rust
//! use ariarpc_core::{Error, JsonRpcErrorData};
//!
//! let err: Error = JsonRpcErrorData::new(1, "Unauthorized").into();
//! assert!(err.is_protocol());
//! assert!(!err.is_retryable());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for ariarpc operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error returned by every ariarpc operation
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Well-formed reply carrying an error object
    ///
    /// The daemon understood the request and refused it. Code and message are
    /// preserved as sent.
    #[error("JSON-RPC error: {0}")]
    JsonRpc(#[from] JsonRpcErrorData),

    /// Connection refused, reset, or a framing error below JSON-RPC
    #[error("Transport error: {0}")]
    Transport(String),

    /// HTTP endpoint answered with a non-success status
    #[error("HTTP status {status}: {body}")]
    HttpStatus {
        /// Numeric status code
        status: u16,
        /// Response body, verbatim
        body: String,
    },

    /// No reply arrived before the per-call deadline
    #[error("Request timeout")]
    Timeout,

    /// Outbound queue was full when the call was submitted
    #[error("Outbound queue full (capacity {capacity})")]
    Backpressure {
        /// Configured queue capacity
        capacity: usize,
    },

    /// Reply or notification did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Failed to encode an outgoing request
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The caller was closed, or its connection failed for good
    ///
    /// Every call pending at that moment is released with this error.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Endpoint URL could not be parsed or has an unsupported scheme
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Call rejected locally before anything was sent
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(String),

    /// Anything that should not happen, e.g. observability setup failing
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the failure is transient from the caller's point of view
    ///
    /// Timeouts, backpressure and transport failures may succeed on a later
    /// attempt. Protocol and decode errors will not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Timeout | Error::Backpressure { .. } | Error::Transport(_) | Error::Io(_)
        )
    }

    /// Whether the daemon itself reported the error
    pub fn is_protocol(&self) -> bool {
        matches!(self, Error::JsonRpc(_))
    }

    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Error::JsonRpc(_) => "protocol",
            Error::Transport(_) | Error::HttpStatus { .. } | Error::Io(_) => "transport",
            Error::Timeout => "timeout",
            Error::Backpressure { .. } => "backpressure",
            Error::Decode(_) => "decode",
            Error::Serialization(_) => "serialization",
            Error::ConnectionClosed => "connection_closed",
            Error::InvalidUrl(_) | Error::InvalidParams(_) => "invalid_input",
            Error::Internal(_) => "internal",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

/// JSON-RPC 2.0 error object
///
/// aria2 reports its own failures with code `1` and a human-readable
/// message, e.g. `{"code":1,"message":"Unauthorized"}`. Standard JSON-RPC
/// codes (`-32700` .. `-32603`) show up for malformed requests.
///
/// `system.multicall` reuses the same shape for per-entry faults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("[{code}] {message}")]
pub struct JsonRpcErrorData {
    /// Error code
    pub code: i32,
    /// Short description
    pub message: String,
    /// Optional extra payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcErrorData {
    /// Create an error object without extra data
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_data_display() {
        let err = JsonRpcErrorData::new(1, "Unauthorized");
        assert_eq!(err.to_string(), "[1] Unauthorized");
    }

    #[test]
    fn test_error_data_roundtrip_skips_empty_data() {
        let err = JsonRpcErrorData::new(1, "GID not found");
        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("data"));

        let back: JsonRpcErrorData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::Timeout.is_retryable());
        assert!(Error::Backpressure { capacity: 16 }.is_retryable());
        assert!(Error::Transport("reset".into()).is_retryable());
        assert!(!Error::Decode("bad".into()).is_retryable());
        assert!(!Error::ConnectionClosed.is_retryable());
        assert!(!Error::JsonRpc(JsonRpcErrorData::new(1, "x")).is_retryable());
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(Error::Timeout.kind(), "timeout");
        assert_eq!(
            Error::HttpStatus {
                status: 500,
                body: String::new()
            }
            .kind(),
            "transport"
        );
        assert_eq!(Error::Backpressure { capacity: 1 }.kind(), "backpressure");
    }

    #[test]
    fn test_from_serde_error_is_decode() {
        let err: Error = serde_json::from_str::<u32>("\"x\"").unwrap_err().into();
        match err {
            Error::Decode(msg) => assert!(!msg.is_empty()),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_http_status_display() {
        let err = Error::HttpStatus {
            status: 400,
            body: "bad request".into(),
        };
        assert_eq!(err.to_string(), "HTTP status 400: bad request");
    }
}
