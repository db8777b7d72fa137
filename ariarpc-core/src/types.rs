//! JSON-RPC 2.0 envelopes as spoken by aria2
//!
//! aria2 only understands positional parameters, so every request carries an
//! ordered `params` array. Replies echo the request id verbatim; pushes from
//! the daemon (download started, completed, ...) arrive as notifications
//! without an id.
//!
//! # Correlation Keys
//!
//! Replies are matched to requests through [`Id::correlation_key`]. An absent,
//! `null` or empty-string id yields no key, which is what marks a frame as a
//! notification rather than a reply.
//!
//! # Examples
//!
//! ```rust
//! use ariarpc_core::{Id, JsonRpcRequest};
//! use serde_json::json;
//!
//! let req = JsonRpcRequest::new("aria2.tellStatus", vec![json!("2089b05ecca3d829")], Id::Number(7));
//! let wire = serde_json::to_value(&req).unwrap();
//! assert_eq!(wire["params"], json!(["2089b05ecca3d829"]));
//! assert_eq!(wire["id"], json!(7));
//! ```

use crate::error::JsonRpcErrorData;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Protocol version tag carried by every envelope
pub const JSONRPC_VERSION: &str = "2.0";

/// Request identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// String identifier
    String(String),
    /// Numeric identifier
    Number(i64),
    /// Explicit `null`
    Null,
}

impl Id {
    /// Key used by the pending-call table
    ///
    /// Returns `None` for ids that cannot correlate anything: `null` and the
    /// empty string.
    pub fn correlation_key(&self) -> Option<String> {
        match self {
            Id::Number(n) => Some(n.to_string()),
            Id::String(s) if !s.is_empty() => Some(s.clone()),
            Id::String(_) | Id::Null => None,
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::String(s) => write!(f, "\"{}\"", s),
            Id::Number(n) => write!(f, "{}", n),
            Id::Null => write!(f, "null"),
        }
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n)
    }
}

impl From<u64> for Id {
    /// Values above `i64::MAX` are carried as decimal strings.
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(n) => Id::Number(n),
            Err(_) => Id::String(n.to_string()),
        }
    }
}

/// Outgoing call
///
/// Immutable once handed to a transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Always "2.0"
    pub jsonrpc: String,
    /// Correlation id
    pub id: Id,
    /// Dot-namespaced method name, e.g. `aria2.addUri`
    pub method: String,
    /// Positional parameters; the secret token, if any, is already last
    #[serde(default)]
    pub params: Vec<serde_json::Value>,
}

impl JsonRpcRequest {
    /// Build a request envelope
    pub fn new(method: impl Into<String>, params: Vec<serde_json::Value>, id: Id) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

/// Server push without an id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// Always "2.0"
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    /// Event name, e.g. `aria2.onDownloadComplete`
    pub method: String,
    /// Event payload; aria2 sends `[{"gid": "..."}]`
    #[serde(default)]
    pub params: serde_json::Value,
}

impl JsonRpcNotification {
    /// Build a notification envelope
    pub fn new(method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

/// Reply to a call
///
/// Exactly one of `result` and `error` is expected. A reply with neither is
/// treated as a `null` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Always "2.0"
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    /// Result on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Error object on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorData>,
    /// Echo of the request id
    #[serde(default = "null_id")]
    pub id: Id,
}

fn default_version() -> String {
    JSONRPC_VERSION.to_string()
}

fn null_id() -> Id {
    Id::Null
}

impl JsonRpcResponse {
    /// Successful reply
    pub fn success(result: serde_json::Value, id: Id) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Error reply
    pub fn error(error: JsonRpcErrorData, id: Id) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }

    /// True when an error object is present
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Collapse the envelope into the call outcome
    pub fn into_result(self) -> crate::Result<serde_json::Value> {
        match self.error {
            Some(err) => Err(err.into()),
            None => Ok(self.result.unwrap_or(serde_json::Value::Null)),
        }
    }
}

/// Classified inbound frame
///
/// Produced by [`crate::codec::decode_inbound`].
#[derive(Debug, Clone)]
pub enum Inbound {
    /// Carries a usable id and belongs to a pending call
    Reply(JsonRpcResponse),
    /// No id; routed to the notification dispatcher
    Notification(JsonRpcNotification),
    /// Carries a usable id but the body is not a valid reply
    MalformedReply {
        /// Id found in the frame
        id: Id,
        /// Why decoding failed
        reason: String,
    },
    /// Array frame, each element classified on its own
    Batch(Vec<Inbound>),
    /// Well-formed JSON that is neither of the above
    Unknown(serde_json::Value),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_correlation_key() {
        assert_eq!(Id::Number(42).correlation_key().as_deref(), Some("42"));
        assert_eq!(Id::from("abc").correlation_key().as_deref(), Some("abc"));
        assert_eq!(Id::from("").correlation_key(), None);
        assert_eq!(Id::Null.correlation_key(), None);
    }

    #[test]
    fn test_id_from_large_u64() {
        assert_eq!(Id::from(7u64), Id::Number(7));
        assert_eq!(Id::from(u64::MAX), Id::String(u64::MAX.to_string()));
    }

    #[test]
    fn test_id_display() {
        assert_eq!(Id::Number(3).to_string(), "3");
        assert_eq!(Id::from("x").to_string(), "\"x\"");
        assert_eq!(Id::Null.to_string(), "null");
    }

    #[test]
    fn test_request_wire_shape() {
        let req = JsonRpcRequest::new("aria2.getVersion", vec![], Id::Number(1));
        let wire = serde_json::to_value(&req).unwrap();
        assert_eq!(
            wire,
            json!({"jsonrpc": "2.0", "id": 1, "method": "aria2.getVersion", "params": []})
        );
    }

    #[test]
    fn test_response_into_result() {
        let ok = JsonRpcResponse::success(json!("gid"), Id::Number(1));
        assert_eq!(ok.into_result().unwrap(), json!("gid"));

        let err = JsonRpcResponse::error(JsonRpcErrorData::new(1, "nope"), Id::Number(1));
        assert!(err.is_error());
        match err.into_result() {
            Err(crate::Error::JsonRpc(data)) => assert_eq!(data.code, 1),
            other => panic!("expected protocol error, got {:?}", other),
        }
    }

    #[test]
    fn test_response_without_id_defaults_to_null() {
        let resp: JsonRpcResponse = serde_json::from_str(r#"{"result": 1}"#).unwrap();
        assert_eq!(resp.id, Id::Null);
        assert_eq!(resp.jsonrpc, "2.0");
    }

    #[test]
    fn test_notification_params_default() {
        let n: JsonRpcNotification =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"aria2.onDownloadStart"}"#).unwrap();
        assert_eq!(n.params, serde_json::Value::Null);
    }
}
