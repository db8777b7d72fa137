//! Encoding outgoing calls and classifying inbound frames
//!
//! A socket connection to aria2 carries two kinds of traffic in the same
//! direction: replies to our calls and unsolicited notifications. Both are
//! JSON objects and the only reliable difference is the `id` member, so
//! inbound frames are first parsed into a generic value and then classified
//! by [`classify`]:
//!
//! - usable id (number or non-empty string) -> [`Inbound::Reply`]
//! - no usable id, string `method` -> [`Inbound::Notification`]
//! - array -> [`Inbound::Batch`], each element classified on its own
//! - anything else -> [`Inbound::Unknown`]
//!
//! A frame with a usable id whose body does not decode as a reply becomes
//! [`Inbound::MalformedReply`] so the waiting caller can be failed with a
//! decode error instead of waiting for its deadline.
//!
//! # Examples
//!
//! ```rust
//! use ariarpc_core::{codec, Inbound};
//!
//! let frame = r#"{"jsonrpc":"2.0","method":"aria2.onDownloadStart","params":[{"gid":"1"}]}"#;
//! assert!(matches!(codec::decode_inbound(frame).unwrap(), Inbound::Notification(_)));
//!
//! let frame = r#"{"jsonrpc":"2.0","id":5,"result":"OK"}"#;
//! assert!(matches!(codec::decode_inbound(frame).unwrap(), Inbound::Reply(_)));
//! ```

use crate::error::{Error, Result};
use crate::types::{Id, Inbound, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Encode any serializable envelope
pub fn encode<T: Serialize>(msg: &T) -> Result<String> {
    serde_json::to_string(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Encode a request envelope
pub fn encode_request(req: &JsonRpcRequest) -> Result<String> {
    encode(req)
}

/// Decode a string into a concrete type, mapping failures to [`Error::Decode`]
pub fn decode_as<'de, T: Deserialize<'de>>(data: &'de str) -> Result<T> {
    serde_json::from_str(data).map_err(|e| Error::Decode(e.to_string()))
}

/// Decode a single reply envelope, as returned by the HTTP endpoint
pub fn decode_response(data: &str) -> Result<JsonRpcResponse> {
    decode_as(data)
}

/// Parse and classify one inbound text frame
///
/// Only invalid JSON is an error here; well-formed frames of unexpected shape
/// come back as [`Inbound::Unknown`].
pub fn decode_inbound(data: &str) -> Result<Inbound> {
    let value: Value = serde_json::from_str(data).map_err(|e| Error::Decode(e.to_string()))?;
    Ok(classify(value))
}

/// Classify an already-parsed frame
pub fn classify(value: Value) -> Inbound {
    match value {
        Value::Array(items) => Inbound::Batch(items.into_iter().map(classify).collect()),
        Value::Object(obj) => {
            let id = obj
                .get("id")
                .cloned()
                .and_then(|v| serde_json::from_value::<Id>(v).ok())
                .unwrap_or(Id::Null);
            let has_method = obj.get("method").map(Value::is_string).unwrap_or(false);
            let value = Value::Object(obj);

            if id.correlation_key().is_some() {
                return match serde_json::from_value::<JsonRpcResponse>(value) {
                    Ok(resp) => Inbound::Reply(resp),
                    Err(e) => Inbound::MalformedReply {
                        id,
                        reason: e.to_string(),
                    },
                };
            }

            if !has_method {
                return Inbound::Unknown(value);
            }
            match serde_json::from_value::<JsonRpcNotification>(value.clone()) {
                Ok(notif) => Inbound::Notification(notif),
                Err(_) => Inbound::Unknown(value),
            }
        }
        other => Inbound::Unknown(other),
    }
}
