//! Core JSON-RPC 2.0 types and codec for ariarpc
//!
//! This crate holds the pieces of the aria2 RPC client that do not depend on a
//! transport:
//!
//! - **Types**: request, reply and notification envelopes
//! - **Codec**: encoding calls and classifying inbound frames
//! - **Methods**: aria2 method names and secret-token handling
//! - **Error handling**: the error taxonomy shared by both transports
//! - **Observability**: tracing subscriber and OpenTelemetry setup
//!
//! # Example
//!
//! ```rust
//! use ariarpc_core::{codec, methods, Id, JsonRpcRequest};
//!
//! let params = methods::with_token(methods::GET_VERSION, vec![], Some("secret"));
//! let request = JsonRpcRequest::new(methods::GET_VERSION, params, Id::Number(1));
//! let json = codec::encode_request(&request).unwrap();
//! assert!(json.contains("token:secret"));
//! ```

pub mod codec;
pub mod error;
pub mod methods;
pub mod observability;
pub mod types;

pub use error::{Error, JsonRpcErrorData, Result};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use types::{Id, Inbound, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
