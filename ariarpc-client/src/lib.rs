//! Client transport for the aria2 JSON-RPC interface
//!
//! Two interchangeable transports sit behind the [`Caller`] trait:
//!
//! - **HTTP**: one POST per call, serialized, no notifications
//! - **WebSocket**: one persistent connection multiplexing concurrent calls,
//!   with a bounded send queue, per-call deadlines and download notifications
//!
//! [`Client`] layers secret-token injection and typed wrappers for the aria2
//! method catalogue on top of either one.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ariarpc_client::{ClientBuilder, DownloadEvent, Notifier};
//! use std::sync::Arc;
//!
//! struct Log;
//!
//! impl Notifier for Log {
//!     fn on_download_complete(&self, events: &[DownloadEvent]) {
//!         for event in events {
//!             println!("done: {}", event.gid);
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientBuilder::new("ws://localhost:6800/jsonrpc")
//!         .secret("s3cret")
//!         .notifier(Arc::new(Log))
//!         .build()
//!         .await?;
//!
//!     let gid = client.add_uri(&["https://example.org/file.iso"], None, None).await?;
//!     let status = client.tell_status(&gid, &["status", "completedLength"]).await?;
//!     println!("{}: {}", gid, status.status);
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

mod caller;
mod client;
mod client_builder;
mod http;
mod id;
mod metrics;
mod multicall;
mod notification;
mod pending;
mod socket;
mod types;

pub use caller::{Caller, CallerExt};
pub use client::Client;
pub use client_builder::{
    derive_ws_url, ClientBuilder, DEFAULT_RPC_URI, ENV_RPC_SECRET, ENV_RPC_URI,
};
pub use http::HttpCaller;
pub use id::IdGenerator;
pub use metrics::ClientMetrics;
pub use multicall::{Multicall, MulticallResponse};
pub use notification::{
    Dispatch, DownloadEvent, NotificationDispatcher, NotificationKind, Notifier,
};
pub use pending::{Admission, PendingTable, ReplySlot};
pub use socket::{SocketCaller, SocketConfig, DEFAULT_CALL_TIMEOUT, DEFAULT_QUEUE_CAPACITY};
pub use types::{
    FileInfo, GlobalStat, Options, PeerInfo, PositionHow, ServerConnection, ServerInfo,
    SessionInfo, StatusInfo, UriInfo, VersionInfo,
};
