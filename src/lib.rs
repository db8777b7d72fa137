//! ariarpc - aria2 JSON-RPC client
//!
//! Convenience crate re-exporting the ariarpc sub-crates:
//!
//! - **ariarpc-core**: envelopes, codec, method names, errors, observability
//! - **ariarpc-client**: HTTP and WebSocket transports plus the typed client
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ariarpc::ClientBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClientBuilder::from_env().build().await?;
//!
//!     let stat = client.get_global_stat().await?;
//!     println!("{} active, {} B/s", stat.num_active, stat.download_speed);
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

pub use ariarpc_client as client;
pub use ariarpc_core as core;

pub use ariarpc_client::{Client, ClientBuilder};
pub use ariarpc_core::{Error, Result};
