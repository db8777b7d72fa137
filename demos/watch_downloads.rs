//! Watch download events over the WebSocket transport
//!
//! Adds the URIs given on the command line, then prints every notification
//! aria2 pushes until Ctrl-C.
//!
//! Run with: ARIA2_RPC_SECRET=... cargo run --example watch_downloads -- https://example.org/file.iso

use ariarpc::client::{ClientBuilder, DownloadEvent, Notifier};
use std::sync::Arc;

struct Printer;

impl Printer {
    fn print(&self, what: &str, events: &[DownloadEvent]) {
        for event in events {
            println!("{:<12} {}", what, event.gid);
        }
    }
}

impl Notifier for Printer {
    fn on_download_start(&self, events: &[DownloadEvent]) {
        self.print("started", events);
    }

    fn on_download_pause(&self, events: &[DownloadEvent]) {
        self.print("paused", events);
    }

    fn on_download_stop(&self, events: &[DownloadEvent]) {
        self.print("stopped", events);
    }

    fn on_download_complete(&self, events: &[DownloadEvent]) {
        self.print("complete", events);
    }

    fn on_download_error(&self, events: &[DownloadEvent]) {
        self.print("error", events);
    }

    fn on_bt_download_complete(&self, events: &[DownloadEvent]) {
        self.print("seeding", events);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let client = ClientBuilder::from_env()
        .websocket()
        .notifier(Arc::new(Printer))
        .build()
        .await?;

    let version = client.get_version().await?;
    println!("connected to aria2 {}", version.version);

    for uri in std::env::args().skip(1) {
        let gid = client.add_uri(&[uri.as_str()], None, None).await?;
        tracing::info!(%gid, %uri, "queued");
    }

    tokio::signal::ctrl_c().await?;
    client.close().await?;
    Ok(())
}
