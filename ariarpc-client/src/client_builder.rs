//! Builder for [`Client`]
//!
//! The transport is picked from the URI scheme: `http`/`https` gives a
//! stateless [`HttpCaller`], `ws`/`wss` a persistent [`SocketCaller`] with
//! notifications.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ariarpc_client::ClientBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> ariarpc_core::Result<()> {
//! // HTTP, configured from ARIA2_RPC_URI / ARIA2_RPC_SECRET
//! let client = ClientBuilder::from_env().build().await?;
//!
//! // WebSocket derived from an http URI, with metrics
//! let client2 = ClientBuilder::new("http://localhost:6800/jsonrpc")
//!     .websocket()
//!     .timeout(Duration::from_secs(3))
//!     .with_metrics()
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::client::Client;
use crate::http::HttpCaller;
use crate::id::IdGenerator;
use crate::metrics::ClientMetrics;
use crate::notification::Notifier;
use crate::socket::{SocketCaller, SocketConfig, DEFAULT_CALL_TIMEOUT, DEFAULT_QUEUE_CAPACITY};
use crate::Caller;
use ariarpc_core::{Error, ObservabilityConfig, Result};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Endpoint used when `ARIA2_RPC_URI` is unset
pub const DEFAULT_RPC_URI: &str = "http://localhost:6800/jsonrpc";

pub const ENV_RPC_URI: &str = "ARIA2_RPC_URI";
pub const ENV_RPC_SECRET: &str = "ARIA2_RPC_SECRET";

/// Builder for configuring and creating a [`Client`]
pub struct ClientBuilder {
    uri: String,
    secret: Option<String>,
    timeout: Duration,
    connect_timeout: Duration,
    queue_capacity: usize,
    notifier: Option<Arc<dyn Notifier>>,
    websocket: bool,
    metrics: bool,
    observability_config: Option<ObservabilityConfig>,
    service_name: Option<String>,
}

impl ClientBuilder {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            secret: None,
            timeout: DEFAULT_CALL_TIMEOUT,
            connect_timeout: SocketConfig::default().connect_timeout,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            notifier: None,
            websocket: false,
            metrics: false,
            observability_config: None,
            service_name: None,
        }
    }

    /// Builder seeded from `ARIA2_RPC_URI` and `ARIA2_RPC_SECRET`
    pub fn from_env() -> Self {
        let uri = std::env::var(ENV_RPC_URI).unwrap_or_else(|_| DEFAULT_RPC_URI.to_string());
        let builder = Self::new(uri);
        match std::env::var(ENV_RPC_SECRET) {
            Ok(secret) if !secret.is_empty() => builder.secret(secret),
            _ => builder,
        }
    }

    /// Secret sent as `token:<secret>` on every authenticated call
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Per-call deadline
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// WebSocket handshake deadline
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Outbound queue size of the WebSocket transport
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Receiver for download notifications; ignored over HTTP
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Use the WebSocket endpoint even when given an http URI
    pub fn websocket(mut self) -> Self {
        self.websocket = true;
        self
    }

    /// Record OpenTelemetry metrics for calls
    pub fn with_metrics(mut self) -> Self {
        self.metrics = true;
        self
    }

    /// Initialise tracing and OpenTelemetry export during `build()`
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    /// Service name for telemetry
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Resolve the transport and construct the client
    ///
    /// Connects immediately for WebSocket URIs.
    pub async fn build(self) -> Result<Client> {
        let mut url = Url::parse(&self.uri)
            .map_err(|e| Error::InvalidUrl(format!("{}: {}", self.uri, e)))?;
        if self.websocket {
            url = derive_ws_url(&url)?;
        }

        let mut service_name = self
            .service_name
            .clone()
            .unwrap_or_else(|| ObservabilityConfig::default().service_name);

        if let Some(mut config) = self.observability_config {
            if let Some(name) = &self.service_name {
                config.service_name = name.clone();
            }
            service_name = config.service_name.clone();
            ariarpc_core::init_observability(config).map_err(|e| {
                Error::Internal(format!("failed to initialize observability: {}", e))
            })?;
        }

        let metrics = self
            .metrics
            .then(|| Arc::new(ClientMetrics::new(service_name)));
        let ids = Arc::new(IdGenerator::new());

        let caller: Arc<dyn Caller> = match url.scheme() {
            "http" | "https" => Arc::new(HttpCaller::with_parts(url, self.timeout, ids, metrics)?),
            "ws" | "wss" => {
                let config = SocketConfig {
                    timeout: self.timeout,
                    connect_timeout: self.connect_timeout,
                    queue_capacity: self.queue_capacity,
                    notifier: self.notifier,
                    ..SocketConfig::default()
                };
                Arc::new(SocketCaller::connect_with(&url, config, ids, metrics).await?)
            }
            other => {
                return Err(Error::InvalidUrl(format!(
                    "unsupported scheme '{}', expected http, https, ws or wss",
                    other
                )))
            }
        };

        tracing::debug!(transport = caller.transport(), "aria2 client ready");
        Ok(Client::new(caller, self.secret))
    }
}

/// `http` -> `ws`, `https` -> `wss`; WebSocket URIs pass through
pub fn derive_ws_url(url: &Url) -> Result<Url> {
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(Error::InvalidUrl(format!(
                "cannot derive a WebSocket URI from scheme '{}'",
                other
            )))
        }
    };

    let mut ws = url.clone();
    ws.set_scheme(scheme)
        .map_err(|_| Error::InvalidUrl(format!("cannot switch {} to {}", url, scheme)))?;
    Ok(ws)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = ClientBuilder::new(DEFAULT_RPC_URI);
        assert_eq!(builder.timeout, Duration::from_secs(1));
        assert_eq!(builder.queue_capacity, 16);
        assert!(builder.secret.is_none());
        assert!(!builder.websocket);
        assert!(!builder.metrics);
        assert!(builder.observability_config.is_none());
    }

    #[test]
    fn test_builder_chaining() {
        let builder = ClientBuilder::new("ws://localhost:6800/jsonrpc")
            .secret("s3cret")
            .timeout(Duration::from_millis(250))
            .queue_capacity(4)
            .with_metrics()
            .service_name("downloader");

        assert_eq!(builder.secret.as_deref(), Some("s3cret"));
        assert_eq!(builder.timeout, Duration::from_millis(250));
        assert_eq!(builder.queue_capacity, 4);
        assert!(builder.metrics);
        assert_eq!(builder.service_name.as_deref(), Some("downloader"));
    }

    #[test]
    fn test_from_env() {
        std::env::set_var(ENV_RPC_URI, "http://daemon:6801/jsonrpc");
        std::env::set_var(ENV_RPC_SECRET, "from-env");
        let builder = ClientBuilder::from_env();
        std::env::remove_var(ENV_RPC_URI);
        std::env::remove_var(ENV_RPC_SECRET);

        assert_eq!(builder.uri, "http://daemon:6801/jsonrpc");
        assert_eq!(builder.secret.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_derive_ws_url() {
        let http = Url::parse("http://localhost:6800/jsonrpc").unwrap();
        assert_eq!(derive_ws_url(&http).unwrap().as_str(), "ws://localhost:6800/jsonrpc");

        let https = Url::parse("https://example.org/jsonrpc").unwrap();
        assert_eq!(derive_ws_url(&https).unwrap().as_str(), "wss://example.org/jsonrpc");

        let ftp = Url::parse("ftp://example.org/").unwrap();
        assert!(matches!(derive_ws_url(&ftp), Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_build_http_without_connecting() {
        let client = ClientBuilder::new("http://127.0.0.1:1/jsonrpc")
            .build()
            .await
            .unwrap();
        assert_eq!(client.caller().transport(), "http");
    }

    #[tokio::test]
    async fn test_build_rejects_unknown_scheme() {
        let result = ClientBuilder::new("ftp://localhost:6800/jsonrpc").build().await;
        assert!(matches!(result, Err(Error::InvalidUrl(_))));

        let result = ClientBuilder::new("not a uri").build().await;
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_build_websocket_refused() {
        let result = ClientBuilder::new("http://127.0.0.1:1/jsonrpc")
            .websocket()
            .build()
            .await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn test_build_secure_websocket_reaches_handshake() {
        // Accepts the TCP connection, then hangs up mid TLS handshake
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            if let Ok((stream, _)) = listener.accept().await {
                drop(stream);
            }
        });

        let result = ClientBuilder::new(format!("https://127.0.0.1:{}/jsonrpc", port))
            .websocket()
            .connect_timeout(Duration::from_secs(2))
            .build()
            .await;
        match result {
            Err(Error::Transport(msg)) => assert!(!msg.contains("TLS support not compiled in")),
            Err(other) => panic!("expected transport error, got {:?}", other),
            Ok(_) => panic!("handshake against a closed socket succeeded"),
        }
    }
}
