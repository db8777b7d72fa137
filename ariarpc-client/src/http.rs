//! HTTP transport
//!
//! One POST per call. aria2 does not cope well with pipelined HTTP RPCs, so
//! the connection pool keeps at most one idle connection to the daemon and
//! calls are serialized through an async gate: at most one request is on the
//! wire at any time. The per-call deadline covers the wait for the gate as
//! well as the request itself. No notifications ever arrive on this transport.

use crate::caller::Caller;
use crate::id::IdGenerator;
use crate::metrics::ClientMetrics;
use ariarpc_core::{codec, Error, Id, JsonRpcRequest, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::Url;

/// Stateless request/response caller
pub struct HttpCaller {
    endpoint: Url,
    client: reqwest::Client,
    gate: Mutex<()>,
    timeout: Duration,
    ids: Arc<IdGenerator>,
    closed: AtomicBool,
    metrics: Option<Arc<ClientMetrics>>,
}

impl HttpCaller {
    /// Caller for `endpoint` with a per-call deadline of `timeout`
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self> {
        Self::with_parts(endpoint, timeout, Arc::new(IdGenerator::new()), None)
    }

    pub(crate) fn with_parts(
        endpoint: Url,
        timeout: Duration,
        ids: Arc<IdGenerator>,
        metrics: Option<Arc<ClientMetrics>>,
    ) -> Result<Self> {
        match endpoint.scheme() {
            "http" | "https" => {}
            other => {
                return Err(Error::InvalidUrl(format!(
                    "unsupported scheme '{}' for HTTP transport",
                    other
                )))
            }
        }

        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(1)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(Self {
            endpoint,
            client,
            gate: Mutex::new(()),
            timeout,
            ids,
            closed: AtomicBool::new(false),
            metrics,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn round_trip(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let _in_flight = self.gate.lock().await;

        let request = JsonRpcRequest::new(method, params, Id::from(self.ids.next()));
        let body = codec::encode_request(&request)?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = response.status();
        let text = response.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        codec::decode_response(&text)?.into_result()
    }
}

fn from_reqwest(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout
    } else {
        Error::Transport(err.to_string())
    }
}

#[async_trait]
impl Caller for HttpCaller {
    #[tracing::instrument(skip(self, params), fields(transport = "http"))]
    async fn invoke(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::ConnectionClosed);
        }

        let start = Instant::now();
        let result = tokio::time::timeout(self.timeout, self.round_trip(method, params))
            .await
            .unwrap_or(Err(Error::Timeout));

        if let Some(metrics) = &self.metrics {
            let status = if result.is_ok() { "success" } else { "error" };
            metrics.record_call("http", method, status, start.elapsed().as_secs_f64());
            if let Err(e) = &result {
                metrics.record_error(e.kind());
            }
        }
        if let Err(e) = &result {
            tracing::debug!(method, error = %e, "call failed");
        }
        result
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::info!(endpoint = %self.endpoint, "HTTP caller closed");
        }
        Ok(())
    }

    fn transport(&self) -> &'static str {
        "http"
    }
}
