//! WebSocket transport
//!
//! One persistent connection shared by any number of concurrent callers.
//!
//! # Tasks
//!
//! Construction spawns exactly two tasks, both bound to the caller's
//! cancellation token:
//!
//! - **sender**: takes calls off a bounded queue in submission order,
//!   registers each in the [`PendingTable`] and only then writes the frame.
//!   It is the only writer on the connection.
//! - **receiver**: reads frames, hands replies to the pending table and
//!   notifications to the [`NotificationDispatcher`].
//!
//! # Calls
//!
//! [`Caller::invoke`] never blocks on a full queue; it fails with
//! [`Error::Backpressure`] instead. Once queued, the caller waits for its
//! reply, its deadline or the connection going away, whichever comes first.
//!
//! # Failure
//!
//! A read error that is not transient (or the peer closing the connection)
//! ends the receiver, cancels the sender and immediately fails every pending
//! call with [`Error::ConnectionClosed`]. There is no reconnection; build a
//! new caller.

use crate::caller::Caller;
use crate::id::IdGenerator;
use crate::metrics::ClientMetrics;
use crate::notification::{Notifier, NotificationDispatcher};
use crate::pending::{Admission, PendingTable, ReplySlot};
use ariarpc_core::{codec, Error, Id, Inbound, JsonRpcRequest, JsonRpcResponse, Result};
use async_trait::async_trait;
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde_json::Value;
use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use url::Url;

/// Default outbound queue capacity
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Default per-call deadline
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(1);

/// How long the sender keeps trying to deliver the Close frame on shutdown
const CLOSE_GRACE: Duration = Duration::from_millis(500);

/// Socket transport settings
#[derive(Clone)]
pub struct SocketConfig {
    /// Per-call deadline
    pub timeout: Duration,
    /// Deadline for the WebSocket handshake
    pub connect_timeout: Duration,
    /// Outbound queue capacity
    pub queue_capacity: usize,
    /// Consecutive transient read errors tolerated before giving up
    pub max_transient_errors: u32,
    /// Receiver of daemon notifications
    pub notifier: Option<Arc<dyn Notifier>>,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_CALL_TIMEOUT,
            connect_timeout: Duration::from_secs(5),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_transient_errors: 8,
            notifier: None,
        }
    }
}

impl std::fmt::Debug for SocketConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketConfig")
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("queue_capacity", &self.queue_capacity)
            .field("max_transient_errors", &self.max_transient_errors)
            .field("notifier", &self.notifier.is_some())
            .finish()
    }
}

/// A call waiting for the sender task
struct Outbound {
    request: JsonRpcRequest,
    tx: ReplySlot,
}

/// Persistent-connection caller
pub struct SocketCaller {
    queue: mpsc::Sender<Outbound>,
    capacity: usize,
    pending: Arc<PendingTable>,
    ids: Arc<IdGenerator>,
    timeout: Duration,
    cancel: CancellationToken,
    tasks: Mutex<Option<(JoinHandle<()>, JoinHandle<()>)>>,
    closed: AtomicBool,
    metrics: Option<Arc<ClientMetrics>>,
}

impl SocketCaller {
    /// Open a WebSocket to `url` and start the background tasks
    #[tracing::instrument(skip(url, config), fields(url = %url))]
    pub async fn connect(url: &Url, config: SocketConfig) -> Result<Self> {
        Self::connect_with(url, config, Arc::new(IdGenerator::new()), None).await
    }

    pub(crate) async fn connect_with(
        url: &Url,
        config: SocketConfig,
        ids: Arc<IdGenerator>,
        metrics: Option<Arc<ClientMetrics>>,
    ) -> Result<Self> {
        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(Error::InvalidUrl(format!(
                    "unsupported scheme '{}' for WebSocket transport",
                    other
                )))
            }
        }

        let handshake = tokio_tungstenite::connect_async(url.as_str());
        let (ws_stream, _) = tokio::time::timeout(config.connect_timeout, handshake)
            .await
            .map_err(|_| Error::Timeout)?
            .map_err(|e| Error::Transport(e.to_string()))?;

        tracing::info!("connected");

        let (sink, stream) = ws_stream.split();
        Ok(Self::spawn(sink, stream, config, ids, metrics))
    }

    /// Run over an already-established message transport
    ///
    /// Must be called from within a Tokio runtime.
    pub fn from_transport<S, R>(sink: S, stream: R, config: SocketConfig) -> Self
    where
        S: Sink<Message, Error = WsError> + Send + Unpin + 'static,
        R: Stream<Item = std::result::Result<Message, WsError>> + Send + Unpin + 'static,
    {
        Self::spawn(sink, stream, config, Arc::new(IdGenerator::new()), None)
    }

    fn spawn<S, R>(
        sink: S,
        stream: R,
        config: SocketConfig,
        ids: Arc<IdGenerator>,
        metrics: Option<Arc<ClientMetrics>>,
    ) -> Self
    where
        S: Sink<Message, Error = WsError> + Send + Unpin + 'static,
        R: Stream<Item = std::result::Result<Message, WsError>> + Send + Unpin + 'static,
    {
        let capacity = config.queue_capacity.max(1);
        let (queue, rx) = mpsc::channel(capacity);
        let pending = Arc::new(PendingTable::new());
        let cancel = CancellationToken::new();

        let sender = tokio::spawn(
            send_loop(sink, rx, pending.clone(), cancel.clone(), metrics.clone())
                .instrument(tracing::debug_span!("aria2_socket_sender")),
        );
        let receiver = tokio::spawn(
            receive_loop(
                stream,
                pending.clone(),
                NotificationDispatcher::new(config.notifier.clone()),
                cancel.clone(),
                metrics.clone(),
                config.max_transient_errors,
            )
            .instrument(tracing::debug_span!("aria2_socket_receiver")),
        );

        Self {
            queue,
            capacity,
            pending,
            ids,
            timeout: config.timeout,
            cancel,
            tasks: Mutex::new(Some((sender, receiver))),
            closed: AtomicBool::new(false),
            metrics,
        }
    }

    /// True once `close()` was called or the connection failed
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.cancel.is_cancelled()
    }

    /// Number of calls written and awaiting a reply
    pub async fn pending_calls(&self) -> usize {
        self.pending.len().await
    }

    async fn round_trip(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let id = Id::from(self.ids.next());
        let (tx, mut rx) = oneshot::channel();
        let outbound = Outbound {
            request: JsonRpcRequest::new(method, params, id.clone()),
            tx,
        };

        self.queue.try_send(outbound).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => Error::Backpressure {
                capacity: self.capacity,
            },
            mpsc::error::TrySendError::Closed(_) => Error::ConnectionClosed,
        })?;

        let outcome = tokio::select! {
            biased;
            reply = &mut rx => Wait::Reply(reply),
            _ = self.cancel.cancelled() => Wait::Closed,
            _ = tokio::time::sleep(self.timeout) => Wait::Deadline,
        };

        match outcome {
            Wait::Reply(Ok(reply)) => reply.and_then(JsonRpcResponse::into_result),
            Wait::Reply(Err(_)) => Err(Error::ConnectionClosed),
            Wait::Closed => {
                drop(rx);
                self.pending.cancel(&id).await;
                Err(Error::ConnectionClosed)
            }
            Wait::Deadline => {
                // Dropping the receiver first lets the sender skip the call if
                // it has not been written yet.
                drop(rx);
                self.pending.cancel(&id).await;
                tracing::debug!(%id, method, "call timed out");
                Err(Error::Timeout)
            }
        }
    }
}

enum Wait {
    Reply(std::result::Result<Result<JsonRpcResponse>, oneshot::error::RecvError>),
    Closed,
    Deadline,
}

#[async_trait]
impl Caller for SocketCaller {
    #[tracing::instrument(skip(self, params), fields(transport = "socket"))]
    async fn invoke(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        let start = Instant::now();
        let result = self.round_trip(method, params).await;

        if let Some(metrics) = &self.metrics {
            let status = if result.is_ok() { "success" } else { "error" };
            metrics.record_call("socket", method, status, start.elapsed().as_secs_f64());
            if let Err(e) = &result {
                metrics.record_error(e.kind());
            }
        }
        result
    }

    /// Stop both tasks and release every pending call
    ///
    /// Returns only after both tasks have finished. Concurrent and repeated
    /// calls wait for the first one and then return `Ok`.
    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::Release);
        self.cancel.cancel();

        let mut tasks = self.tasks.lock().await;
        let Some((sender, receiver)) = tasks.take() else {
            return Ok(());
        };

        if let Err(e) = sender.await {
            tracing::warn!(error = %e, "sender task ended abnormally");
        }
        if let Err(e) = receiver.await {
            tracing::warn!(error = %e, "receiver task ended abnormally");
        }

        let released = self.pending.fail_all(Error::ConnectionClosed).await;
        tracing::info!(released, "socket caller closed");
        Ok(())
    }

    fn transport(&self) -> &'static str {
        "socket"
    }
}

impl Drop for SocketCaller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn send_loop<S>(
    mut sink: S,
    mut rx: mpsc::Receiver<Outbound>,
    pending: Arc<PendingTable>,
    cancel: CancellationToken,
    metrics: Option<Arc<ClientMetrics>>,
) where
    S: Sink<Message, Error = WsError> + Unpin,
{
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = rx.recv() => next,
        };
        let Some(Outbound { request, tx }) = next else {
            break;
        };

        let frame = match codec::encode_request(&request) {
            Ok(frame) => frame,
            Err(e) => {
                let _ = tx.send(Err(e));
                continue;
            }
        };

        match pending.add(&request.id, tx).await {
            Ok(Admission::Added) => {}
            Ok(Admission::Abandoned) => {
                tracing::debug!(id = %request.id, "caller gave up before send, skipping");
                continue;
            }
            Err(e) => {
                tracing::warn!(id = %request.id, error = %e, "call not registered");
                continue;
            }
        }
        if let Some(m) = &metrics {
            m.record_pending(pending.len().await);
        }

        tracing::debug!(id = %request.id, method = %request.method, "writing call");
        let written = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                pending.fail(&request.id, Error::ConnectionClosed).await;
                break;
            }
            written = sink.send(Message::Text(frame)) => written,
        };

        if let Err(e) = written {
            tracing::error!(error = %e, "write failed, shutting down");
            pending
                .fail(&request.id, Error::Transport(e.to_string()))
                .await;
            cancel.cancel();
            break;
        }
    }

    // Calls still queued never reached the wire.
    rx.close();
    while let Ok(Outbound { tx, .. }) = rx.try_recv() {
        let _ = tx.send(Err(Error::ConnectionClosed));
    }

    let goodbye = async {
        sink.send(Message::Close(None)).await?;
        sink.close().await
    };
    match tokio::time::timeout(CLOSE_GRACE, goodbye).await {
        Ok(Ok(())) => tracing::debug!("close frame sent"),
        Ok(Err(e)) => tracing::debug!(error = %e, "close frame not sent"),
        Err(_) => tracing::debug!("close frame timed out"),
    }
}

async fn receive_loop<R>(
    mut stream: R,
    pending: Arc<PendingTable>,
    dispatcher: NotificationDispatcher,
    cancel: CancellationToken,
    metrics: Option<Arc<ClientMetrics>>,
    max_transient_errors: u32,
) where
    R: Stream<Item = std::result::Result<Message, WsError>> + Unpin,
{
    let mut transient = 0u32;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = stream.next() => next,
        };

        match next {
            Some(Ok(Message::Text(text))) => {
                transient = 0;
                handle_frame(&text, &pending, &dispatcher, metrics.as_deref()).await;
            }
            Some(Ok(Message::Binary(bytes))) => {
                transient = 0;
                match String::from_utf8(bytes) {
                    Ok(text) => {
                        handle_frame(&text, &pending, &dispatcher, metrics.as_deref()).await
                    }
                    Err(e) => tracing::warn!(error = %e, "non UTF-8 binary frame dropped"),
                }
            }
            Some(Ok(Message::Close(frame))) => {
                tracing::info!(?frame, "connection closed by peer");
                break;
            }
            Some(Ok(_)) => {
                transient = 0;
            }
            Some(Err(e)) if is_transient(&e) && transient < max_transient_errors => {
                transient += 1;
                tracing::warn!(error = %e, attempt = transient, "transient read error, retrying");
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "read failed, shutting down");
                break;
            }
            None => {
                tracing::info!("connection stream ended");
                break;
            }
        }
    }

    cancel.cancel();
    let released = pending.fail_all(Error::ConnectionClosed).await;
    if released > 0 {
        tracing::warn!(released, "pending calls failed by connection loss");
    }
}

async fn handle_frame(
    text: &str,
    pending: &PendingTable,
    dispatcher: &NotificationDispatcher,
    metrics: Option<&ClientMetrics>,
) {
    let inbound = match codec::decode_inbound(text) {
        Ok(inbound) => inbound,
        Err(e) => {
            tracing::warn!(error = %e, "unparseable frame dropped");
            return;
        }
    };

    let mut work = vec![inbound];
    while let Some(item) = work.pop() {
        match item {
            Inbound::Reply(reply) => {
                let matched = pending.process(reply).await;
                if let Some(m) = metrics {
                    if matched {
                        m.record_pending(pending.len().await);
                    } else {
                        m.record_late_reply();
                    }
                }
            }
            Inbound::MalformedReply { id, reason } => {
                tracing::warn!(%id, %reason, "malformed reply");
                pending.fail(&id, Error::Decode(reason)).await;
            }
            Inbound::Notification(notification) => {
                if let Some(m) = metrics {
                    m.record_notification(&notification.method);
                }
                dispatcher.dispatch(&notification);
            }
            Inbound::Batch(items) => work.extend(items.into_iter().rev()),
            Inbound::Unknown(value) => {
                tracing::warn!(frame = %value, "unrecognized frame dropped");
            }
        }
    }
}

fn is_transient(err: &WsError) -> bool {
    match err {
        WsError::Io(e) => matches!(
            e.kind(),
            ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut
        ),
        _ => false,
    }
}
