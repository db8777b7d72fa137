//! Mock aria2 daemons for ariarpc-client integration tests
//!
//! Both mocks hand every decoded request to a synchronous handler and record
//! it so tests can inspect exactly what went over the wire.

#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

type WsHandler = Arc<dyn Fn(&Value) -> Vec<Value> + Send + Sync>;

enum Control {
    Push(String),
    Drop,
}

/// WebSocket daemon stand-in
///
/// Replies are whatever the handler returns for each request, in order.
/// Frames can also be pushed unprompted, and the connection can be cut
/// without a close handshake.
pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    control_tx: mpsc::UnboundedSender<Control>,
    message_rx: mpsc::UnboundedReceiver<Value>,
}

impl MockWsServer {
    /// Daemon that answers every request with `"OK"`
    pub async fn new() -> Self {
        Self::with_handler(|request| vec![mock_response(&request["id"], json!("OK"))]).await
    }

    /// Daemon that never answers
    pub async fn silent() -> Self {
        Self::with_handler(|_| Vec::new()).await
    }

    pub async fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&Value) -> Vec<Value> + Send + Sync + 'static,
    {
        let handler: WsHandler = Arc::new(handler);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (control_tx, control_rx) = mpsc::unbounded_channel::<Control>();
        let (seen_tx, message_rx) = mpsc::unbounded_channel::<Value>();
        let control_rx = Arc::new(Mutex::new(Some(control_rx)));

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    accepted = listener.accept() => {
                        let Ok((stream, _)) = accepted else { continue };
                        let handler = handler.clone();
                        let seen_tx = seen_tx.clone();
                        let control_rx = control_rx.clone();

                        tokio::spawn(async move {
                            let Ok(ws_stream) = accept_async(stream).await else { return };
                            let (mut write, mut read) = ws_stream.split();
                            let mut control = control_rx.lock().await.take();

                            loop {
                                tokio::select! {
                                    frame = read.next() => match frame {
                                        Some(Ok(Message::Text(text))) => {
                                            let Ok(request) = serde_json::from_str::<Value>(&text) else {
                                                continue;
                                            };
                                            let _ = seen_tx.send(request.clone());
                                            for reply in handler(&request) {
                                                if write.send(Message::Text(reply.to_string())).await.is_err() {
                                                    return;
                                                }
                                            }
                                        }
                                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                                        Some(Ok(_)) => {}
                                    },
                                    command = next_command(&mut control) => match command {
                                        Some(Control::Push(text)) => {
                                            let _ = write.send(Message::Text(text)).await;
                                        }
                                        Some(Control::Drop) | None => return,
                                    },
                                }
                            }
                        });
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            control_tx,
            message_rx,
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}/jsonrpc", self.addr)
    }

    /// Same endpoint with an http scheme
    pub fn http_url(&self) -> String {
        format!("http://{}/jsonrpc", self.addr)
    }

    /// Send a frame to the connected client
    pub fn push(&self, frame: impl Into<String>) {
        let _ = self.control_tx.send(Control::Push(frame.into()));
    }

    /// Cut the connection without a close handshake
    pub fn drop_connection(&self) {
        let _ = self.control_tx.send(Control::Drop);
    }

    /// Next request the daemon received, within 5 seconds
    pub async fn wait_for_request(&mut self) -> Option<Value> {
        tokio::time::timeout(Duration::from_secs(5), self.message_rx.recv())
            .await
            .ok()
            .flatten()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

async fn next_command(control: &mut Option<mpsc::UnboundedReceiver<Control>>) -> Option<Control> {
    match control {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// HTTP daemon stand-in built on warp
///
/// The handler returns the status code and raw body for each request.
pub struct MockHttpServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    message_rx: mpsc::UnboundedReceiver<Value>,
}

impl MockHttpServer {
    pub async fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&Value) -> (u16, String) + Send + Sync + 'static,
    {
        use warp::Filter;

        let handler = Arc::new(handler);
        let (seen_tx, message_rx) = mpsc::unbounded_channel::<Value>();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let route = warp::post()
            .and(warp::path("jsonrpc"))
            .and(warp::path::end())
            .and(warp::body::json())
            .map(move |request: Value| {
                let _ = seen_tx.send(request.clone());
                let (status, body) = handler(&request);
                let status = warp::http::StatusCode::from_u16(status)
                    .unwrap_or(warp::http::StatusCode::INTERNAL_SERVER_ERROR);
                warp::reply::with_status(body, status)
            });

        let (addr, server) = warp::serve(route)
            .bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async {
                let _ = shutdown_rx.await;
            });
        tokio::spawn(server);

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            message_rx,
        }
    }

    /// Daemon answering every call with `result`
    pub async fn answering(result: Value) -> Self {
        Self::with_handler(move |request| (200, mock_response(&request["id"], result.clone()).to_string())).await
    }

    pub fn url(&self) -> String {
        format!("http://{}/jsonrpc", self.addr)
    }

    pub async fn wait_for_request(&mut self) -> Option<Value> {
        tokio::time::timeout(Duration::from_secs(5), self.message_rx.recv())
            .await
            .ok()
            .flatten()
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

pub fn mock_response(id: &Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

pub fn mock_error_response(id: &Value, code: i32, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message
        }
    })
}

/// aria2-style notification for the given GIDs
pub fn mock_notification(method: &str, gids: &[&str]) -> String {
    let events: Vec<Value> = gids.iter().map(|gid| json!({ "gid": gid })).collect();
    json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": events
    })
    .to_string()
}

/// Wait until `check` holds, polling every 10ms for up to 2 seconds
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
