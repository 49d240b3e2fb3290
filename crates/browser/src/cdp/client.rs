//! CDP Client - The Core Communication Layer
//!
//! Design decisions:
//! 1. Single WebSocket per browser connection (no per-session WS overhead)
//! 2. Async message passing - no locks on send/receive path
//! 3. Request/response matching via ID, events broadcast to subscribers
//! 4. Fail fast - no retries, no queuing. Let the caller decide.

use dashmap::DashMap;
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{oneshot, RwLock};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::protocol::*;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// How long to wait for the browser to answer a single command.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum CDPError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CDP protocol error: {code} - {message}")]
    Protocol { code: i32, message: String },

    #[error("Request timeout")]
    Timeout,

    #[error("Connection closed")]
    Closed,
}

/// Result type for CDP operations
pub type Result<T> = std::result::Result<T, CDPError>;

/// Event subscriber callback
pub type EventCallback = Arc<dyn Fn(CDPEvent) + Send + Sync>;

/// CDP Client - manages single WebSocket connection to browser
pub struct CDPClient {
    /// Monotonic request ID counter
    next_id: AtomicU64,

    /// Pending requests waiting for responses
    /// Key: request_id, Value: oneshot sender for response
    pending: Arc<DashMap<RequestId, oneshot::Sender<CDPResponse>>>,

    /// Event subscribers
    /// Key: method name (e.g., "Network.loadingFinished"), Value: callbacks
    subscribers: Arc<DashMap<String, Vec<EventCallback>>>,

    /// WebSocket write half. Taken on close, so a closed client fails fast.
    ws_sink: RwLock<Option<WsSink>>,
}

impl CDPClient {
    /// Connect to Chrome DevTools Protocol endpoint
    pub async fn connect(ws_url: &str) -> Result<Arc<Self>> {
        let (ws_stream, _) = connect_async(ws_url).await?;
        let (sink, mut stream) = ws_stream.split();

        let client = Arc::new(Self {
            next_id: AtomicU64::new(1),
            pending: Arc::new(DashMap::new()),
            subscribers: Arc::new(DashMap::new()),
            ws_sink: RwLock::new(Some(sink)),
        });

        // Spawn message receiver task
        let client_clone = client.clone();
        tokio::spawn(async move {
            while let Some(msg) = stream.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        if let Err(e) = client_clone.handle_message(&text).await {
                            tracing::error!("Failed to handle message: {}", e);
                        }
                    }
                    Ok(Message::Close(_)) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Err(e) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }

            // Wake up everything still waiting on a response
            client_clone.pending.clear();
        });

        Ok(client)
    }

    /// Send CDP request and wait for response
    pub async fn send_request(
        &self,
        method: impl Into<String>,
        params: Option<Value>,
        session_id: Option<SessionId>,
    ) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = CDPRequest {
            id,
            method: method.into(),
            params,
            session_id,
        };

        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        // Serialize and send
        let json = serde_json::to_string(&request)?;
        {
            let mut sink = self.ws_sink.write().await;
            match sink.as_mut() {
                Some(sink) => {
                    if let Err(e) = sink.send(Message::Text(json)).await {
                        self.pending.remove(&id);
                        return Err(e.into());
                    }
                }
                None => {
                    self.pending.remove(&id);
                    return Err(CDPError::Closed);
                }
            }
        } // Release lock before waiting

        // Wait for response, bounded so a dead browser can't hang the caller
        let response = match tokio::time::timeout(REQUEST_TIMEOUT, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(CDPError::Closed),
            Err(_) => {
                self.pending.remove(&id);
                return Err(CDPError::Timeout);
            }
        };

        if let Some(error) = response.error {
            return Err(CDPError::Protocol {
                code: error.code,
                message: error.message,
            });
        }

        Ok(response.result.unwrap_or(Value::Null))
    }

    /// Subscribe to CDP events
    pub fn subscribe(&self, method: impl Into<String>, callback: EventCallback) {
        let method = method.into();
        self.subscribers
            .entry(method)
            .or_insert_with(Vec::new)
            .push(callback);
    }

    /// Handle incoming WebSocket message
    pub(crate) async fn handle_message(&self, text: &str) -> Result<()> {
        let msg: CDPMessage = serde_json::from_str(text)?;

        match msg {
            CDPMessage::Response(response) => {
                if let Some((_, tx)) = self.pending.remove(&response.id) {
                    let _ = tx.send(response); // Ignore send errors (receiver dropped)
                } else {
                    tracing::warn!("Received response for unknown request: {}", response.id);
                }
            }
            CDPMessage::Event(event) => {
                if let Some(subscribers) = self.subscribers.get(&event.method) {
                    for callback in subscribers.value() {
                        callback(event.clone());
                    }
                }
            }
        }

        Ok(())
    }

    /// Close connection gracefully. Safe to call more than once.
    pub async fn close(self: Arc<Self>) -> Result<()> {
        if let Some(mut sink) = self.ws_sink.write().await.take() {
            sink.close().await?;
        }
        Ok(())
    }

    /// Client with no connection behind it, for exercising the message
    /// handling paths without a browser.
    #[cfg(test)]
    pub(crate) fn detached() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1),
            pending: Arc::new(DashMap::new()),
            subscribers: Arc::new(DashMap::new()),
            ws_sink: RwLock::new(None),
        })
    }

    /// Client over an arbitrary sink, for exercising the send path.
    #[cfg(test)]
    fn with_sink(sink: WsSink) -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1),
            pending: Arc::new(DashMap::new()),
            subscribers: Arc::new(DashMap::new()),
            ws_sink: RwLock::new(Some(sink)),
        })
    }
}
