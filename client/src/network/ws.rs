//! # WebSocket Transport
//!
//! A durable connection to a hub. One background task owns the socket and
//! multiplexes four event sources:
//!
//! ```text
//!   outgoing queue ──┐
//!   socket frames  ──┼──> session loop ──> pending responses (by tag)
//!   heartbeat tick ──┤                └──> notification broadcast
//!   shutdown       ──┘
//! ```
//!
//! Requests are correlated by a random tag. When a session drops, every
//! in-flight request fails with [`TransportError::ConnectionLost`] and the
//! task reconnects with capped exponential backoff. Frames queued while
//! disconnected are sent once the next session is up.

use dashmap::DashMap;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use super::transport::{
    response_result, JustsayingBody, Notification, RequestBody, ResponseBody, Transport,
    TransportError, WireMessage,
};
use crate::config::{
    HEARTBEAT_INTERVAL, NOTIFICATION_CHANNEL_CAPACITY, RECONNECT_BASE_DELAY, RECONNECT_MAX_DELAY,
    REQUEST_TIMEOUT,
};

/// Command of the keep-alive request, in both directions.
const HEARTBEAT_COMMAND: &str = "heartbeat";

type PendingSender = oneshot::Sender<Result<Value, TransportError>>;
type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// State shared between the handle and the connection task.
struct Shared {
    pending: DashMap<String, PendingSender>,
    notifications: broadcast::Sender<Notification>,
    closed: AtomicBool,
}

impl Shared {
    fn new() -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);
        Self {
            pending: DashMap::new(),
            notifications,
            closed: AtomicBool::new(false),
        }
    }

    fn fail_pending(&self, error: TransportError) {
        let tags: Vec<String> = self.pending.iter().map(|e| e.key().clone()).collect();
        for tag in tags {
            if let Some((_, tx)) = self.pending.remove(&tag) {
                let _ = tx.send(Err(error.clone()));
            }
        }
    }

    /// Dispatch one inbound text frame. Returns a frame to send back, if
    /// the hub expects one.
    fn handle_text(&self, text: &str) -> Option<String> {
        let message = match WireMessage::decode(text) {
            Ok(m) => m,
            Err(e) => {
                debug!(error = %e, "ignoring malformed frame");
                return None;
            }
        };

        match message {
            WireMessage::Response(ResponseBody { tag, response }) => {
                match self.pending.remove(&tag) {
                    Some((_, tx)) => {
                        let _ = tx.send(response_result(response));
                    }
                    None => trace!(%tag, "response for unknown tag"),
                }
                None
            }
            WireMessage::Justsaying(JustsayingBody { subject, body }) => {
                let _ = self
                    .notifications
                    .send(Notification::Justsaying { subject, body });
                None
            }
            WireMessage::Request(RequestBody { command, tag, .. })
                if command == HEARTBEAT_COMMAND =>
            {
                WireMessage::Response(ResponseBody {
                    tag,
                    response: None,
                })
                .encode()
                .ok()
            }
            WireMessage::Request(RequestBody {
                command, params, ..
            }) => {
                let _ = self
                    .notifications
                    .send(Notification::Request { command, params });
                None
            }
        }
    }
}

/// How a session ended.
enum SessionEnd {
    Shutdown,
    Dropped(String),
}

/// A [`Transport`] over a reconnecting WebSocket.
pub struct WsTransport {
    url: String,
    shared: Arc<Shared>,
    outgoing: mpsc::UnboundedSender<String>,
    shutdown: watch::Sender<bool>,
    request_timeout: Duration,
}

impl WsTransport {
    /// Start connecting to `url` with the default request timeout.
    ///
    /// Returns immediately; the connection is established in the
    /// background and requests issued before it is up are queued. Must be
    /// called from within a Tokio runtime.
    pub fn connect(url: impl Into<String>) -> Self {
        Self::with_timeout(url, REQUEST_TIMEOUT)
    }

    /// Like [`WsTransport::connect`] with a custom per-request timeout.
    pub fn with_timeout(url: impl Into<String>, request_timeout: Duration) -> Self {
        // Fails only if another provider was installed first, which is fine.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let url = url.into();
        let shared = Arc::new(Shared::new());
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);

        tokio::spawn(connection_loop(
            url.clone(),
            Arc::clone(&shared),
            outgoing_rx,
            shutdown_rx,
        ));

        Self {
            url,
            shared,
            outgoing,
            shutdown,
            request_timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn send_frame(&self, frame: String) -> Result<(), TransportError> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        self.outgoing
            .send(frame)
            .map_err(|_| TransportError::Closed)
    }
}

#[async_trait::async_trait]
impl Transport for WsTransport {
    async fn request(&self, command: &str, params: Option<Value>) -> Result<Value, TransportError> {
        let tag = Uuid::new_v4().to_string();
        let frame = WireMessage::Request(RequestBody {
            command: command.to_string(),
            params,
            tag: tag.clone(),
        })
        .encode()?;

        let (tx, rx) = oneshot::channel();
        self.shared.pending.insert(tag.clone(), tx);
        if let Err(e) = self.send_frame(frame) {
            self.shared.pending.remove(&tag);
            return Err(e);
        }
        trace!(command, %tag, "request queued");

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(TransportError::ConnectionLost),
            Err(_) => {
                self.shared.pending.remove(&tag);
                Err(TransportError::Timeout {
                    command: command.to_string(),
                    timeout: self.request_timeout,
                })
            }
        }
    }

    async fn justsaying(&self, subject: &str, body: Option<Value>) -> Result<(), TransportError> {
        let frame = WireMessage::Justsaying(JustsayingBody {
            subject: subject.to_string(),
            body,
        })
        .encode()?;
        self.send_frame(frame)
    }

    fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.shared.notifications.subscribe()
    }

    async fn close(&self) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let _ = self.shutdown.send(true);
        self.shared.fail_pending(TransportError::Closed);
        info!(url = %self.url, "transport closed");
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

// ---------------------------------------------------------------------------
// Connection task
// ---------------------------------------------------------------------------

/// Delay before reconnection attempt number `attempt` (1-based).
fn backoff_delay(attempt: u32) -> Duration {
    let factor = 1u32 << attempt.saturating_sub(1).min(16);
    RECONNECT_BASE_DELAY
        .saturating_mul(factor)
        .min(RECONNECT_MAX_DELAY)
}

async fn connection_loop(
    url: String,
    shared: Arc<Shared>,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut attempt = 0u32;

    loop {
        if *shutdown.borrow() {
            break;
        }

        match connect_async(url.as_str()).await {
            Ok((socket, _)) => {
                info!(%url, "connected to hub");
                attempt = 0;
                let end = run_session(socket, &shared, &mut outgoing, &mut shutdown).await;
                shared.fail_pending(TransportError::ConnectionLost);
                match end {
                    SessionEnd::Shutdown => break,
                    SessionEnd::Dropped(reason) => warn!(%url, %reason, "connection dropped"),
                }
            }
            Err(e) => warn!(%url, attempt, error = %e, "connection attempt failed"),
        }

        attempt = attempt.saturating_add(1);
        let delay = backoff_delay(attempt);
        debug!(%url, ?delay, "reconnecting");
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = shutdown.changed() => break,
        }
    }

    shared.fail_pending(TransportError::Closed);
    debug!(%url, "connection task finished");
}

async fn run_session(
    socket: Socket,
    shared: &Shared,
    outgoing: &mut mpsc::UnboundedReceiver<String>,
    shutdown: &mut watch::Receiver<bool>,
) -> SessionEnd {
    let (mut write, mut read) = socket.split();

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                let _ = write.send(Message::Close(None)).await;
                return SessionEnd::Shutdown;
            }

            frame = outgoing.recv() => {
                let Some(frame) = frame else {
                    let _ = write.send(Message::Close(None)).await;
                    return SessionEnd::Shutdown;
                };
                if let Err(e) = write.send(Message::Text(frame.into())).await {
                    return SessionEnd::Dropped(e.to_string());
                }
            }

            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Some(reply) = shared.handle_text(text.as_str()) {
                        if let Err(e) = write.send(Message::Text(reply.into())).await {
                            return SessionEnd::Dropped(e.to_string());
                        }
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    let _ = write.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | None => {
                    return SessionEnd::Dropped("closed by hub".into());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return SessionEnd::Dropped(e.to_string()),
            },

            _ = heartbeat.tick() => {
                let frame = WireMessage::Request(RequestBody {
                    command: HEARTBEAT_COMMAND.to_string(),
                    params: None,
                    tag: Uuid::new_v4().to_string(),
                })
                .encode();
                if let Ok(frame) = frame {
                    if let Err(e) = write.send(Message::Text(frame.into())).await {
                        return SessionEnd::Dropped(e.to_string());
                    }
                }
            }
        }
    }
}
