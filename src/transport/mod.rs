//! Agent channel transport: the bidirectional message channel to an agent
//!
//! All transports (websocket, in-memory, etc.) implement `Connector` and
//! `Link`. `AgentChannel` wraps a connector and owns at most one live link,
//! translating outgoing JSON to text frames and inbound frames to
//! normalized `AgentMessage`s.

use crate::error::Result;
use crate::protocol;
use crate::types::AgentMessage;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

pub mod memory;
pub mod websocket;

/// Opens links to agent endpoints
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to the given URL; resolves once the link is ready for frames
    async fn connect(&self, url: &str) -> Result<Box<dyn Link>>;

    /// Transport name (e.g., "websocket", "memory")
    fn name(&self) -> &str;
}

/// One open, bidirectional text-frame link
#[async_trait]
pub trait Link: Send {
    /// Send one text frame
    async fn send(&mut self, frame: String) -> Result<()>;

    /// Receive the next text frame; `None` once the peer closed the link
    ///
    /// Must be cancel-safe: the channel pump polls it inside `select!`.
    async fn recv(&mut self) -> Option<Result<String>>;

    /// Close the link
    async fn close(&mut self) -> Result<()>;
}

/// Inbound message stream of one opened channel
pub type Inbound = ReceiverStream<AgentMessage>;

/// Readiness of the channel, mirroring the websocket ready states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Connecting,
    Open,
    Closed,
}

const CONNECTING: u8 = 0;
const OPEN: u8 = 1;
const CLOSED: u8 = 2;

fn decode_state(raw: u8) -> ReadyState {
    match raw {
        CONNECTING => ReadyState::Connecting,
        OPEN => ReadyState::Open,
        _ => ReadyState::Closed,
    }
}

/// Strip the query string so tokens never reach logs or errors
pub(crate) fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

struct LinkHandle {
    outgoing: mpsc::Sender<String>,
    state: Arc<AtomicU8>,
    task: JoinHandle<()>,
}

/// Transport wrapper owning exactly one live agent link at a time
///
/// Sends are best effort: a frame sent while the link is not open is
/// dropped, never queued for later delivery.
pub struct AgentChannel {
    connector: Arc<dyn Connector>,
    capacity: usize,
    link: Option<LinkHandle>,
}

impl AgentChannel {
    /// Create a closed channel backed by the given connector
    pub fn new(connector: Arc<dyn Connector>, capacity: usize) -> Self {
        Self {
            connector,
            capacity: capacity.max(1),
            link: None,
        }
    }

    /// Transport name of the underlying connector
    pub fn transport(&self) -> &str {
        self.connector.name()
    }

    /// Open a link to `url` and send `initial` as the first frame once ready
    ///
    /// Any link already open is closed first. Connection failures are
    /// delivered as an `error` message on the returned stream. Must be
    /// called from within a tokio runtime.
    pub fn open(&mut self, url: &str, initial: &serde_json::Value) -> Result<Inbound> {
        let initial = serde_json::to_string(initial)?;
        self.close();

        let (out_tx, out_rx) = mpsc::channel(self.capacity);
        let (in_tx, in_rx) = mpsc::channel(self.capacity);
        let state = Arc::new(AtomicU8::new(CONNECTING));

        let task = tokio::spawn(pump(
            self.connector.clone(),
            url.to_string(),
            initial,
            out_rx,
            in_tx,
            state.clone(),
        ));

        self.link = Some(LinkHandle {
            outgoing: out_tx,
            state,
            task,
        });

        Ok(ReceiverStream::new(in_rx))
    }

    /// Send a JSON payload; returns false if it was dropped
    pub fn send(&self, payload: &serde_json::Value) -> bool {
        let Some(link) = &self.link else {
            tracing::debug!("Send on closed channel dropped");
            return false;
        };

        if decode_state(link.state.load(Ordering::Acquire)) != ReadyState::Open {
            tracing::debug!("Send before channel ready dropped");
            return false;
        }

        let frame = match serde_json::to_string(payload) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode outgoing frame");
                return false;
            }
        };

        match link.outgoing.try_send(frame) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Outgoing frame dropped");
                false
            }
        }
    }

    /// Close the link; later sends are no-ops
    pub fn close(&mut self) {
        if let Some(link) = self.link.take() {
            let previous = link.state.swap(CLOSED, Ordering::AcqRel);
            if previous == CONNECTING {
                // Still inside connect(); nothing to close gracefully
                link.task.abort();
            }
            // Dropping the sender tells an open pump to close the link
            drop(link.outgoing);
            tracing::debug!(transport = self.connector.name(), "Agent channel closed");
        }
    }

    /// Current readiness
    pub fn ready_state(&self) -> ReadyState {
        match &self.link {
            Some(link) => decode_state(link.state.load(Ordering::Acquire)),
            None => ReadyState::Closed,
        }
    }
}

impl Drop for AgentChannel {
    fn drop(&mut self) {
        self.close();
    }
}

/// Drive one link: connect, send the initial frame, then shuttle frames
async fn pump(
    connector: Arc<dyn Connector>,
    url: String,
    initial: String,
    mut outgoing: mpsc::Receiver<String>,
    inbound: mpsc::Sender<AgentMessage>,
    state: Arc<AtomicU8>,
) {
    let mut link = match connector.connect(&url).await {
        Ok(link) => link,
        Err(e) => {
            tracing::warn!(url = %redact(&url), error = %e, "Agent connection failed");
            state.store(CLOSED, Ordering::Release);
            let _ = inbound
                .send(AgentMessage::transport_error(format!("WebSocket error: {}", e)))
                .await;
            return;
        }
    };

    // The channel may have been closed while connecting
    if state
        .compare_exchange(CONNECTING, OPEN, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        let _ = link.close().await;
        return;
    }

    tracing::info!(url = %redact(&url), transport = connector.name(), "Agent channel open");

    if let Err(e) = link.send(initial).await {
        tracing::warn!(error = %e, "Failed to send initial parameters");
        state.store(CLOSED, Ordering::Release);
        let _ = inbound
            .send(AgentMessage::transport_error(format!("WebSocket error: {}", e)))
            .await;
        return;
    }

    loop {
        tokio::select! {
            frame = outgoing.recv() => match frame {
                Some(frame) => {
                    tracing::debug!(bytes = frame.len(), "Frame sent");
                    if let Err(e) = link.send(frame).await {
                        tracing::warn!(error = %e, "Agent link send failed");
                        state.store(CLOSED, Ordering::Release);
                        let _ = inbound
                            .send(AgentMessage::transport_error(format!("WebSocket error: {}", e)))
                            .await;
                        break;
                    }
                }
                None => {
                    if let Err(e) = link.close().await {
                        tracing::debug!(error = %e, "Agent link close failed");
                    }
                    break;
                }
            },
            incoming = link.recv() => match incoming {
                Some(Ok(text)) => match protocol::decode_frame(&text) {
                    Ok(message) => {
                        tracing::debug!(tag = %message.tag, "Frame received");
                        if inbound.send(message).await.is_err() {
                            // Consumer gone
                            let _ = link.close().await;
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Malformed agent frame dropped");
                    }
                },
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Agent link failed");
                    state.store(CLOSED, Ordering::Release);
                    let _ = inbound
                        .send(AgentMessage::transport_error(format!("WebSocket error: {}", e)))
                        .await;
                    break;
                }
                None => {
                    tracing::info!(url = %redact(&url), "Agent closed the channel");
                    break;
                }
            },
        }
    }

    state.store(CLOSED, Ordering::Release);
}
