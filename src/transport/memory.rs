//! In-memory transport for tests and single-process use
//!
//! `MemoryConnector` hands every accepted link to the test as a
//! `MemoryPeer`, which plays the agent side of the conversation.

use super::{redact, Connector, Link};
use crate::error::{ReviewError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Connector that pairs each link with an in-process `MemoryPeer`
#[derive(Clone)]
pub struct MemoryConnector {
    inner: Arc<Inner>,
}

struct Inner {
    refuse: bool,
    peers_tx: mpsc::UnboundedSender<MemoryPeer>,
    peers_rx: Mutex<mpsc::UnboundedReceiver<MemoryPeer>>,
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryConnector {
    /// Create a connector that accepts every connection
    pub fn new() -> Self {
        Self::build(false)
    }

    /// Create a connector whose connections always fail
    pub fn refusing() -> Self {
        Self::build(true)
    }

    fn build(refuse: bool) -> Self {
        let (peers_tx, peers_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Inner {
                refuse,
                peers_tx,
                peers_rx: Mutex::new(peers_rx),
            }),
        }
    }

    /// Wait for the next connection and return its agent-side peer
    pub async fn accept(&self) -> Option<MemoryPeer> {
        self.inner.peers_rx.lock().await.recv().await
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Link>> {
        if self.inner.refuse {
            return Err(ReviewError::Connection(format!("{}: connection refused", redact(url))));
        }

        let (to_peer, from_client) = mpsc::unbounded_channel();
        let (to_client, from_peer) = mpsc::unbounded_channel();

        let peer = MemoryPeer {
            url: url.to_string(),
            from_client,
            to_client: Some(to_client),
        };
        self.inner
            .peers_tx
            .send(peer)
            .map_err(|_| ReviewError::Connection(format!("{}: no acceptor", redact(url))))?;

        Ok(Box::new(MemoryLink {
            to_peer: Some(to_peer),
            from_peer,
        }))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

struct MemoryLink {
    to_peer: Option<mpsc::UnboundedSender<String>>,
    from_peer: mpsc::UnboundedReceiver<std::result::Result<String, String>>,
}

#[async_trait]
impl Link for MemoryLink {
    async fn send(&mut self, frame: String) -> Result<()> {
        let tx = self
            .to_peer
            .as_ref()
            .ok_or_else(|| ReviewError::Transport("link closed".to_string()))?;
        tx.send(frame)
            .map_err(|_| ReviewError::Transport("peer closed".to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String>> {
        match self.from_peer.recv().await? {
            Ok(text) => Some(Ok(text)),
            Err(reason) => Some(Err(ReviewError::Transport(reason))),
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.to_peer = None;
        Ok(())
    }
}

/// Agent side of an in-memory link
pub struct MemoryPeer {
    url: String,
    from_client: mpsc::UnboundedReceiver<String>,
    to_client: Option<mpsc::UnboundedSender<std::result::Result<String, String>>>,
}

impl MemoryPeer {
    /// URL the client connected to
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Next frame sent by the client; `None` once the client closed
    pub async fn recv_text(&mut self) -> Option<String> {
        self.from_client.recv().await
    }

    /// Next frame sent by the client, parsed as JSON
    pub async fn recv_json(&mut self) -> Option<serde_json::Value> {
        let text = self.recv_text().await?;
        serde_json::from_str(&text).ok()
    }

    /// A frame already delivered by the client, without waiting
    pub fn try_recv_json(&mut self) -> Option<serde_json::Value> {
        let text = self.from_client.try_recv().ok()?;
        serde_json::from_str(&text).ok()
    }

    /// Send a raw text frame to the client
    pub fn send_text(&self, text: &str) {
        if let Some(tx) = &self.to_client {
            let _ = tx.send(Ok(text.to_string()));
        }
    }

    /// Send a JSON frame to the client
    pub fn send_json(&self, value: &serde_json::Value) {
        self.send_text(&value.to_string());
    }

    /// Make the client's link fail with the given reason
    pub fn fail(&mut self, reason: &str) {
        if let Some(tx) = self.to_client.take() {
            let _ = tx.send(Err(reason.to_string()));
        }
    }

    /// Close the agent side of the link
    pub fn close(&mut self) {
        self.to_client = None;
    }
}
