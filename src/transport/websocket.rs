//! WebSocket transport backed by tokio-tungstenite

use super::{redact, Connector, Link};
use crate::error::{ReviewError, Result};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Connector opening `ws://` / `wss://` links to agent endpoints
#[derive(Debug, Clone, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Link>> {
        let (stream, response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| ReviewError::Connection(format!("{}: {}", redact(url), e)))?;

        tracing::debug!(
            url = %redact(url),
            status = %response.status(),
            "WebSocket handshake complete"
        );

        Ok(Box::new(WebSocketLink { stream }))
    }

    fn name(&self) -> &str {
        "websocket"
    }
}

struct WebSocketLink {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Link for WebSocketLink {
    async fn send(&mut self, frame: String) -> Result<()> {
        self.stream
            .send(Message::Text(frame))
            .await
            .map_err(|e| ReviewError::Transport(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => {
                        tracing::warn!("Non-UTF-8 binary frame dropped");
                    }
                },
                Ok(Message::Close(frame)) => {
                    tracing::debug!(frame = ?frame, "WebSocket close frame received");
                    return None;
                }
                // Ping replies are queued by tungstenite itself
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
                Err(e) => return Some(Err(ReviewError::Transport(e.to_string()))),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.stream
            .close(None)
            .await
            .map_err(|e| ReviewError::Transport(e.to_string()))
    }
}
