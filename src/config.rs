//! Client configuration for agent review sessions
//!
//! Configuration is built programmatically via `ReviewConfig::new()` plus
//! builder methods, loaded from a JSON file, and optionally overridden from
//! the environment:
//!
//! - `A3S_REVIEW_WEBSOCKET_URL`: base address of the agent websocket server
//! - `A3S_REVIEW_API_URL`: base address of the HTTP API (artifact store)
//! - `A3S_REVIEW_TOKEN`: bearer token passed to agents and the API

use crate::error::{ReviewError, Result};
use crate::protocol::Endpoint;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const ENV_WEBSOCKET_URL: &str = "A3S_REVIEW_WEBSOCKET_URL";
pub const ENV_API_URL: &str = "A3S_REVIEW_API_URL";
pub const ENV_TOKEN: &str = "A3S_REVIEW_TOKEN";

/// Review client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewConfig {
    /// Base websocket address (e.g. `wss://agents.example.com`)
    #[serde(default = "default_websocket_url")]
    pub websocket_url: String,

    /// Base HTTP API address used by the artifact store
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Bearer token; sent as `?token=` to agents and as `Authorization` to the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Bound of the inbound and outbound frame queues per channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Timeout for the one-shot artifact store request (seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

fn default_websocket_url() -> String {
    "ws://localhost:8000".to_string()
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_channel_capacity() -> usize {
    64
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            websocket_url: default_websocket_url(),
            api_url: default_api_url(),
            token: None,
            channel_capacity: default_channel_capacity(),
            request_timeout_secs: None,
        }
    }
}

impl ReviewConfig {
    /// Create a configuration for the given websocket and API base addresses
    pub fn new(websocket_url: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            websocket_url: websocket_url.into(),
            api_url: api_url.into(),
            ..Default::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    /// Store request timeout as a `Duration`
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ReviewError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: ReviewConfig = serde_json::from_str(&json).map_err(|e| {
            ReviewError::Config(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::debug!(path = %path.display(), "Review config loaded");
        Ok(config)
    }

    /// Override fields from `A3S_REVIEW_*` environment variables
    pub fn apply_env(self) -> Self {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_WEBSOCKET_URL).filter(|v| !v.is_empty()) {
            self.websocket_url = url;
        }
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.api_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.is_empty()) {
            self.token = Some(token);
        }
        self
    }

    /// Check addresses and limits
    pub fn validate(&self) -> Result<()> {
        let ws = parse_base(&self.websocket_url, "websocketUrl")?;
        if !matches!(ws.scheme(), "ws" | "wss") {
            return Err(ReviewError::Config(format!(
                "websocketUrl must use ws:// or wss://, got '{}'",
                self.websocket_url
            )));
        }

        let api = parse_base(&self.api_url, "apiUrl")?;
        if !matches!(api.scheme(), "http" | "https") {
            return Err(ReviewError::Config(format!(
                "apiUrl must use http:// or https://, got '{}'",
                self.api_url
            )));
        }

        if self.channel_capacity == 0 {
            return Err(ReviewError::Config(
                "channelCapacity must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Full websocket URL for an agent endpoint, with the token query if configured
    pub fn endpoint_url(&self, endpoint: &Endpoint) -> Result<String> {
        let joined = format!(
            "{}{}",
            self.websocket_url.trim_end_matches('/'),
            endpoint.path()
        );
        let mut url = parse_base(&joined, "websocketUrl")?;
        if let Some(token) = &self.token {
            url.query_pairs_mut().append_pair("token", token);
        }
        Ok(url.to_string())
    }

    /// Full HTTP URL for an API path
    pub fn api_endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), path)
    }
}

fn parse_base(value: &str, field: &str) -> Result<Url> {
    Url::parse(value)
        .map_err(|e| ReviewError::Config(format!("Invalid {} '{}': {}", field, value, e)))
}
