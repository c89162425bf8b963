//! Artifact persistence: the one-shot store call after a review
//!
//! Approved or finalized artifacts (topics, quizzes, debug exercises,
//! hands-on projects) are stored through the platform API. The call is
//! separate from the agent channel: its failure never changes the session
//! phase, and it is never retried automatically.

use crate::config::ReviewConfig;
use crate::error::{ReviewError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Kind of artifact being stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArtifactKind {
    /// Approved topic list of a tech stack
    Topics,
    /// Approved MCQ quiz
    Quiz,
    /// Approved debug exercises
    DebugExercise,
    /// Generated hands-on project
    HandsOn,
}

impl ArtifactKind {
    /// API path of the store endpoint
    pub fn path(&self) -> &'static str {
        match self {
            ArtifactKind::Topics => "/topics/save-selected",
            ArtifactKind::Quiz => "/mcq/store",
            ArtifactKind::DebugExercise => "/debug-exercise/store",
            ArtifactKind::HandsOn => "/handson/store",
        }
    }

    /// Response field carrying the generated identifier
    pub fn id_field(&self) -> Option<&'static str> {
        match self {
            ArtifactKind::Topics => None,
            ArtifactKind::Quiz => Some("quiz_id"),
            ArtifactKind::DebugExercise => Some("exercise_id"),
            ArtifactKind::HandsOn => Some("handson_id"),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::Topics => "topics",
            ArtifactKind::Quiz => "quiz",
            ArtifactKind::DebugExercise => "debug exercise",
            ArtifactKind::HandsOn => "hands-on",
        };
        f.write_str(name)
    }
}

/// One store call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreRequest {
    pub kind: ArtifactKind,
    /// JSON body as the store endpoint expects it
    pub body: serde_json::Value,
}

impl StoreRequest {
    pub fn new(kind: ArtifactKind, body: serde_json::Value) -> Self {
        Self { kind, body }
    }
}

/// Result of a successful store call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreReceipt {
    pub kind: ArtifactKind,
    /// Generated identifier, when the endpoint returns one
    pub id: Option<String>,
    /// Full response body
    pub body: serde_json::Value,
}

impl StoreReceipt {
    /// Build a receipt from a response body, extracting the id field
    pub fn from_body(kind: ArtifactKind, body: serde_json::Value) -> Self {
        let id = kind
            .id_field()
            .and_then(|field| body.get(field))
            .and_then(|value| match value {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            });
        Self { kind, id, body }
    }
}

/// Backend that persists reviewed artifacts
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist one artifact
    async fn store(&self, request: &StoreRequest) -> Result<StoreReceipt>;

    /// Store name (e.g., "http", "memory")
    fn name(&self) -> &str;
}

/// Artifact store calling the platform HTTP API
pub struct HttpArtifactStore {
    client: reqwest::Client,
    config: ReviewConfig,
}

impl HttpArtifactStore {
    /// Create a store for the API address, token and timeout in `config`
    pub fn new(config: &ReviewConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config: config.clone(),
        }
    }

    fn persistence_error(kind: ArtifactKind, reason: impl Into<String>) -> ReviewError {
        ReviewError::Persistence {
            kind: kind.to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ArtifactStore for HttpArtifactStore {
    async fn store(&self, request: &StoreRequest) -> Result<StoreReceipt> {
        let url = self.config.api_endpoint(request.kind.path());

        let mut builder = self.client.post(&url).json(&request.body);
        if let Some(token) = &self.config.token {
            builder = builder.bearer_auth(token);
        }
        if let Some(timeout) = self.config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ReviewError::Timeout(format!("store {} at {}", request.kind, url))
            } else {
                Self::persistence_error(request.kind, e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::persistence_error(
                request.kind,
                format!("{} {}", status, body),
            ));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            Self::persistence_error(request.kind, format!("invalid response: {}", e))
        })?;

        let receipt = StoreReceipt::from_body(request.kind, body);
        tracing::info!(
            kind = %request.kind,
            id = ?receipt.id,
            "Artifact stored"
        );
        Ok(receipt)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// In-memory artifact store for testing
///
/// Records every request and hands out sequential ids.
#[derive(Default)]
pub struct MemoryArtifactStore {
    records: RwLock<Vec<StoreRequest>>,
    next_id: AtomicU64,
    fail_with: Option<String>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails with the given reason
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            fail_with: Some(reason.into()),
            ..Self::default()
        }
    }

    /// All requests stored so far
    pub fn records(&self) -> Vec<StoreRequest> {
        self.records
            .read()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn store(&self, request: &StoreRequest) -> Result<StoreReceipt> {
        if let Some(reason) = &self.fail_with {
            return Err(ReviewError::Persistence {
                kind: request.kind.to_string(),
                reason: reason.clone(),
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.records
            .write()
            .map_err(|e| ReviewError::Persistence {
                kind: request.kind.to_string(),
                reason: format!("Failed to acquire store lock: {}", e),
            })?
            .push(request.clone());

        let mut body = serde_json::json!({ "success": true });
        if let Some(field) = request.kind.id_field() {
            body[field] = serde_json::json!(id);
        }
        Ok(StoreReceipt::from_body(request.kind, body))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
