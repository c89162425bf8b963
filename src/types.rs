//! Core types for agent review sessions
//!
//! Inbound agent messages, outbound human decisions, and the session phase.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized tag of an inbound agent message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    /// Agent proposes content for human review
    Review,
    /// Agent delivers the terminal content
    Final,
    /// Agent (or the transport) reports a failure
    Error,
    /// Progress notice with no effect on the phase
    Status,
    /// Tag this client does not understand
    Unknown(String),
}

impl MessageKind {
    /// Classify a raw wire tag
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "review" | "srs_review" | "brd_review" => MessageKind::Review,
            "final" | "final_id" => MessageKind::Final,
            "error" => MessageKind::Error,
            "status" | "accepted" | "project_generated" => MessageKind::Status,
            other => MessageKind::Unknown(other.to_string()),
        }
    }
}

/// Where an inbound message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOrigin {
    /// Sent by the agent over the channel
    Agent,
    /// Synthesized locally from a channel failure
    Transport,
}

/// A normalized inbound message
#[derive(Debug, Clone)]
pub struct AgentMessage {
    /// Normalized kind
    pub kind: MessageKind,

    /// Raw wire tag as sent (e.g. "srs_review")
    pub tag: String,

    /// Message payload: arbitrary JSON
    pub content: serde_json::Value,

    /// Iteration number reported by the agent, if any
    pub iteration: Option<u64>,

    /// Iteration cap reported by the agent, if any
    pub max_iterations: Option<u64>,

    /// Agent-sent or transport-synthesized
    pub origin: MessageOrigin,
}

impl AgentMessage {
    /// Build an agent message from a raw tag and content
    pub fn new(tag: impl Into<String>, content: serde_json::Value) -> Self {
        let tag = tag.into();
        Self {
            kind: MessageKind::from_tag(&tag),
            tag,
            content,
            iteration: None,
            max_iterations: None,
            origin: MessageOrigin::Agent,
        }
    }

    /// Synthesize an error message for a channel failure
    pub fn transport_error(reason: impl Into<String>) -> Self {
        Self {
            origin: MessageOrigin::Transport,
            ..Self::new("error", serde_json::Value::String(reason.into()))
        }
    }

    /// Set the agent-reported iteration
    pub fn with_iteration(mut self, iteration: u64) -> Self {
        self.iteration = Some(iteration);
        self
    }

    /// Error text carried by an error message
    ///
    /// String content is returned verbatim; other shapes are rendered as JSON.
    pub fn error_text(&self) -> String {
        match &self.content {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => "Unknown error".to_string(),
            other => other.to_string(),
        }
    }
}

/// Canonical decision vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionKind {
    /// Accept the proposed content
    Approve,
    /// Discard and regenerate from scratch
    Reject,
    /// Revise using the attached feedback
    Feedback,
    /// Ask the agent to improve the content
    Refine,
}

impl DecisionKind {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::Approve => "approve",
            DecisionKind::Reject => "reject",
            DecisionKind::Feedback => "feedback",
            DecisionKind::Refine => "refine",
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A human decision on the current proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// What the reviewer decided
    pub kind: DecisionKind,

    /// Free-text feedback; empty strings are forwarded as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,

    /// Items picked by the reviewer (debug-gen final topics)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selection: Vec<String>,
}

impl Decision {
    /// Create a decision of the given kind without feedback
    pub fn new(kind: DecisionKind) -> Self {
        Self {
            kind,
            feedback: None,
            selection: Vec::new(),
        }
    }

    pub fn approve() -> Self {
        Self::new(DecisionKind::Approve)
    }

    pub fn reject() -> Self {
        Self::new(DecisionKind::Reject)
    }

    pub fn feedback(text: impl Into<String>) -> Self {
        Self::new(DecisionKind::Feedback).with_feedback(text)
    }

    pub fn refine(text: impl Into<String>) -> Self {
        Self::new(DecisionKind::Refine).with_feedback(text)
    }

    /// Regenerate one item (e.g. `question3`) with a reviewer comment
    ///
    /// Encoded as `Question ID: <key> | Feedback: <comment>`. A blank
    /// comment falls back to [`Decision::refine_item`].
    pub fn feedback_on(key: &str, comment: &str) -> Self {
        if comment.trim().is_empty() {
            return Self::refine_item(key);
        }
        Self::feedback(format!("Question ID: {} | Feedback: {}", key, comment))
    }

    /// Regenerate one item without a comment: `Question ID: <key>`
    pub fn refine_item(key: &str) -> Self {
        Self::refine(format!("Question ID: {}", key))
    }

    /// Attach feedback text
    pub fn with_feedback(mut self, text: impl Into<String>) -> Self {
        self.feedback = Some(text.into());
        self
    }

    /// Attach selected items
    pub fn with_selection<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection = items.into_iter().map(Into::into).collect();
        self
    }
}

/// Lifecycle phase of a review session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Not opened yet
    #[default]
    Idle,
    /// Parameters (or a decision) sent, waiting for the agent
    AwaitingFirstResponse,
    /// A proposal is on screen, waiting for the human
    AwaitingDecision,
    /// Terminal: final content received
    Finalized,
    /// Terminal: agent or transport failure
    Failed,
}

impl Phase {
    /// Whether no further transitions can happen for this instance
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Finalized | Phase::Failed)
    }
}

/// Category of a session failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// The agent sent an `error` message
    Agent,
    /// The channel errored or closed unexpectedly
    Transport,
    /// The agent's content did not match the expected shape
    Content,
}

/// Why a session failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureReason {
    pub kind: FailureKind,
    pub message: String,
}

impl FailureReason {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}
