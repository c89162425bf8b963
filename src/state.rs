//! Review session state machine
//!
//! `SessionState` projects the inbound message sequence into a phase, an
//! iteration counter and the latest content, and records outgoing decisions.
//! It performs no I/O; `ReviewSession` feeds it.
//!
//! ```text
//! Idle ──begin──▶ AwaitingFirstResponse ──review──▶ AwaitingDecision
//!                   ▲   │                              │
//!                   │   └──final──▶ Finalized          │
//!                   └──────reject/feedback/refine/approve┘
//! any non-terminal ──error──▶ Failed
//! ```

use crate::types::{
    AgentMessage, DecisionKind, FailureKind, FailureReason, MessageKind, MessageOrigin, Phase,
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Result of applying one inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// New proposal awaiting a decision
    Reviewed { iteration: u64 },
    /// Final content received
    Finalized,
    /// Session failed
    Failed(FailureReason),
    /// Progress notice; phase unchanged
    Status(String),
    /// Unrecognized tag; phase unchanged
    Ignored { tag: String },
    /// Late or unexpected message for this instance; phase unchanged
    Discarded { tag: String },
}

/// State of one review session instance
#[derive(Debug)]
pub struct SessionState<T> {
    session_id: Option<String>,
    phase: Phase,
    iteration: u64,
    agent_iteration: Option<u64>,
    max_iterations: Option<u64>,
    last_content: Option<T>,
    last_status: Option<String>,
    pending_feedback: Option<String>,
    failure: Option<FailureReason>,
    approval_pending: bool,
    opened_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl<T> Default for SessionState<T> {
    fn default() -> Self {
        Self {
            session_id: None,
            phase: Phase::Idle,
            iteration: 0,
            agent_iteration: None,
            max_iterations: None,
            last_content: None,
            last_status: None,
            pending_feedback: None,
            failure: None,
            approval_pending: false,
            opened_at: None,
            updated_at: None,
        }
    }
}

impl<T: DeserializeOwned> SessionState<T> {
    /// Create an idle state
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh instance: everything is reset, phase is `AwaitingFirstResponse`
    pub fn begin(&mut self, session_id: impl Into<String>) {
        let now = Utc::now();
        *self = Self {
            session_id: Some(session_id.into()),
            phase: Phase::AwaitingFirstResponse,
            opened_at: Some(now),
            updated_at: Some(now),
            ..Self::default()
        };
    }

    /// Apply one inbound message
    pub fn apply(&mut self, message: AgentMessage) -> Transition {
        if self.phase == Phase::Idle || self.phase.is_terminal() {
            tracing::debug!(
                session_id = ?self.session_id,
                phase = ?self.phase,
                tag = %message.tag,
                "Message discarded"
            );
            return Transition::Discarded { tag: message.tag };
        }

        match message.kind {
            MessageKind::Error => {
                let kind = match message.origin {
                    MessageOrigin::Agent => FailureKind::Agent,
                    MessageOrigin::Transport => FailureKind::Transport,
                };
                Transition::Failed(self.fail(kind, message.error_text()))
            }
            MessageKind::Review => {
                let content = match serde_json::from_value::<T>(message.content) {
                    Ok(content) => content,
                    Err(e) => {
                        return Transition::Failed(self.fail(
                            FailureKind::Content,
                            format!("Malformed {} content: {}", message.tag, e),
                        ))
                    }
                };

                let floor = self.iteration + 1;
                self.iteration = message.iteration.map_or(floor, |n| n.max(floor));
                self.agent_iteration = message.iteration;
                if message.max_iterations.is_some() {
                    self.max_iterations = message.max_iterations;
                }
                self.last_content = Some(content);
                self.approval_pending = false;
                self.phase = Phase::AwaitingDecision;
                self.touch();

                tracing::debug!(
                    session_id = ?self.session_id,
                    iteration = self.iteration,
                    "Review received"
                );
                Transition::Reviewed {
                    iteration: self.iteration,
                }
            }
            MessageKind::Final => {
                // A final without content confirms the last proposal
                if !message.content.is_null() || self.last_content.is_none() {
                    match serde_json::from_value::<T>(message.content) {
                        Ok(content) => self.last_content = Some(content),
                        Err(e) => {
                            return Transition::Failed(self.fail(
                                FailureKind::Content,
                                format!("Malformed {} content: {}", message.tag, e),
                            ))
                        }
                    }
                }
                self.approval_pending = false;
                self.phase = Phase::Finalized;
                self.touch();

                tracing::info!(
                    session_id = ?self.session_id,
                    iteration = self.iteration,
                    "Session finalized"
                );
                Transition::Finalized
            }
            MessageKind::Status => {
                let text = match message.content {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Null => message.tag.clone(),
                    other => other.to_string(),
                };
                self.last_status = Some(text.clone());
                self.touch();
                Transition::Status(text)
            }
            MessageKind::Unknown(tag) => {
                tracing::warn!(
                    session_id = ?self.session_id,
                    tag = %tag,
                    "Unrecognized agent message ignored"
                );
                Transition::Ignored { tag }
            }
        }
    }
}

impl<T> SessionState<T> {
    /// Record an outgoing decision; returns false (and changes nothing)
    /// unless a decision is awaited
    ///
    /// `round_trip` says whether the agent confirms an approval with a
    /// `final` frame. Without it an approval finalizes immediately.
    pub fn record_decision(&mut self, kind: DecisionKind, round_trip: bool) -> bool {
        if self.phase != Phase::AwaitingDecision {
            return false;
        }

        match kind {
            DecisionKind::Approve if !round_trip => {
                self.phase = Phase::Finalized;
                self.approval_pending = false;
            }
            DecisionKind::Approve => {
                self.phase = Phase::AwaitingFirstResponse;
                self.approval_pending = true;
            }
            DecisionKind::Reject | DecisionKind::Feedback | DecisionKind::Refine => {
                self.phase = Phase::AwaitingFirstResponse;
                self.approval_pending = false;
            }
        }
        self.touch();
        true
    }

    /// Move to `Failed` unless already terminal
    pub fn fail(&mut self, kind: FailureKind, message: impl Into<String>) -> FailureReason {
        let reason = FailureReason::new(kind, message);
        if !self.phase.is_terminal() {
            tracing::warn!(
                session_id = ?self.session_id,
                failure = %reason,
                "Session failed"
            );
            self.phase = Phase::Failed;
            self.failure = Some(reason.clone());
            self.approval_pending = false;
            self.touch();
        }
        reason
    }

    /// Attach feedback text to the next outgoing decision
    pub fn set_feedback(&mut self, text: impl Into<String>) {
        self.pending_feedback = Some(text.into());
    }

    /// Take the pending feedback, clearing it
    pub fn take_feedback(&mut self) -> Option<String> {
        self.pending_feedback.take()
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of reviews received by this instance
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Iteration number the agent reported with the last review
    pub fn agent_iteration(&self) -> Option<u64> {
        self.agent_iteration
    }

    /// Iteration cap reported by the agent, if any
    pub fn max_iterations(&self) -> Option<u64> {
        self.max_iterations
    }

    /// Most recently received content
    pub fn last_content(&self) -> Option<&T> {
        self.last_content.as_ref()
    }

    pub fn last_status(&self) -> Option<&str> {
        self.last_status.as_deref()
    }

    pub fn pending_feedback(&self) -> Option<&str> {
        self.pending_feedback.as_deref()
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        self.failure.as_ref()
    }

    /// Whether an approval was sent and the agent's `final` is awaited
    pub fn approval_pending(&self) -> bool {
        self.approval_pending
    }

    /// Serializable view for the presentation layer
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            phase: self.phase,
            iteration: self.iteration,
            agent_iteration: self.agent_iteration,
            max_iterations: self.max_iterations,
            has_content: self.last_content.is_some(),
            last_status: self.last_status.clone(),
            pending_feedback: self.pending_feedback.clone(),
            failure: self.failure.clone(),
            approval_pending: self.approval_pending,
            opened_at: self.opened_at,
            updated_at: self.updated_at,
        }
    }
}

/// Point-in-time view of a session, without the content itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub phase: Phase,
    pub iteration: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_iteration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u64>,
    pub has_content: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
    pub approval_pending: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opened_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
