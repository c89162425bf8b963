//! Decision dispatch
//!
//! Turns a human decision into the frame the endpoint expects, after
//! checking it is legal for the current phase and expressible in the
//! endpoint's dialect.

use crate::protocol::Dialect;
use crate::state::SessionState;
use crate::types::{Decision, Phase};
use serde_json::Value;
use std::fmt;

/// Why a decision produced no frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// No proposal is awaiting a decision
    NotAwaitingDecision(Phase),
    /// The endpoint cannot express this decision kind
    Unsupported,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::NotAwaitingDecision(phase) => {
                write!(f, "no decision awaited in phase {:?}", phase)
            }
            IgnoreReason::Unsupported => f.write_str("decision not supported by endpoint"),
        }
    }
}

/// Outcome of dispatching one decision
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Frame to send to the agent
    Frame(Value),
    /// Nothing to send
    Ignored(IgnoreReason),
}

/// Encodes decisions for one endpoint dialect
#[derive(Debug, Clone, Copy)]
pub struct DecisionDispatcher {
    dialect: Dialect,
}

impl DecisionDispatcher {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Build the outgoing frame for `decision`
    ///
    /// Feedback comes from the decision itself, falling back to the
    /// session's pending feedback. Empty text is forwarded as-is. The state
    /// is not modified.
    pub fn dispatch<T>(&self, state: &SessionState<T>, decision: &Decision) -> Dispatch {
        let phase = state.phase();
        if phase != Phase::AwaitingDecision {
            tracing::debug!(
                session_id = ?state.session_id(),
                phase = ?phase,
                decision = %decision.kind,
                "Decision ignored"
            );
            return Dispatch::Ignored(IgnoreReason::NotAwaitingDecision(phase));
        }

        let feedback = decision
            .feedback
            .as_deref()
            .or_else(|| state.pending_feedback());

        match self
            .dialect
            .encode(decision.kind, feedback, &decision.selection)
        {
            Some(frame) => Dispatch::Frame(frame),
            None => {
                tracing::debug!(
                    session_id = ?state.session_id(),
                    decision = %decision.kind,
                    style = ?self.dialect.style,
                    "Decision not expressible for endpoint"
                );
                Dispatch::Ignored(IgnoreReason::Unsupported)
            }
        }
    }
}
