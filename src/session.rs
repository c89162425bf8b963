//! Review session: one agent conversation from parameters to final content
//!
//! `ReviewSession` owns the agent channel, the session state and the
//! decision dispatcher for one endpoint. The caller drives it by pulling
//! events with `next_event()` and answering reviews with
//! `submit_decision()`.

use crate::config::ReviewConfig;
use crate::content::{PersistPoint, ReviewContent};
use crate::context::WorkflowContext;
use crate::dispatcher::{DecisionDispatcher, Dispatch, IgnoreReason};
use crate::error::Result;
use crate::protocol::Endpoint;
use crate::state::{SessionSnapshot, SessionState, Transition};
use crate::store::{ArtifactStore, StoreReceipt};
use crate::transport::{AgentChannel, Connector, Inbound, ReadyState};
use crate::types::{Decision, DecisionKind, FailureKind, FailureReason, Phase};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio_stream::StreamExt;

/// Something the caller should react to
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A new proposal is ready for review
    Review { iteration: u64 },
    /// The agent delivered its final content
    Finalized,
    /// The session failed
    Failed(FailureReason),
    /// Progress notice from the agent
    Status(String),
    /// Unrecognized message, phase unchanged
    Ignored { tag: String },
    /// Message arrived when none was expected, phase unchanged
    Discarded { tag: String },
    /// Final content was stored
    Persisted(StoreReceipt),
    /// Storing the final content failed; the session stays finalized
    PersistFailed(String),
}

/// What happened to a submitted decision
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionOutcome {
    /// Not legal now or not expressible for this endpoint; nothing sent
    Ignored(IgnoreReason),
    /// The channel was not open; nothing sent, phase unchanged
    Dropped,
    /// Decision sent to the agent
    Sent,
    /// Approval sent and the approved content stored
    Persisted(StoreReceipt),
}

/// Human-in-the-loop review session with one generation agent
pub struct ReviewSession<T: ReviewContent> {
    endpoint: Endpoint,
    config: ReviewConfig,
    channel: AgentChannel,
    inbound: Option<Inbound>,
    state: SessionState<T>,
    dispatcher: DecisionDispatcher,
    store: Option<Arc<dyn ArtifactStore>>,
    context: WorkflowContext,
    pending: VecDeque<SessionEvent>,
}

impl<T: ReviewContent> ReviewSession<T> {
    /// Create an idle session for `endpoint`
    pub fn new(connector: Arc<dyn Connector>, config: ReviewConfig, endpoint: Endpoint) -> Self {
        let channel = AgentChannel::new(connector, config.channel_capacity);
        let dispatcher = DecisionDispatcher::new(endpoint.dialect());
        Self {
            endpoint,
            config,
            channel,
            inbound: None,
            state: SessionState::new(),
            dispatcher,
            store: None,
            context: WorkflowContext::default(),
            pending: VecDeque::new(),
        }
    }

    /// Store approved or finalized content through `store`
    pub fn with_store(mut self, store: Arc<dyn ArtifactStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Use `context` for initial parameters and store requests
    pub fn with_context(mut self, context: WorkflowContext) -> Self {
        self.context = context;
        self
    }

    /// Open a fresh session instance, sending `params` once connected
    ///
    /// Any previous instance is closed first and its late messages are
    /// never seen. Returns the new session id.
    pub async fn open(&mut self, params: &serde_json::Value) -> Result<String> {
        self.config.validate()?;
        let url = self.config.endpoint_url(&self.endpoint)?;

        self.inbound = None;
        self.pending.clear();
        let inbound = self.channel.open(&url, params)?;
        self.inbound = Some(inbound);

        let session_id = format!("rs-{}", uuid::Uuid::new_v4());
        self.state.begin(session_id.clone());

        tracing::info!(
            session_id = %session_id,
            endpoint = self.endpoint.name(),
            transport = self.channel.transport(),
            "Review session opened"
        );
        Ok(session_id)
    }

    /// Open with the initial parameters derived from the workflow context
    pub async fn open_from_context(&mut self) -> Result<String> {
        let params = self.context.initial_params(&self.endpoint)?;
        self.open(&params).await
    }

    /// Wait for the next event; `None` once the channel is gone
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }

        let inbound = self.inbound.as_mut()?;
        let next = inbound.next().await;
        match next {
            Some(message) => {
                let transition = self.state.apply(message);
                Some(self.on_transition(transition).await)
            }
            None => {
                self.inbound = None;
                self.channel.close();
                if self.state.phase().is_terminal() {
                    return None;
                }
                let reason = self
                    .state
                    .fail(FailureKind::Transport, "Agent closed the connection");
                Some(SessionEvent::Failed(reason))
            }
        }
    }

    async fn on_transition(&mut self, transition: Transition) -> SessionEvent {
        match transition {
            Transition::Reviewed { iteration } => SessionEvent::Review { iteration },
            Transition::Finalized => {
                self.finalize().await;
                SessionEvent::Finalized
            }
            Transition::Failed(reason) => {
                self.channel.close();
                SessionEvent::Failed(reason)
            }
            Transition::Status(text) => SessionEvent::Status(text),
            Transition::Ignored { tag } => SessionEvent::Ignored { tag },
            Transition::Discarded { tag } => SessionEvent::Discarded { tag },
        }
    }

    /// Answer the current proposal
    ///
    /// An approval the endpoint does not confirm finalizes the session at
    /// once: `Finalized` (and any store result) is queued for `next_event`.
    /// On approval, content persisted at approval time is stored after the
    /// frame is sent. A store failure is returned as the error; the phase
    /// is not rolled back and the approval is not resent.
    pub async fn submit_decision(&mut self, decision: Decision) -> Result<DecisionOutcome> {
        let frame = match self.dispatcher.dispatch(&self.state, &decision) {
            Dispatch::Frame(frame) => frame,
            Dispatch::Ignored(reason) => return Ok(DecisionOutcome::Ignored(reason)),
        };

        if !self.channel.send(&frame) {
            tracing::warn!(
                session_id = ?self.state.session_id(),
                decision = %decision.kind,
                ready_state = ?self.channel.ready_state(),
                "Decision dropped, channel not open"
            );
            return Ok(DecisionOutcome::Dropped);
        }

        let round_trip = self.dispatcher.dialect().approval_round_trip;
        self.state.record_decision(decision.kind, round_trip);
        self.state.take_feedback();

        tracing::info!(
            session_id = ?self.state.session_id(),
            iteration = self.state.iteration(),
            decision = %decision.kind,
            "Decision sent"
        );

        if self.state.phase() == Phase::Finalized {
            self.channel.close();
            self.pending.push_back(SessionEvent::Finalized);
            self.finalize().await;
        }

        if decision.kind == DecisionKind::Approve && T::PERSIST_AT == PersistPoint::OnApprove {
            if let Some(receipt) = self.persist().await? {
                return Ok(DecisionOutcome::Persisted(receipt));
            }
        }

        Ok(DecisionOutcome::Sent)
    }

    /// Pass finalized content on to the workflow context; content stored
    /// on final is persisted here and the result queued as an event
    async fn finalize(&mut self) {
        if let Some(content) = self.state.last_content() {
            content.update_context(&mut self.context);
        }
        if T::PERSIST_AT != PersistPoint::OnFinal {
            return;
        }

        match self.persist().await {
            Ok(Some(receipt)) => self.pending.push_back(SessionEvent::Persisted(receipt)),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    session_id = ?self.state.session_id(),
                    error = %e,
                    "Failed to store final content"
                );
                self.pending
                    .push_back(SessionEvent::PersistFailed(e.to_string()));
            }
        }
    }

    async fn persist(&mut self) -> Result<Option<StoreReceipt>> {
        let Some(store) = self.store.clone() else {
            return Ok(None);
        };
        let Some(content) = self.state.last_content() else {
            return Ok(None);
        };
        let Some(request) = content.store_request(&self.context)? else {
            return Ok(None);
        };

        let receipt = store.store(&request).await?;
        self.context.record(&receipt);
        tracing::info!(
            session_id = ?self.state.session_id(),
            kind = %receipt.kind,
            id = ?receipt.id,
            store = store.name(),
            "Reviewed content stored"
        );
        Ok(Some(receipt))
    }

    /// Attach feedback to the next decision
    pub fn set_feedback(&mut self, text: impl Into<String>) {
        self.state.set_feedback(text);
    }

    /// Close the channel; the phase is left as is
    pub fn close(&mut self) {
        self.inbound = None;
        self.pending.clear();
        self.channel.close();
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn state(&self) -> &SessionState<T> {
        &self.state
    }

    /// Latest proposal or final content
    pub fn content(&self) -> Option<&T> {
        self.state.last_content()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.snapshot()
    }

    pub fn ready_state(&self) -> ReadyState {
        self.channel.ready_state()
    }

    pub fn context(&self) -> &WorkflowContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut WorkflowContext {
        &mut self.context
    }

    /// Hand the context (with any generated ids) to the next step
    pub fn into_context(self) -> WorkflowContext {
        self.context
    }
}
