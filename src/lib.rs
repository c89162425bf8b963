//! # a3s-review
//!
//! Human-in-the-loop review sessions with generation agents for the A3S ecosystem.
//!
//! ## Overview
//!
//! A generation agent (topics, MCQ quizzes, debug exercises, hands-on
//! projects, epics) proposes content over a bidirectional channel. A human
//! approves it, rejects it, or sends feedback, and the agent iterates until
//! it delivers final content. `a3s-review` runs that loop as a typed session
//! with a small state machine, independent of the transport underneath.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use a3s_review::{
//!     Decision, Endpoint, ReviewConfig, ReviewSession, SessionEvent, TopicList,
//!     WebSocketConnector,
//! };
//!
//! # async fn example() -> a3s_review::Result<()> {
//! let config = ReviewConfig::new("ws://localhost:8000", "http://localhost:8000");
//! let mut session: ReviewSession<TopicList> = ReviewSession::new(
//!     Arc::new(WebSocketConnector::new()),
//!     config,
//!     Endpoint::TopicGeneration,
//! );
//!
//! session.open(&serde_json::json!({"name": "Rust"})).await?;
//!
//! while let Some(event) = session.next_event().await {
//!     match event {
//!         SessionEvent::Review { iteration } => {
//!             println!("Proposal {}: {:?}", iteration, session.content());
//!             session.submit_decision(Decision::approve()).await?;
//!         }
//!         SessionEvent::Finalized => break,
//!         SessionEvent::Failed(reason) => {
//!             eprintln!("Review failed: {}", reason);
//!             break;
//!         }
//!         _ => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Transports
//!
//! - **websocket**: tokio-tungstenite client for `ws://` and `wss://` agents
//! - **memory**: in-process peer for tests and single-process use
//!
//! ## Architecture
//!
//! - **AgentChannel**: owns one live link; best-effort sends, normalized inbound messages
//! - **SessionState**: phase, iteration and content; no I/O
//! - **DecisionDispatcher**: phase guard and per-endpoint decision encoding
//! - **ReviewSession**: ties the three together and persists approved content
//! - **ArtifactStore**: one-shot store call for approved or finalized artifacts
//! - **WorkflowContext**: typed parameters and ids passed between workflow steps

pub mod config;
pub mod content;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod protocol;
pub mod session;
pub mod state;
pub mod store;
pub mod transport;
pub mod types;

// Re-export core types
pub use config::ReviewConfig;
pub use content::{
    ExerciseSet, HandsOnProject, McqQuestion, PersistPoint, ProjectBrief, Quiz, ReviewContent,
    SuggestedTopic, Topic, TopicList,
};
pub use context::{Level, TechStackRef, TopicRef, WorkflowContext, WorkflowStep};
pub use dispatcher::{DecisionDispatcher, Dispatch, IgnoreReason};
pub use error::{ReviewError, Result};
pub use protocol::{decode_frame, DecisionStyle, Dialect, Endpoint};
pub use session::{DecisionOutcome, ReviewSession, SessionEvent};
pub use state::{SessionSnapshot, SessionState, Transition};
pub use store::{
    ArtifactKind, ArtifactStore, HttpArtifactStore, MemoryArtifactStore, StoreReceipt,
    StoreRequest,
};
pub use transport::{AgentChannel, Connector, Inbound, Link, ReadyState};
pub use types::{
    AgentMessage, Decision, DecisionKind, FailureKind, FailureReason, MessageKind, MessageOrigin,
    Phase,
};

// Re-export transports for convenience
pub use transport::memory::{MemoryConnector, MemoryPeer};
pub use transport::websocket::WebSocketConnector;
