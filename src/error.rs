//! Error types for a3s-review

use thiserror::Error;

/// Errors that can occur while running a review session
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Agent endpoint could not be reached
    #[error("Connection error: {0}")]
    Connection(String),

    /// Established channel failed while sending or receiving
    #[error("Transport error: {0}")]
    Transport(String),

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Frame did not match the agent wire envelope
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Artifact store call failed
    #[error("Failed to persist {kind} artifact: {reason}")]
    Persistence {
        kind: String,
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workflow context is missing data an endpoint requires
    #[error("Workflow context error: {0}")]
    Context(String),

    /// Timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

/// Result type alias for review operations
pub type Result<T> = std::result::Result<T, ReviewError>;
