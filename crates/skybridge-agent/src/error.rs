//! Error types for the mission agent.

use thiserror::Error;

/// Result type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Error type for agent operations.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The tool server cannot be reached; the turn cannot proceed.
    #[error("tool server unavailable: {0}")]
    Unavailable(String),

    /// The model endpoint failed.
    #[error(transparent)]
    Llm(#[from] skybridge_llm::LlmError),
}
