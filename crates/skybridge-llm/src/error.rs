//! Error types for language model operations.

use thiserror::Error;

/// Result type for language model operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Error type for language model operations.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Configuration error (missing API key, bad URL).
    #[error("configuration error: {0}")]
    Config(String),

    /// Network error reaching the model endpoint.
    #[error("network error: {0}")]
    Network(String),

    /// The model endpoint answered with a non-success status.
    #[error("model endpoint returned {status}: {message}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Response body or status text.
        message: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend-specific error.
    #[error("backend error: {0}")]
    Backend(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

impl LlmError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}
