//! Error types for tool-server operations.

use thiserror::Error;

/// Result type for tool-server operations.
pub type Result<T> = std::result::Result<T, McpError>;

/// Error type for tool-server operations.
#[derive(Debug, Error)]
pub enum McpError {
    /// No session is open and no command target is known.
    #[error("not connected to the tool server")]
    NotConnected,

    /// A session could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The tool server reports no tool with the requested name.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// The tool server accepted the call but execution failed.
    #[error("tool execution failed: {0}")]
    ToolFailed(String),

    /// Failed to communicate with the tool server.
    #[error("transport error: {0}")]
    Transport(String),

    /// JSON-RPC protocol error.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned an error response.
    #[error("server error {code}: {message}")]
    ServerError {
        /// Error code from the server.
        code: i64,
        /// Error message from the server.
        message: String,
        /// Optional additional data.
        data: Option<serde_json::Value>,
    },

    /// The handshake has not been performed yet.
    #[error("session not initialized - call initialize() first")]
    NotInitialized,

    /// The event stream closed while a reply was pending.
    #[error("connection closed")]
    ConnectionClosed,

    /// Timeout waiting for a streamed reply.
    #[error("timeout waiting for response")]
    Timeout,
}

impl McpError {
    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a protocol error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a server error from an error response.
    pub fn server_error(
        code: i64,
        message: impl Into<String>,
        data: Option<serde_json::Value>,
    ) -> Self {
        Self::ServerError {
            code,
            message: message.into(),
            data,
        }
    }
}
