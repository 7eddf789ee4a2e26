//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use skybridge_agent::AgentError;

/// Result type for HTTP handlers.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error type for HTTP handlers.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Invalid request payload.
    #[error("{0}")]
    BadRequest(String),

    /// The tool server cannot be reached.
    #[error("{0}")]
    Unavailable(String),

    /// The model endpoint failed.
    #[error("{0}")]
    Upstream(String),

    /// Anything else.
    #[error("{0}")]
    Internal(String),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<AgentError> for ServerError {
    fn from(e: AgentError) -> Self {
        match e {
            AgentError::Unavailable(msg) => Self::Unavailable(msg),
            AgentError::Llm(inner) => Self::Upstream(inner.to_string()),
        }
    }
}
