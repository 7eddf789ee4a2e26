//! Chat endpoint: one user command per request.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, ServerError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// `POST /api/chat` runs one agent turn and returns the reply.
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ServerError::BadRequest("message must not be empty".into()));
    }

    info!(chars = message.len(), "chat command received");
    let reply = state.agent.handle_command(message).await?;
    Ok(Json(ChatResponse { reply }))
}
