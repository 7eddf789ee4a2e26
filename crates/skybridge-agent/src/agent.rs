//! The mission agent: one tool-calling turn per user command.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use skybridge_llm::{
    Content, FunctionDeclaration, GenerateRequest, Role, SharedBackend,
};

use crate::broker::ToolBroker;
use crate::error::{AgentError, Result};

/// Reply used when the model produces neither a call nor any text.
const NO_RESPONSE_REPLY: &str = "I couldn't generate a response. Please try again.";

/// Reply used when the follow-up turn carries no text.
const ACK_REPLY: &str = "Request processed.";

/// Orchestrates one user command through the model and the tool server.
///
/// A turn makes at most one tool invocation: the first function-call part
/// of the model's proposal wins, its outcome is folded into a follow-up
/// turn, and the follow-up's text is the reply. Tool execution errors are
/// reported to the model as result text, never propagated; only an
/// unreachable tool server fails the turn.
pub struct MissionAgent {
    backend: SharedBackend,
    broker: Arc<dyn ToolBroker>,
}

impl MissionAgent {
    /// Create an agent over the given backend and tool broker.
    pub fn new(backend: SharedBackend, broker: Arc<dyn ToolBroker>) -> Self {
        Self { backend, broker }
    }

    /// Handle one user command and return the reply text.
    pub async fn handle_command(&self, message: &str) -> Result<String> {
        self.broker
            .connect()
            .await
            .map_err(|e| AgentError::Unavailable(e.to_string()))?;

        // Fresh catalog every turn; the server may have changed it.
        let tools = self
            .broker
            .list_tools()
            .await
            .map_err(|e| AgentError::Unavailable(e.to_string()))?;
        let declarations: Vec<FunctionDeclaration> = tools
            .into_iter()
            .map(|t| FunctionDeclaration {
                name: t.name,
                description: t.description,
                parameters: t.parameters,
            })
            .collect();
        debug!(tools = declarations.len(), "proposing turn");

        let user_turn = Content::user(message);
        let request = GenerateRequest::new(vec![user_turn.clone()])
            .with_tools(declarations.clone());
        let response = self.backend.generate(request).await?;

        // First function-call part wins.
        let directive = response
            .parts()
            .iter()
            .find_map(|p| p.function_call.clone().map(|call| (p.clone(), call)));

        let Some((model_part, call)) = directive else {
            return Ok(response
                .first_text()
                .map(str::to_string)
                .unwrap_or_else(|| NO_RESPONSE_REPLY.to_string()));
        };

        info!(tool = %call.name, "model requested tool invocation");
        let outcome = match self.broker.call_tool(&call.name, call.args.clone()).await {
            Ok(text) => text,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "tool invocation failed");
                format!("Tool execution error: {e}")
            }
        };

        // The follow-up replays the model's part exactly as received.
        let follow_up = GenerateRequest::new(vec![
            user_turn,
            Content {
                role: Role::Model,
                parts: vec![model_part],
            },
            Content::function_response(&call.name, json!({ "result": outcome })),
        ])
        .with_tools(declarations);

        let final_response = self.backend.generate(follow_up).await?;
        Ok(final_response
            .first_text()
            .map(str::to_string)
            .unwrap_or_else(|| ACK_REPLY.to_string()))
    }
}
