//! The SSE + JSON-RPC server surface.
//!
//! One session at a time: `GET /sse` announces the command endpoint and
//! then streams replies; a new stream replaces the previous session.
//! `POST /message` dispatches JSON-RPC, always answering `202 Accepted`
//! on the POST itself with the real reply delivered over the stream.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use skybridge_mcp::protocol::{JsonRpcError, JsonRpcResponse, MCP_PROTOCOL_VERSION};

use crate::tools::{catalog, ToolError, ToolExecutor};

/// Shared server state.
#[derive(Clone)]
pub struct ToolServerState {
    executor: Arc<ToolExecutor>,
    session: Arc<parking_lot::Mutex<Option<mpsc::UnboundedSender<Event>>>>,
}

impl ToolServerState {
    pub fn new(executor: Arc<ToolExecutor>) -> Self {
        Self {
            executor,
            session: Arc::new(parking_lot::Mutex::new(None)),
        }
    }
}

/// Build the tool server router.
pub fn router(state: ToolServerState) -> Router {
    Router::new()
        .route("/sse", get(sse_handler))
        .route("/message", post(message_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn sse_handler(
    State(state): State<ToolServerState>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::unbounded_channel();

    if state.session.lock().replace(tx.clone()).is_some() {
        info!("replacing previous session");
    } else {
        info!("session opened");
    }
    let _ = tx.send(Event::default().event("endpoint").data("/message"));

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (Ok(event), rx))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn message_handler(
    State(state): State<ToolServerState>,
    Json(body): Json<Value>,
) -> StatusCode {
    let Some(id) = body.get("id").and_then(Value::as_u64) else {
        // Notifications carry no id and get no reply.
        return StatusCode::ACCEPTED;
    };
    let method = body.get("method").and_then(Value::as_str).unwrap_or("");
    let params = body.get("params").cloned().unwrap_or(Value::Null);

    let reply = dispatch(&state, id, method, params).await;

    let session = state.session.lock().clone();
    match session {
        Some(tx) => match serde_json::to_string(&reply) {
            Ok(data) => {
                let _ = tx.send(Event::default().event("message").data(data));
            }
            Err(error) => warn!(%error, "failed to encode reply"),
        },
        None => warn!(id, method, "no open session to deliver reply"),
    }
    StatusCode::ACCEPTED
}

async fn dispatch(
    state: &ToolServerState,
    id: u64,
    method: &str,
    params: Value,
) -> JsonRpcResponse {
    match method {
        "initialize" => JsonRpcResponse::ok(
            id,
            json!({
                "protocolVersion": MCP_PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": {
                    "name": "skybridge-tools",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        ),
        "tools/list" => JsonRpcResponse::ok(id, json!({ "tools": catalog() })),
        "tools/call" => {
            let name = params.get("name").and_then(Value::as_str).unwrap_or("");
            let arguments = params.get("arguments").cloned().unwrap_or(json!({}));
            info!(tool = name, "tool call");

            match state.executor.execute(name, &arguments).await {
                Ok(text) => JsonRpcResponse::ok(
                    id,
                    json!({ "content": [{ "type": "text", "text": text }] }),
                ),
                Err(ToolError::Unknown(name)) => JsonRpcResponse::error(
                    id,
                    JsonRpcError::METHOD_NOT_FOUND,
                    format!("Unknown tool: {name}"),
                ),
                Err(error) => {
                    warn!(tool = name, %error, "tool call failed");
                    JsonRpcResponse::ok(
                        id,
                        json!({
                            "content": [{ "type": "text", "text": error.to_string() }],
                            "isError": true
                        }),
                    )
                }
            }
        }
        other => JsonRpcResponse::error(
            id,
            JsonRpcError::METHOD_NOT_FOUND,
            format!("Method not found: {other}"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::Geocoder;
    use url::Url;

    fn test_state() -> ToolServerState {
        let executor = ToolExecutor::new(
            Url::parse("http://127.0.0.1:9/").unwrap(),
            Geocoder::new().unwrap(),
        )
        .unwrap();
        ToolServerState::new(Arc::new(executor))
    }

    #[tokio::test]
    async fn test_initialize_reply() {
        let state = test_state();
        let reply = dispatch(&state, 1, "initialize", Value::Null).await;
        assert!(!reply.is_error());
        let result = reply.into_result().unwrap();
        assert_eq!(result["serverInfo"]["name"], "skybridge-tools");
        assert_eq!(result["protocolVersion"], MCP_PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn test_tools_list_reply() {
        let state = test_state();
        let reply = dispatch(&state, 2, "tools/list", Value::Null).await;
        let result = reply.into_result().unwrap();
        assert_eq!(result["tools"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_method_not_found() {
        let state = test_state();
        let reply = dispatch(
            &state,
            3,
            "tools/call",
            json!({ "name": "teleport", "arguments": {} }),
        )
        .await;
        let error = reply.into_result().unwrap_err();
        assert_eq!(error.code, JsonRpcError::METHOD_NOT_FOUND);
        assert!(error.message.contains("Unknown tool: teleport"));
    }

    #[tokio::test]
    async fn test_tool_failure_is_error_result() {
        let state = test_state();
        // The mission API at port 9 is unreachable, so the call fails.
        let reply = dispatch(
            &state,
            4,
            "tools/call",
            json!({ "name": "change_speed", "arguments": { "speed_kts": 250 } }),
        )
        .await;
        let result = reply.into_result().unwrap();
        assert_eq!(result["isError"], true);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let state = test_state();
        let reply = dispatch(&state, 5, "resources/list", Value::Null).await;
        assert_eq!(
            reply.into_result().unwrap_err().code,
            JsonRpcError::METHOD_NOT_FOUND
        );
    }
}
