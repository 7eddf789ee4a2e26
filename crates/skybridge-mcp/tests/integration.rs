//! Integration tests against an in-process mock tool server.
//!
//! The mock implements the server side of the SSE dialect: `GET /sse`
//! announces the command endpoint then streams JSON-RPC replies, and
//! `POST /message` dispatches requests, answering over the stream with
//! a `202 Accepted` on the POST itself.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use url::Url;

use skybridge_mcp::{ConnectionState, McpClient, McpClientConfig, McpError, McpManager};

#[derive(Default)]
struct MockInner {
    session: Option<mpsc::UnboundedSender<Event>>,
    sse_connections: usize,
    alt_posts: usize,
    calls: Vec<(String, Value)>,
}

type MockState = Arc<parking_lot::Mutex<MockInner>>;

async fn sse_handler(
    State(state): State<MockState>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::unbounded_channel();
    {
        let mut inner = state.lock();
        inner.sse_connections += 1;
        inner.session = Some(tx.clone());
    }
    let _ = tx.send(Event::default().event("endpoint").data("/message"));

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|event| (Ok(event), rx))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn message_handler(
    State(state): State<MockState>,
    Json(body): Json<Value>,
) -> StatusCode {
    let Some(id) = body.get("id").and_then(Value::as_u64) else {
        // Notification; nothing to answer.
        return StatusCode::ACCEPTED;
    };
    let method = body.get("method").and_then(Value::as_str).unwrap_or("");

    // The "vanish" tool drops the stream without replying, leaving the
    // caller's request pending.
    if method == "tools/call"
        && body.pointer("/params/name").and_then(Value::as_str) == Some("vanish")
    {
        state.lock().session = None;
        return StatusCode::ACCEPTED;
    }

    let reply = match method {
        "initialize" => json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": {
                "protocolVersion": "2024-11-05",
                "capabilities": { "tools": {} },
                "serverInfo": { "name": "mock-tools", "version": "0.1.0" }
            }
        }),
        "tools/list" => json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": {
                "tools": [
                    {
                        "name": "echo",
                        "description": "Echo the input back",
                        "inputSchema": {
                            "$schema": "http://json-schema.org/draft-07/schema#",
                            "type": "object",
                            "additionalProperties": false,
                            "properties": { "text": { "type": "string" } }
                        }
                    },
                    {
                        "name": "none",
                        "description": "Returns no content",
                        "inputSchema": { "type": "object", "properties": {} }
                    },
                    {
                        "name": "fail",
                        "description": "Always fails",
                        "inputSchema": { "type": "object", "properties": {} }
                    },
                    { "name": "calibrate", "description": "No schema advertised" }
                ]
            }
        }),
        "tools/call" => {
            let params = body.get("params").cloned().unwrap_or(Value::Null);
            let name = params.get("name").and_then(Value::as_str).unwrap_or("");
            let arguments = params.get("arguments").cloned().unwrap_or(json!({}));
            state.lock().calls.push((name.to_string(), arguments.clone()));
            match name {
                "echo" => {
                    let text = arguments.get("text").and_then(Value::as_str).unwrap_or("");
                    json!({
                        "jsonrpc": "2.0",
                        "id": id,
                        "result": { "content": [{ "type": "text", "text": text }] }
                    })
                }
                "none" => json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": { "content": [] }
                }),
                "fail" => json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "result": {
                        "content": [{ "type": "text", "text": "actuator offline" }],
                        "isError": true
                    }
                }),
                other => json!({
                    "jsonrpc": "2.0",
                    "id": id,
                    "error": {
                        "code": -32602,
                        "message": format!("Unknown tool: {other}")
                    }
                }),
            }
        }
        other => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32601, "message": format!("Method not found: {other}") }
        }),
    };

    let session = state.lock().session.clone();
    if let Some(tx) = session {
        let _ = tx.send(Event::default().event("message").data(reply.to_string()));
    }
    StatusCode::ACCEPTED
}

/// Same dispatch, reached only after a re-announcement.
async fn alt_message_handler(
    State(state): State<MockState>,
    Json(body): Json<Value>,
) -> StatusCode {
    state.lock().alt_posts += 1;
    message_handler(State(state), Json(body)).await
}

/// Spawn the mock server on an ephemeral port; returns its stream URL.
async fn spawn_mock() -> (Url, MockState) {
    let state: MockState = Arc::new(parking_lot::Mutex::new(MockInner::default()));
    let app = Router::new()
        .route("/sse", get(sse_handler))
        .route("/message", post(message_handler))
        .route("/message2", post(alt_message_handler))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let url = Url::parse(&format!("http://{addr}/sse")).unwrap();
    (url, state)
}

fn test_config(url: Url) -> McpClientConfig {
    McpClientConfig::new("mock", url).with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn connect_initialize_list_and_call() {
    let (url, state) = spawn_mock().await;
    let client = McpClient::connect(test_config(url)).await.unwrap();
    client.initialize().await.unwrap();

    let info = client.server_info().unwrap();
    assert_eq!(info.name, "mock-tools");

    let tools = client.list_tools().await.unwrap();
    // The schema-less tool is skipped.
    let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["echo", "none", "fail"]);

    // Dialect markers are stripped from the schemas handed out.
    let echo = &tools[0];
    assert!(echo.parameters.get("$schema").is_none());
    assert!(echo.parameters.get("additionalProperties").is_none());
    assert_eq!(echo.parameters["properties"]["text"]["type"], json!("string"));

    let reply = client
        .call_tool("echo", Some(json!({ "text": "turning to heading 090" })))
        .await
        .unwrap();
    assert_eq!(reply, "turning to heading 090");

    let calls = state.lock().calls.clone();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "echo");

    client.shutdown().await;
}

#[tokio::test]
async fn unknown_tool_maps_to_error_variant() {
    let (url, _state) = spawn_mock().await;
    let client = McpClient::connect(test_config(url)).await.unwrap();
    client.initialize().await.unwrap();

    let err = client.call_tool("teleport", Some(json!({}))).await.unwrap_err();
    match err {
        McpError::UnknownTool(name) => assert_eq!(name, "teleport"),
        other => panic!("unexpected error: {other:?}"),
    }

    client.shutdown().await;
}

#[tokio::test]
async fn failed_tool_maps_to_tool_failed() {
    let (url, _state) = spawn_mock().await;
    let client = McpClient::connect(test_config(url)).await.unwrap();
    client.initialize().await.unwrap();

    let err = client.call_tool("fail", Some(json!({}))).await.unwrap_err();
    match err {
        McpError::ToolFailed(detail) => assert_eq!(detail, "actuator offline"),
        other => panic!("unexpected error: {other:?}"),
    }

    client.shutdown().await;
}

#[tokio::test]
async fn empty_result_collapses_to_success_marker() {
    let (url, _state) = spawn_mock().await;
    let client = McpClient::connect(test_config(url)).await.unwrap();
    client.initialize().await.unwrap();

    let reply = client.call_tool("none", Some(json!({}))).await.unwrap();
    assert_eq!(reply, "Success");

    client.shutdown().await;
}

#[tokio::test]
async fn calls_before_initialize_are_rejected() {
    let (url, _state) = spawn_mock().await;
    let client = McpClient::connect(test_config(url)).await.unwrap();

    let err = client.list_tools().await.unwrap_err();
    assert!(matches!(err, McpError::NotInitialized));

    client.shutdown().await;
}

#[tokio::test]
async fn concurrent_ensure_connected_opens_one_stream() {
    let (url, state) = spawn_mock().await;
    let manager = Arc::new(McpManager::new(test_config(url)));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let manager = Arc::clone(&manager);
        handles.push(tokio::spawn(async move {
            manager.ensure_connected().await.map(|c| c.is_initialized())
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().unwrap());
    }

    assert_eq!(state.lock().sse_connections, 1);
    assert!(manager.is_connected());

    manager.shutdown().await;
    assert!(!manager.is_connected());
}

#[tokio::test]
async fn later_endpoint_announcement_wins() {
    let (url, state) = spawn_mock().await;
    let client = McpClient::connect(test_config(url)).await.unwrap();
    client.initialize().await.unwrap();

    // The server re-routes commands to a second endpoint mid-session.
    let tx = state.lock().session.clone().unwrap();
    tx.send(Event::default().event("endpoint").data("/message2"))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let tools = client.list_tools().await.unwrap();
    assert!(!tools.is_empty());
    assert!(state.lock().alt_posts >= 1, "new endpoint was not used");

    client.shutdown().await;
}

#[tokio::test]
async fn dropped_stream_fails_pending_call() {
    let (url, _state) = spawn_mock().await;
    let client = McpClient::connect(test_config(url)).await.unwrap();
    client.initialize().await.unwrap();

    let err = client.call_tool("vanish", Some(json!({}))).await.unwrap_err();
    assert!(matches!(err, McpError::ConnectionClosed));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!client.is_alive());

    client.shutdown().await;
}

#[tokio::test]
async fn manager_state_tracks_dead_stream() {
    let (url, state) = spawn_mock().await;
    let manager = McpManager::new(test_config(url));
    let client = manager.ensure_connected().await.unwrap();
    assert_eq!(manager.state(), ConnectionState::Connected);

    let _ = client.call_tool("vanish", Some(json!({}))).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(manager.state(), ConnectionState::Disconnected);

    // The next turn gets a fresh session.
    let client = manager.ensure_connected().await.unwrap();
    assert!(client.is_initialized());
    assert_eq!(state.lock().sse_connections, 2);

    manager.shutdown().await;
}

#[tokio::test]
async fn manager_reconnects_after_shutdown() {
    let (url, state) = spawn_mock().await;
    let manager = McpManager::new(test_config(url));

    let client = manager.ensure_connected().await.unwrap();
    assert!(client.is_initialized());
    manager.shutdown().await;

    let client = manager.ensure_connected().await.unwrap();
    assert!(client.is_initialized());
    assert_eq!(state.lock().sse_connections, 2);

    manager.shutdown().await;
}
