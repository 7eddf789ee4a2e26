//! HTTP API and flight simulation for the Skybridge mission-control
//! backend.
//!
//! Surfaces: `POST /api/chat` (agent turns), the `POST /api/mission/*`
//! actuation endpoints the tool server drives, and `GET /ws/flight` for
//! real-time telemetry. A background worker ticks the flight physics at
//! 20 Hz and publishes snapshots on a broadcast channel.

pub mod error;
pub mod flight;
pub mod routes;
pub mod sim;
pub mod state;

use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;
use tracing::info;

pub use error::{Result, ServerError};
pub use flight::{FlightMode, FlightState, Telemetry};
pub use sim::run_simulation;
pub use state::AppState;

/// Serve the HTTP API until the token is cancelled.
pub async fn serve(
    state: AppState,
    addr: SocketAddr,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    let app = routes::router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "mission API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::sync::broadcast;

    use skybridge_agent::{MissionAgent, ToolBroker};
    use skybridge_llm::{GenerateResponse, MockBackend, Part, SharedBackend};
    use skybridge_mcp::{McpError, ToolDescriptor};

    struct NullBroker;

    #[async_trait]
    impl ToolBroker for NullBroker {
        async fn connect(&self) -> std::result::Result<(), McpError> {
            Ok(())
        }
        async fn list_tools(&self) -> std::result::Result<Vec<ToolDescriptor>, McpError> {
            Ok(Vec::new())
        }
        async fn call_tool(
            &self,
            _name: &str,
            _arguments: Value,
        ) -> std::result::Result<String, McpError> {
            Ok("Success".to_string())
        }
    }

    fn test_state() -> AppState {
        let backend: SharedBackend = Arc::new(MockBackend::new(vec![
            GenerateResponse::from_parts(vec![Part::text("Roger.")]),
        ]));
        let agent = Arc::new(MissionAgent::new(backend, Arc::new(NullBroker)));
        let (tx, _) = broadcast::channel(16);
        AppState::new(agent, Arc::new(FlightState::new()), tx)
    }

    async fn spawn_server() -> SocketAddr {
        let state = test_state();
        let app = routes::router(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_chat_round_trip() {
        let addr = spawn_server().await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("http://{addr}/api/chat"))
            .json(&json!({ "message": "status report" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["reply"], "Roger.");
    }

    #[tokio::test]
    async fn test_empty_chat_message_rejected() {
        let addr = spawn_server().await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("http://{addr}/api/chat"))
            .json(&json!({ "message": "   " }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn test_mission_validation() {
        let addr = spawn_server().await;
        let client = reqwest::Client::new();
        let base = format!("http://{addr}/api/mission");

        // Null island is rejected.
        let response = client
            .post(format!("{base}/target"))
            .json(&json!({ "lat": 0.0, "lng": 0.0 }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        let response = client
            .post(format!("{base}/target"))
            .json(&json!({ "lat": 32.08, "lng": 34.78 }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let response = client
            .post(format!("{base}/speed"))
            .json(&json!({ "speed": 600.0 }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        let response = client
            .post(format!("{base}/altitude"))
            .json(&json!({ "altitude": 9000.0 }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_health() {
        let addr = spawn_server().await;
        let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
        assert_eq!(response.status(), 200);
    }
}
