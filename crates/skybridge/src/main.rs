//! Skybridge mission-control backend.
//!
//! Wires the Gemini backend, the tool-server connection, the mission
//! agent, and the flight simulation behind one HTTP API.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use url::Url;

use skybridge_agent::{MissionAgent, ToolBroker};
use skybridge_llm::{GeminiBackend, GeminiConfig, SharedBackend, DEFAULT_MODEL};
use skybridge_mcp::{McpClientConfig, McpManager};
use skybridge_server::{run_simulation, AppState, FlightState};

#[derive(Parser, Debug)]
#[command(name = "skybridge", about = "UAV mission-control backend", version)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "SKYBRIDGE_LISTEN", default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    /// Event stream URL of the tool server.
    #[arg(
        long,
        env = "SKYBRIDGE_TOOLS_URL",
        default_value = "http://127.0.0.1:3001/sse"
    )]
    tools_url: Url,

    /// Gemini API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: String,

    /// Gemini model name.
    #[arg(long, env = "SKYBRIDGE_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Log filter (tracing EnvFilter syntax).
    #[arg(long, env = "SKYBRIDGE_LOG", default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&args.log).context("invalid log filter")?)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let backend: SharedBackend = Arc::new(
        GeminiBackend::new(GeminiConfig::new(args.gemini_api_key.clone()).with_model(&args.model))
            .context("failed to build Gemini backend")?,
    );

    let manager = Arc::new(McpManager::new(McpClientConfig::new(
        "mission-tools",
        args.tools_url.clone(),
    )));
    let agent = Arc::new(MissionAgent::new(
        backend,
        Arc::clone(&manager) as Arc<dyn ToolBroker>,
    ));

    let flight = Arc::new(FlightState::new());
    let (telemetry_tx, _) = broadcast::channel(64);
    let state = AppState::new(agent, Arc::clone(&flight), telemetry_tx.clone());

    let cancel = CancellationToken::new();
    let sim_task = tokio::spawn(run_simulation(
        Arc::clone(&flight),
        telemetry_tx,
        cancel.child_token(),
    ));

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
            cancel.cancel();
        });
    }

    info!(
        listen = %args.listen,
        tools = %args.tools_url,
        model = %args.model,
        "starting mission API"
    );
    skybridge_server::serve(state, args.listen, cancel.clone())
        .await
        .context("server error")?;

    cancel.cancel();
    let _ = sim_task.await;
    manager.shutdown().await;
    info!("shutdown complete");
    Ok(())
}
