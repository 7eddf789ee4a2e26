//! Mission-control tool server.
//!
//! Exposes the flight tools (`navigate_to`, `change_speed`,
//! `change_altitude`) over the SSE + JSON-RPC dialect, executing them
//! against the mission API.

mod geocode;
mod server;
mod tools;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::geocode::Geocoder;
use crate::server::{router, ToolServerState};
use crate::tools::ToolExecutor;

#[derive(Parser, Debug)]
#[command(name = "skybridge-tools", about = "Mission-control tool server", version)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "SKYBRIDGE_TOOLS_LISTEN", default_value = "127.0.0.1:3001")]
    listen: SocketAddr,

    /// Base URL of the mission API.
    #[arg(long, env = "SKYBRIDGE_MISSION_API", default_value = "http://127.0.0.1:8080/")]
    mission_api: Url,

    /// Log filter (tracing EnvFilter syntax).
    #[arg(long, env = "SKYBRIDGE_TOOLS_LOG", default_value = "info")]
    log: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&args.log).context("invalid log filter")?)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let geocoder = Geocoder::new().context("failed to build geocoder")?;
    let executor = ToolExecutor::new(args.mission_api.clone(), geocoder)
        .context("failed to build tool executor")?;
    let state = ToolServerState::new(Arc::new(executor));

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("failed to bind {}", args.listen))?;
    info!(
        addr = %listener.local_addr()?,
        mission_api = %args.mission_api,
        "tool server listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("server error")?;
    Ok(())
}
