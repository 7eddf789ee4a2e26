//! Shared application state for HTTP handlers.

use std::sync::Arc;

use tokio::sync::broadcast;

use skybridge_agent::MissionAgent;

use crate::flight::{FlightState, Telemetry};

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// The mission agent driving chat turns.
    pub agent: Arc<MissionAgent>,
    /// The simulated flight state.
    pub flight: Arc<FlightState>,
    /// Telemetry fan-out; handlers subscribe per WebSocket.
    pub telemetry: broadcast::Sender<Telemetry>,
}

impl AppState {
    pub fn new(
        agent: Arc<MissionAgent>,
        flight: Arc<FlightState>,
        telemetry: broadcast::Sender<Telemetry>,
    ) -> Self {
        Self {
            agent,
            flight,
            telemetry,
        }
    }
}
