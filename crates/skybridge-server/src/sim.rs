//! Background flight simulation worker.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::flight::{FlightState, Telemetry, TICK_HZ};

/// Tick the physics at [`TICK_HZ`] and publish snapshots until cancelled.
///
/// Send errors are ignored; the broadcast simply has no subscribers yet.
pub async fn run_simulation(
    state: Arc<FlightState>,
    tx: broadcast::Sender<Telemetry>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(Duration::from_millis(1000 / TICK_HZ));
    info!(hz = TICK_HZ, "flight simulation running");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("flight simulation stopped");
                return;
            }
            _ = interval.tick() => {
                state.tick();
                let _ = tx.send(state.snapshot());
            }
        }
    }
}
