//! WebSocket telemetry fan-out.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

use crate::state::AppState;

/// `GET /ws/flight` upgrades and streams telemetry frames.
pub async fn flight_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| stream_telemetry(socket, state))
}

async fn stream_telemetry(mut socket: WebSocket, state: AppState) {
    let mut rx = state.telemetry.subscribe();
    info!("telemetry client connected");

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // Inbound frames are ignored.
                    Some(Err(_)) => break,
                }
            }
            snapshot = rx.recv() => {
                match snapshot {
                    Ok(telemetry) => {
                        let Ok(json) = serde_json::to_string(&telemetry) else {
                            continue;
                        };
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        // Slow client; drop the missed frames and go on.
                        debug!(missed, "telemetry client lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    info!("telemetry client disconnected");
}
