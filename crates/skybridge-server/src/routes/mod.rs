//! HTTP route handlers.

pub mod chat;
pub mod health;
pub mod mission;
pub mod ws;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/chat", post(chat::chat_handler))
        .route("/api/mission/target", post(mission::target_handler))
        .route("/api/mission/speed", post(mission::speed_handler))
        .route("/api/mission/altitude", post(mission::altitude_handler))
        .route("/ws/flight", get(ws::flight_ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
