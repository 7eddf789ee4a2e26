//! Mission actuation endpoints.
//!
//! These are the endpoints the tool server drives; they validate ranges
//! and update the flight state directly.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::error::{Result, ServerError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TargetRequest {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct SpeedRequest {
    pub speed: f64,
}

#[derive(Debug, Deserialize)]
pub struct AltitudeRequest {
    pub altitude: f64,
}

/// `POST /api/mission/target` points the aircraft at a new destination.
pub async fn target_handler(
    State(state): State<AppState>,
    Json(request): Json<TargetRequest>,
) -> Result<StatusCode> {
    // A null-island target is always a geocoding failure upstream.
    if request.lat == 0.0 && request.lng == 0.0 {
        return Err(ServerError::BadRequest("invalid target coordinates".into()));
    }
    if !(-90.0..=90.0).contains(&request.lat) || !(-180.0..=180.0).contains(&request.lng) {
        return Err(ServerError::BadRequest("coordinates out of range".into()));
    }

    info!(lat = request.lat, lng = request.lng, "mission target set");
    state.flight.set_destination(request.lat, request.lng);
    Ok(StatusCode::OK)
}

/// `POST /api/mission/speed` sets the target speed (1 to 500 kts).
pub async fn speed_handler(
    State(state): State<AppState>,
    Json(request): Json<SpeedRequest>,
) -> Result<StatusCode> {
    if !(1.0..=500.0).contains(&request.speed) {
        return Err(ServerError::BadRequest(
            "speed must be between 1 and 500 knots".into(),
        ));
    }

    info!(speed = request.speed, "target speed set");
    state.flight.set_speed(request.speed);
    Ok(StatusCode::OK)
}

/// `POST /api/mission/altitude` sets the target altitude (0 to 60000 ft).
pub async fn altitude_handler(
    State(state): State<AppState>,
    Json(request): Json<AltitudeRequest>,
) -> Result<StatusCode> {
    if !(0.0..=60000.0).contains(&request.altitude) {
        return Err(ServerError::BadRequest(
            "altitude must be between 0 and 60000 feet".into(),
        ));
    }

    info!(altitude = request.altitude, "target altitude set");
    state.flight.set_altitude(request.altitude);
    Ok(StatusCode::OK)
}
