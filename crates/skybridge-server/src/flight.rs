//! Flight state and physics.
//!
//! The simulated aircraft is either orbiting a point or transiting to a
//! target. Speed and altitude slew toward their targets at fixed rates;
//! ground movement is proportional to current speed. All positions are
//! plain lat/lng degrees, good enough at mission scale.

use std::f64::consts::FRAC_PI_2;

use serde::Serialize;

/// Physics ticks per second.
pub const TICK_HZ: u64 = 20;

/// Degrees of ground movement per tick per knot of speed.
///
/// Calibrated so the default cruise speed covers 0.000025 deg per tick.
const STEP_PER_KNOT_TICK: f64 = 0.000025 / 105.0;

/// Speed change per tick (2 kts per second).
const SPEED_SLEW_PER_TICK: f64 = 2.0 / TICK_HZ as f64;

/// Altitude change per tick (10 ft per second).
const ALTITUDE_SLEW_PER_TICK: f64 = 10.0 / TICK_HZ as f64;

const DEFAULT_LAT: f64 = 31.801447;
const DEFAULT_LNG: f64 = 34.643497;
const DEFAULT_SPEED_KTS: f64 = 105.0;
const DEFAULT_ALTITUDE_FT: f64 = 4000.0;
const ORBIT_RADIUS_DEG: f64 = 0.01;

/// What the aircraft is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightMode {
    /// Circling the current target point.
    Orbiting,
    /// Flying toward the target point.
    Transiting,
}

/// A telemetry snapshot, as pushed to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Telemetry {
    pub lat: f64,
    pub lng: f64,
    pub heading_deg: f64,
    pub speed_kts: f64,
    pub altitude_ft: f64,
    pub mode: FlightMode,
}

#[derive(Debug)]
struct FlightInner {
    lat: f64,
    lng: f64,
    target_lat: f64,
    target_lng: f64,
    heading_deg: f64,
    speed_kts: f64,
    target_speed_kts: f64,
    altitude_ft: f64,
    target_altitude_ft: f64,
    orbit_angle: f64,
    mode: FlightMode,
}

impl Default for FlightInner {
    fn default() -> Self {
        Self {
            lat: DEFAULT_LAT,
            lng: DEFAULT_LNG,
            target_lat: DEFAULT_LAT,
            target_lng: DEFAULT_LNG,
            heading_deg: 0.0,
            speed_kts: DEFAULT_SPEED_KTS,
            target_speed_kts: DEFAULT_SPEED_KTS,
            altitude_ft: DEFAULT_ALTITUDE_FT,
            target_altitude_ft: DEFAULT_ALTITUDE_FT,
            orbit_angle: 0.0,
            mode: FlightMode::Orbiting,
        }
    }
}

/// Lock-guarded flight state, shared between the simulation worker and
/// the mission API handlers.
#[derive(Debug, Default)]
pub struct FlightState {
    inner: parking_lot::Mutex<FlightInner>,
}

impl FlightState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the aircraft at a new target and start transiting.
    pub fn set_destination(&self, lat: f64, lng: f64) {
        let mut inner = self.inner.lock();
        inner.target_lat = lat;
        inner.target_lng = lng;
        inner.mode = FlightMode::Transiting;
    }

    /// Set the target speed in knots.
    pub fn set_speed(&self, speed_kts: f64) {
        self.inner.lock().target_speed_kts = speed_kts;
    }

    /// Set the target altitude in feet.
    pub fn set_altitude(&self, altitude_ft: f64) {
        self.inner.lock().target_altitude_ft = altitude_ft;
    }

    /// Advance the simulation by one tick.
    pub fn tick(&self) {
        let mut inner = self.inner.lock();
        let s = &mut *inner;

        s.speed_kts = slew(s.speed_kts, s.target_speed_kts, SPEED_SLEW_PER_TICK);
        s.altitude_ft = slew(s.altitude_ft, s.target_altitude_ft, ALTITUDE_SLEW_PER_TICK);

        let step = s.speed_kts * STEP_PER_KNOT_TICK;

        match s.mode {
            FlightMode::Transiting => {
                let d_lat = s.target_lat - s.lat;
                let d_lng = s.target_lng - s.lng;
                let distance = (d_lat * d_lat + d_lng * d_lng).sqrt();

                if distance <= ORBIT_RADIUS_DEG {
                    // Arrived: pick up the orbit at the current bearing
                    // from the target so the transition is seamless.
                    s.orbit_angle = (s.lng - s.target_lng).atan2(s.lat - s.target_lat);
                    s.mode = FlightMode::Orbiting;
                } else {
                    s.lat += d_lat / distance * step;
                    s.lng += d_lng / distance * step;
                    s.heading_deg = d_lng.atan2(d_lat).to_degrees().rem_euclid(360.0);
                }
            }
            FlightMode::Orbiting => {
                s.orbit_angle += step / ORBIT_RADIUS_DEG;
                s.lat = s.target_lat + ORBIT_RADIUS_DEG * s.orbit_angle.cos();
                s.lng = s.target_lng + ORBIT_RADIUS_DEG * s.orbit_angle.sin();
                // Tangent to the circle.
                s.heading_deg = (s.orbit_angle + FRAC_PI_2).to_degrees().rem_euclid(360.0);
            }
        }
    }

    /// Current telemetry snapshot.
    pub fn snapshot(&self) -> Telemetry {
        let inner = self.inner.lock();
        Telemetry {
            lat: inner.lat,
            lng: inner.lng,
            heading_deg: inner.heading_deg,
            speed_kts: inner.speed_kts,
            altitude_ft: inner.altitude_ft,
            mode: inner.mode,
        }
    }
}

fn slew(current: f64, target: f64, rate: f64) -> f64 {
    let delta = target - current;
    if delta.abs() <= rate {
        target
    } else {
        current + rate * delta.signum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let t = FlightState::new().snapshot();
        assert_eq!(t.mode, FlightMode::Orbiting);
        assert!((t.speed_kts - 105.0).abs() < f64::EPSILON);
        assert!((t.altitude_ft - 4000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_speed_slews_at_two_knots_per_second() {
        let state = FlightState::new();
        state.set_speed(205.0);
        for _ in 0..TICK_HZ {
            state.tick();
        }
        // One second of slewing covers 2 kts.
        let t = state.snapshot();
        assert!((t.speed_kts - 107.0).abs() < 1e-9);
    }

    #[test]
    fn test_altitude_slew_stops_at_target() {
        let state = FlightState::new();
        state.set_altitude(4003.0);
        for _ in 0..(TICK_HZ * 10) {
            state.tick();
        }
        assert!((state.snapshot().altitude_ft - 4003.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_transit_moves_toward_target() {
        let state = FlightState::new();
        state.set_destination(32.0, 35.0);
        let before = state.snapshot();
        for _ in 0..100 {
            state.tick();
        }
        let after = state.snapshot();
        assert_eq!(after.mode, FlightMode::Transiting);
        let dist = |t: &Telemetry| {
            ((32.0 - t.lat).powi(2) + (35.0 - t.lng).powi(2)).sqrt()
        };
        assert!(dist(&after) < dist(&before));
    }

    #[test]
    fn test_arrival_switches_to_orbit() {
        let state = FlightState::new();
        // Target just inside one orbit radius of the start position.
        state.set_destination(DEFAULT_LAT + 0.005, DEFAULT_LNG);
        state.tick();
        assert_eq!(state.snapshot().mode, FlightMode::Orbiting);
    }

    #[test]
    fn test_orbit_stays_on_circle() {
        let state = FlightState::new();
        for _ in 0..500 {
            state.tick();
        }
        let t = state.snapshot();
        let radius =
            ((t.lat - DEFAULT_LAT).powi(2) + (t.lng - DEFAULT_LNG).powi(2)).sqrt();
        assert!((radius - ORBIT_RADIUS_DEG).abs() < 1e-9);
    }

    #[test]
    fn test_transit_heading_is_bearing_to_target() {
        let state = FlightState::new();
        // Due east.
        state.set_destination(DEFAULT_LAT, DEFAULT_LNG + 1.0);
        state.tick();
        let t = state.snapshot();
        assert!((t.heading_deg - 90.0).abs() < 0.01);
    }

    #[test]
    fn test_telemetry_serializes_camel_case() {
        let json = serde_json::to_value(FlightState::new().snapshot()).unwrap();
        assert!(json.get("headingDeg").is_some());
        assert!(json.get("speedKts").is_some());
        assert_eq!(json["mode"], "orbiting");
    }
}
