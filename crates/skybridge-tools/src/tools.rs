//! The mission tool catalog and executor.

use serde_json::{json, Value};
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::geocode::Geocoder;

/// Error type for tool execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool with the requested name.
    #[error("Unknown tool: {0}")]
    Unknown(String),

    /// The arguments do not match the tool's schema.
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    /// The tool ran and failed.
    #[error("{0}")]
    Failed(String),
}

/// Static catalog, in the shape `tools/list` advertises.
pub fn catalog() -> Value {
    json!([
        {
            "name": "navigate_to",
            "description": "Fly the aircraft to a named location. The location is geocoded to coordinates before the course change.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "location": {
                        "type": "string",
                        "description": "Place name, e.g. a city"
                    }
                },
                "required": ["location"]
            }
        },
        {
            "name": "change_speed",
            "description": "Set the aircraft's target speed in knots (1-500).",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "speed_kts": {
                        "type": "number",
                        "description": "Target speed in knots"
                    }
                },
                "required": ["speed_kts"]
            }
        },
        {
            "name": "change_altitude",
            "description": "Set the aircraft's target altitude in feet (0-60000).",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "altitude_ft": {
                        "type": "number",
                        "description": "Target altitude in feet"
                    }
                },
                "required": ["altitude_ft"]
            }
        }
    ])
}

/// Executes tool calls against the mission API.
pub struct ToolExecutor {
    http: reqwest::Client,
    mission_api: Url,
    geocoder: Geocoder,
}

impl ToolExecutor {
    pub fn new(mission_api: Url, geocoder: Geocoder) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;
        Ok(Self {
            http,
            mission_api,
            geocoder,
        })
    }

    /// Run one tool call, returning the text result.
    pub async fn execute(&self, name: &str, arguments: &Value) -> Result<String, ToolError> {
        match name {
            "navigate_to" => self.navigate_to(arguments).await,
            "change_speed" => self.change_speed(arguments).await,
            "change_altitude" => self.change_altitude(arguments).await,
            other => Err(ToolError::Unknown(other.to_string())),
        }
    }

    async fn navigate_to(&self, arguments: &Value) -> Result<String, ToolError> {
        let location = arguments
            .get("location")
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArgs("location is required".into()))?;

        let (lat, lng) = self
            .geocoder
            .resolve(location)
            .await
            .map_err(|e| ToolError::Failed(format!("geocoding failed: {e}")))?
            .ok_or_else(|| ToolError::Failed(format!("could not find location: {location}")))?;

        info!(location, lat, lng, "navigating");
        self.post("api/mission/target", &json!({ "lat": lat, "lng": lng }))
            .await?;
        Ok(format!("Navigating to {location} ({lat:.6}, {lng:.6})"))
    }

    async fn change_speed(&self, arguments: &Value) -> Result<String, ToolError> {
        let speed = arguments
            .get("speed_kts")
            .and_then(Value::as_f64)
            .ok_or_else(|| ToolError::InvalidArgs("speed_kts is required".into()))?;

        info!(speed, "changing speed");
        self.post("api/mission/speed", &json!({ "speed": speed }))
            .await?;
        Ok(format!("Speed set to {speed} knots"))
    }

    async fn change_altitude(&self, arguments: &Value) -> Result<String, ToolError> {
        let altitude = arguments
            .get("altitude_ft")
            .and_then(Value::as_f64)
            .ok_or_else(|| ToolError::InvalidArgs("altitude_ft is required".into()))?;

        info!(altitude, "changing altitude");
        self.post("api/mission/altitude", &json!({ "altitude": altitude }))
            .await?;
        Ok(format!("Altitude set to {altitude} feet"))
    }

    async fn post(&self, path: &str, body: &Value) -> Result<(), ToolError> {
        let url = self
            .mission_api
            .join(path)
            .map_err(|e| ToolError::Failed(e.to_string()))?;
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ToolError::Failed(format!("mission API unreachable: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(ToolError::Failed(format!(
                "mission API returned {status}: {detail}"
            )));
        }
        Ok(())
    }
}
