//! Nominatim geocoding client.

use serde::Deserialize;
use tracing::{debug, warn};

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
const USER_AGENT: &str = "skybridge-mission-control";

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

/// Resolves place names to coordinates via Nominatim.
pub struct Geocoder {
    http: reqwest::Client,
    base_url: String,
}

impl Geocoder {
    pub fn new() -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: NOMINATIM_URL.to_string(),
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Look up a place name, returning `Ok(None)` when nothing matches.
    pub async fn resolve(&self, name: &str) -> Result<Option<(f64, f64)>, reqwest::Error> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[("q", name), ("format", "json"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?;

        let hits: Vec<SearchHit> = response.json().await?;
        let Some(hit) = hits.first() else {
            debug!(name, "no geocoding match");
            return Ok(None);
        };

        match (hit.lat.parse::<f64>(), hit.lon.parse::<f64>()) {
            (Ok(lat), Ok(lng)) => {
                debug!(name, lat, lng, "geocoded");
                Ok(Some((lat, lng)))
            }
            _ => {
                warn!(name, lat = %hit.lat, lon = %hit.lon, "unparseable geocoding result");
                Ok(None)
            }
        }
    }
}
