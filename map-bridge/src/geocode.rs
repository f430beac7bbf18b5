//! Place-name lookup against a Nominatim-compatible service.
//!
//! Best effort and only ever used to recenter the map: a miss is a valid
//! empty outcome, not an error. The first candidate always wins.

use std::time::Duration;

use serde::Deserialize;
use shared_types::LatLng;

use crate::config::BridgeConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeOutcome {
    /// Blank query; the service was not called
    Skipped,
    Found(LatLng),
    NotFound,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum GeocodeError {
    #[error("Geocoder request failed: {0}")]
    Transport(String),

    #[error("Geocoder returned HTTP {0}")]
    Status(u16),

    #[error("Unreadable geocoder response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for GeocodeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GeocodeError::Decode(e.to_string())
        } else {
            GeocodeError::Transport(e.to_string())
        }
    }
}

/// Nominatim serializes coordinates as strings; tolerate numbers as well.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Text(String),
    Number(f64),
}

impl Coordinate {
    fn value(&self) -> Option<f64> {
        match self {
            Coordinate::Text(s) => s.trim().parse().ok(),
            Coordinate::Number(n) => Some(*n),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Place {
    lat: Coordinate,
    lon: Coordinate,
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    http: reqwest::Client,
    base_url: String,
    user_agent: String,
}

impl Geocoder {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GeocodeError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_agent: user_agent.into(),
        })
    }

    pub fn from_config(config: &BridgeConfig) -> Result<Self, GeocodeError> {
        Self::new(
            config.geocoder_url.clone(),
            config.geocoder_user_agent.clone(),
            config.http_timeout,
        )
    }

    pub async fn resolve(&self, query: &str) -> Result<GeocodeOutcome, GeocodeError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(GeocodeOutcome::Skipped);
        }

        let url = format!("{}/search", self.base_url);
        let response = self
            .http
            .get(&url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&[("format", "json"), ("q", query), ("limit", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), %query, "geocoder rejected lookup");
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let places: Vec<Place> = response.json().await?;
        let Some(place) = places.first() else {
            tracing::info!(%query, "no geocoding match");
            return Ok(GeocodeOutcome::NotFound);
        };

        match (place.lat.value(), place.lon.value()) {
            (Some(lat), Some(lng)) => {
                tracing::debug!(%query, lat, lng, "geocoded place");
                Ok(GeocodeOutcome::Found(LatLng { lat, lng }))
            }
            _ => Err(GeocodeError::Decode(format!(
                "non-numeric coordinates for '{query}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_accepts_strings_and_numbers() {
        let places: Vec<Place> =
            serde_json::from_str(r#"[{"lat":"28.6139","lon":77.209,"display_name":"Delhi"}]"#)
                .unwrap();
        assert_eq!(places[0].lat.value(), Some(28.6139));
        assert_eq!(places[0].lon.value(), Some(77.209));
    }

    #[tokio::test]
    async fn test_blank_query_is_skipped() {
        // Port 9 would refuse the connection if anything were sent.
        let geocoder = Geocoder::new("http://127.0.0.1:9", "test", Duration::from_millis(200))
            .unwrap();
        assert_eq!(geocoder.resolve("").await, Ok(GeocodeOutcome::Skipped));
        assert_eq!(geocoder.resolve("   \t").await, Ok(GeocodeOutcome::Skipped));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_a_transport_error() {
        let geocoder = Geocoder::new("http://127.0.0.1:9", "test", Duration::from_millis(200))
            .unwrap();
        let err = geocoder.resolve("Delhi").await.unwrap_err();
        assert!(matches!(err, GeocodeError::Transport(_)));
    }
}
