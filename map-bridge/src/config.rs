use std::time::Duration;

/// Endpoints and client settings for the bridge's network collaborators.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Base URL of the listings REST API
    pub listings_api_url: String,
    /// Deployment switch: only fetch listings marked available
    pub only_available: bool,
    /// Base URL of the Nominatim-compatible geocoder
    pub geocoder_url: String,
    /// User-Agent sent to the geocoder (Nominatim rejects anonymous clients)
    pub geocoder_user_agent: String,
    /// Per-request timeout for both collaborators
    pub http_timeout: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            listings_api_url: "http://127.0.0.1:8080".to_string(),
            only_available: false,
            geocoder_url: "https://nominatim.openstreetmap.org".to_string(),
            geocoder_user_agent: "PG-Locator/1.0 (contact: example@example.com)".to_string(),
            http_timeout: Duration::from_secs(15),
        }
    }
}

impl BridgeConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Ok(Self {
            listings_api_url: env_str("LISTINGS_API_URL", &defaults.listings_api_url),
            only_available: env_bool("LISTINGS_ONLY_AVAILABLE", defaults.only_available)?,
            geocoder_url: env_str("GEOCODER_URL", &defaults.geocoder_url),
            geocoder_user_agent: env_str("GEOCODER_USER_AGENT", &defaults.geocoder_user_agent),
            http_timeout: Duration::from_secs(env_parse("HTTP_TIMEOUT_SECS", 15)?),
        })
    }
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse env var {key}={val}: {e}")),
        Err(_) => Ok(default),
    }
}

fn env_bool(key: &str, default: bool) -> anyhow::Result<bool> {
    match std::env::var(key) {
        Ok(val) => match val.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            other => Err(anyhow::anyhow!(
                "Invalid {key} '{other}'. Expected true or false"
            )),
        },
        Err(_) => Ok(default),
    }
}
