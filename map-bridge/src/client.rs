//! Typed calls against the listings REST API.

use std::time::Duration;

use shared_types::{ListingDraft, ListingPatch, ListingRecord, SearchCriteria};

use crate::config::BridgeConfig;

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("HTTP error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Listing not found: {0}")]
    NotFound(String),

    #[error("Failed to parse response: {0}")]
    Decode(String),

    /// A newer read landed first; this response was discarded unseen.
    #[error("Response #{seq} superseded by #{latest}")]
    Superseded { seq: u64, latest: u64 },
}

impl StoreError {
    pub fn is_superseded(&self) -> bool {
        matches!(self, StoreError::Superseded { .. })
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StoreError::Decode(e.to_string())
        } else {
            StoreError::Transport(e.to_string())
        }
    }
}

/// HTTP client for `/records`.
#[derive(Debug, Clone)]
pub struct ListingsClient {
    http: reqwest::Client,
    base_url: String,
    only_available: bool,
}

impl ListingsClient {
    pub fn new(
        base_url: impl Into<String>,
        only_available: bool,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            only_available,
        })
    }

    pub fn from_config(config: &BridgeConfig) -> Result<Self, StoreError> {
        Self::new(
            config.listings_api_url.clone(),
            config.only_available,
            config.http_timeout,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET /records
    pub async fn fetch_all(&self) -> Result<Vec<ListingRecord>, StoreError> {
        let url = format!("{}/records", self.base_url);
        let mut request = self.http.get(&url);
        if self.only_available {
            request = request.query(&[("available", "true")]);
        }

        let response = request.send().await?;
        let response = check_status(response, None).await?;
        Ok(response.json().await?)
    }

    /// GET /records/search
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<ListingRecord>, StoreError> {
        let url = format!("{}/records/search", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&self.search_params(criteria))
            .send()
            .await?;
        let response = check_status(response, None).await?;
        Ok(response.json().await?)
    }

    /// POST /records
    pub async fn create(&self, draft: &ListingDraft) -> Result<ListingRecord, StoreError> {
        let url = format!("{}/records", self.base_url);
        let response = self.http.post(&url).json(draft).send().await?;
        let response = check_status(response, None).await?;
        Ok(response.json().await?)
    }

    /// PUT /records/{id}
    pub async fn update(&self, id: &str, patch: &ListingPatch) -> Result<ListingRecord, StoreError> {
        let url = format!("{}/records/{}", self.base_url, id);
        let response = self.http.put(&url).json(patch).send().await?;
        let response = check_status(response, Some(id)).await?;
        Ok(response.json().await?)
    }

    fn search_params(&self, criteria: &SearchCriteria) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(max_price) = criteria.max_price {
            params.push(("maxPrice", max_price.to_string()));
        }
        if let Some(location) = criteria.location_filter() {
            params.push(("location", location.to_string()));
        }
        if self.only_available {
            params.push(("available", "true".to_string()));
        }
        params
    }
}

async fn check_status(
    response: reqwest::Response,
    id: Option<&str>,
) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == reqwest::StatusCode::NOT_FOUND {
        if let Some(id) = id {
            return Err(StoreError::NotFound(id.to_string()));
        }
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(ToString::to_string))
        .unwrap_or(body);
    Err(StoreError::Status {
        status: status.as_u16(),
        message,
    })
}
