//! HTTP routes for PG listings
//!
//! The surface consumed by the map bridge's record store client:
//! list, search, create and partially update.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use shared_types::{ListingDraft, ListingPatch, ListingRecord, SearchCriteria};
use sqlx::SqlitePool;

use crate::db;
use crate::error::ApiError;

#[derive(Clone)]
pub struct ApiState {
    pub db: SqlitePool,
}

/// Configure all API routes
pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/records", get(list_records).post(create_record))
        .route("/records/search", get(search_records))
        .route("/records/{id}", put(update_record))
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "listings-api"
    }))
}

// Query values arrive as raw strings so malformed input is reported
// through `ApiError` rather than the extractor's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub available: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub max_price: Option<String>,
    pub location: Option<String>,
    pub available: Option<String>,
}

fn parse_max_price(raw: Option<&str>) -> Result<Option<f64>, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<f64>() {
        Ok(max_price) if max_price.is_finite() => Ok(Some(max_price)),
        _ => Err(ApiError::Validation(format!(
            "maxPrice must be a number, got {raw:?}"
        ))),
    }
}

fn parse_available(raw: Option<&str>) -> Result<bool, ApiError> {
    match raw.map(str::trim) {
        None | Some("") | Some("false") => Ok(false),
        Some("true") => Ok(true),
        Some(other) => Err(ApiError::Validation(format!(
            "available must be true or false, got {other:?}"
        ))),
    }
}

/// GET /records
pub async fn list_records(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ListingRecord>>, ApiError> {
    let only_available = parse_available(query.available.as_deref())?;
    let records = db::find_listings(&state.db, &SearchCriteria::default(), only_available).await?;
    tracing::debug!(count = records.len(), only_available, "listed records");
    Ok(Json(records))
}

/// GET /records/search?maxPrice=&location=
pub async fn search_records(
    State(state): State<ApiState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ListingRecord>>, ApiError> {
    let criteria = SearchCriteria {
        max_price: parse_max_price(query.max_price.as_deref())?,
        location: query.location,
    };
    let only_available = parse_available(query.available.as_deref())?;
    let records = db::find_listings(&state.db, &criteria, only_available).await?;
    tracing::debug!(
        count = records.len(),
        max_price = ?criteria.max_price,
        location = ?criteria.location_filter(),
        "searched records"
    );
    Ok(Json(records))
}

/// POST /records
pub async fn create_record(
    State(state): State<ApiState>,
    Json(draft): Json<ListingDraft>,
) -> Result<impl IntoResponse, ApiError> {
    validate_draft(&draft)?;
    let record = db::insert_listing(&state.db, draft).await?;
    tracing::info!(id = %record.id, name = %record.name, "listing created");
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT /records/{id}
pub async fn update_record(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(patch): Json<ListingPatch>,
) -> Result<Json<ListingRecord>, ApiError> {
    validate_patch(&patch)?;
    match db::update_listing(&state.db, &id, &patch).await? {
        Some(record) => {
            tracing::info!(id = %record.id, "listing updated");
            Ok(Json(record))
        }
        None => Err(ApiError::NotFound(id)),
    }
}

fn validate_draft(draft: &ListingDraft) -> Result<(), ApiError> {
    if draft.name.trim().is_empty() {
        return Err(ApiError::Validation("name is required".to_string()));
    }
    validate_price(draft.price)?;
    validate_coordinates(draft.lat, draft.lng)
}

fn validate_patch(patch: &ListingPatch) -> Result<(), ApiError> {
    if let Some(name) = &patch.name {
        if name.trim().is_empty() {
            return Err(ApiError::Validation("name must not be blank".to_string()));
        }
    }
    if let Some(price) = patch.price {
        validate_price(price)?;
    }
    validate_coordinates(patch.lat, patch.lng)
}

fn validate_price(price: f64) -> Result<(), ApiError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ApiError::Validation(
            "price must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

fn validate_coordinates(lat: Option<f64>, lng: Option<f64>) -> Result<(), ApiError> {
    if let Some(lat) = lat {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ApiError::Validation(format!("lat out of range: {lat}")));
        }
    }
    if let Some(lng) = lng {
        if !(-180.0..=180.0).contains(&lng) {
            return Err(ApiError::Validation(format!("lng out of range: {lng}")));
        }
    }
    Ok(())
}
