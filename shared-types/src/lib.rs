//! Shared types between host, embedded map view and backend
//!
//! These types are used by:
//! - the listings backend (axum + sqlx)
//! - the native host's map bridge (`map-bridge`)
//! - the embedded map page script (via the generated TypeScript bindings)
//!
//! Serializable with serde for JSON over HTTP and over the bridge channel

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ============================================================================
// Geometry
// ============================================================================

/// A WGS84 coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../map-bridge/assets/generated.ts")]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

// ============================================================================
// Listings
// ============================================================================

/// A paying-guest listing as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../map-bridge/assets/generated.ts")]
pub struct ListingRecord {
    /// Opaque identifier assigned by the store
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub price: f64,
    /// Null until a location has been picked on the map
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Free-text area/locality label
    #[serde(default)]
    pub location: String,
    #[serde(default = "default_available")]
    pub available: bool,
}

impl ListingRecord {
    /// Coordinates of the record, if both halves are present.
    pub fn position(&self) -> Option<LatLng> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(LatLng { lat, lng }),
            _ => None,
        }
    }

    /// A record can be drawn on the map only when both coordinates are set.
    pub fn is_plottable(&self) -> bool {
        self.position().is_some()
    }

    /// Overwrite the fields present in `patch`, leaving the rest untouched.
    pub fn apply_patch(&mut self, patch: &ListingPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(lat) = patch.lat {
            self.lat = Some(lat);
        }
        if let Some(lng) = patch.lng {
            self.lng = Some(lng);
        }
        if let Some(location) = &patch.location {
            self.location = location.clone();
        }
        if let Some(available) = patch.available {
            self.available = available;
        }
    }
}

/// A listing that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../map-bridge/assets/generated.ts")]
pub struct ListingDraft {
    pub name: String,
    pub price: f64,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    #[serde(default)]
    pub location: String,
    #[serde(default = "default_available")]
    pub available: bool,
}

impl ListingDraft {
    /// Attach the store-assigned identifier.
    pub fn into_record(self, id: impl Into<String>) -> ListingRecord {
        ListingRecord {
            id: id.into(),
            name: self.name,
            price: self.price,
            lat: self.lat,
            lng: self.lng,
            location: self.location,
            available: self.available,
        }
    }
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../map-bridge/assets/generated.ts")]
pub struct ListingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl ListingPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Filter for a search round trip. Empty criteria means "all records".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "../../map-bridge/assets/generated.ts")]
pub struct SearchCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    /// Case-insensitive substring of the location label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl SearchCriteria {
    pub fn is_empty(&self) -> bool {
        self.max_price.is_none() && self.location_filter().is_none()
    }

    /// The location filter, trimmed; blank filters count as absent.
    pub fn location_filter(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Reference semantics of the backend filter.
    pub fn matches(&self, record: &ListingRecord) -> bool {
        if let Some(max) = self.max_price {
            if record.price > max {
                return false;
            }
        }
        if let Some(needle) = self.location_filter() {
            if !record
                .location
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }
        true
    }
}

fn default_available() -> bool {
    true
}

// ============================================================================
// Bridge Protocol
// ============================================================================

/// Host → embedded view messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "camelCase")]
#[ts(export, export_to = "../../map-bridge/assets/generated.ts")]
pub enum HostMessage {
    /// Replace the whole marker set with one marker per plottable record
    RenderMarkers { payload: Vec<ListingRecord> },

    /// Recenter/zoom the view on a point
    CenterMap { lat: f64, lng: f64 },
}

impl HostMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            HostMessage::RenderMarkers { .. } => MSG_RENDER_MARKERS,
            HostMessage::CenterMap { .. } => MSG_CENTER_MAP,
        }
    }
}

/// Embedded view → host messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "camelCase")]
#[ts(export, export_to = "../../map-bridge/assets/generated.ts")]
pub enum ViewMessage {
    /// Handshake: the view's listener is attached and it can now receive
    #[serde(alias = "webviewReady")]
    ViewReady,

    /// User tapped a point on the map
    LocationSelected { lat: f64, lng: f64 },

    /// Pointer went down inside the view
    #[serde(alias = "pointerDown")]
    TouchStart,

    /// Pointer released inside the view
    #[serde(alias = "pointerUp")]
    TouchEnd,
}

impl ViewMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ViewMessage::ViewReady => MSG_VIEW_READY,
            ViewMessage::LocationSelected { .. } => MSG_LOCATION_SELECTED,
            ViewMessage::TouchStart => MSG_TOUCH_START,
            ViewMessage::TouchEnd => MSG_TOUCH_END,
        }
    }
}

// ============================================================================
// Constants
// ============================================================================

/// Message `type` discriminators
pub const MSG_VIEW_READY: &str = "viewReady";
pub const MSG_LOCATION_SELECTED: &str = "locationSelected";
pub const MSG_TOUCH_START: &str = "touchStart";
pub const MSG_TOUCH_END: &str = "touchEnd";
pub const MSG_RENDER_MARKERS: &str = "renderMarkers";
pub const MSG_CENTER_MAP: &str = "centerMap";

/// Discriminators accepted from the view, including legacy spellings.
pub const VIEW_MESSAGE_TYPES: &[&str] = &[
    MSG_VIEW_READY,
    "webviewReady",
    MSG_LOCATION_SELECTED,
    MSG_TOUCH_START,
    "pointerDown",
    MSG_TOUCH_END,
    "pointerUp",
];

/// Discriminators accepted from the host.
pub const HOST_MESSAGE_TYPES: &[&str] = &[MSG_RENDER_MARKERS, MSG_CENTER_MAP];

// ============================================================================
// Tests
// ============================================================================
