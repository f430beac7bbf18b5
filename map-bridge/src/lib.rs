//! PG Locator map bridge - host side of the embedded map view
//!
//! This crate keeps the listing collection in sync with the markers drawn
//! inside an isolated map view: a readiness-gated message channel, a
//! sequence-guarded record store, full-replace marker reconciliation,
//! gesture arbitration and place-name geocoding.

pub mod auth;
pub mod bridge;
pub mod client;
pub mod config;
pub mod form;
pub mod geocode;
pub mod gesture;
pub mod notice;
pub mod reconciler;
pub mod session;
pub mod store;
pub mod view;

pub use client::{ListingsClient, StoreError};
pub use config::BridgeConfig;
pub use session::{MapSession, SessionError};
pub use store::{RecordSet, RecordStore, StoreSnapshot};
