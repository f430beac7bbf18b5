//! PG listings backend - REST API over SQLite
//!
//! Serves the record surface the map bridge's store client consumes.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
