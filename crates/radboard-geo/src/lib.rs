//! Mapping service client for RadBoard.
//!
//! Wraps the hosted geocoding API (forward, reverse, place autocomplete) and
//! degrades to a built-in city table when the service is unreachable or no
//! API key is configured. Location data is display-only enrichment; postings
//! and applications keep working with plain text locations.

pub mod client;
pub mod distance;
pub mod error;
pub mod fallback;
pub mod service;
pub mod types;

pub use client::{GeoClient, GeoConfig};
pub use distance::haversine_km;
pub use error::{GeoError, GeoResult};
pub use service::LocationService;
pub use types::{GeocodedLocation, PlaceSuggestion};
