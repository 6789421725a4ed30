//! Location lookups with graceful degradation.
//!
//! The job board treats location data as enrichment, so every lookup has an
//! answer path even with the mapping service down or unconfigured: try the
//! service when a client exists, otherwise (or on failure) consult the
//! built-in city table.

use tracing::warn;

use crate::client::{GeoClient, GeoConfig};
use crate::error::{GeoError, GeoResult};
use crate::fallback;
use crate::types::{GeocodedLocation, PlaceSuggestion};

/// Mapping facade used by the application layer.
pub struct LocationService {
    client: Option<GeoClient>,
}

impl LocationService {
    /// Build from config; a missing API key means fallback-only operation.
    pub fn new(config: GeoConfig) -> Self {
        let client = if config.api_key.is_some() {
            match GeoClient::new(config) {
                Ok(client) => Some(client),
                Err(e) => {
                    warn!("Mapping client unavailable, using fallback table: {}", e);
                    None
                }
            }
        } else {
            None
        };
        Self { client }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        Self::new(GeoConfig::from_env())
    }

    /// Fallback-only service for keyless deployments.
    pub fn offline() -> Self {
        Self { client: None }
    }

    /// Whether lookups run against the table instead of the live service.
    pub fn is_degraded(&self) -> bool {
        self.client.is_none()
    }

    /// Resolve a free-form address to coordinates.
    pub async fn geocode(&self, address: &str) -> GeoResult<GeocodedLocation> {
        match &self.client {
            Some(client) => match client.geocode(address).await {
                Ok(location) => Ok(location),
                Err(e) => {
                    warn!("Geocoding {:?} failed, trying fallback table: {}", address, e);
                    fallback::lookup(address).ok_or(e)
                }
            },
            None => fallback::lookup(address).ok_or(GeoError::NoResults),
        }
    }

    /// Resolve coordinates to the nearest known address.
    pub async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> GeoResult<GeocodedLocation> {
        match &self.client {
            Some(client) => match client.reverse_geocode(latitude, longitude).await {
                Ok(location) => Ok(location),
                Err(e) => {
                    warn!("Reverse geocoding failed, trying fallback table: {}", e);
                    fallback::nearest(latitude, longitude).ok_or(e)
                }
            },
            None => fallback::nearest(latitude, longitude).ok_or(GeoError::NoResults),
        }
    }

    /// City suggestions for a partial input. Suggestions are advisory, so a
    /// dead service degrades to table matches rather than an error.
    pub async fn autocomplete(&self, input: &str) -> GeoResult<Vec<PlaceSuggestion>> {
        match &self.client {
            Some(client) => match client.autocomplete(input).await {
                Ok(suggestions) => Ok(suggestions),
                Err(e) => {
                    warn!("Autocomplete failed, using fallback table: {}", e);
                    Ok(fallback::suggestions(input))
                }
            },
            None => Ok(fallback::suggestions(input)),
        }
    }
}
