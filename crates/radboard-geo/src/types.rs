//! Mapping service request/response types.

use serde::{Deserialize, Serialize};

use crate::error::{GeoError, GeoResult};

/// A resolved location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedLocation {
    /// Human-readable address as the service formats it
    pub formatted_address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// One autocomplete suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceSuggestion {
    /// Display text ("Austin, TX, USA")
    pub description: String,
    /// Opaque id understood by the service; fallback entries use a
    /// `fallback:` prefix
    pub place_id: String,
}

// =============================================================================
// Wire payloads
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodePayload {
    pub status: String,

    #[serde(default)]
    pub results: Vec<GeocodeResult>,

    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeResult {
    pub formatted_address: String,
    pub geometry: Geometry,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AutocompletePayload {
    pub status: String,

    #[serde(default)]
    pub predictions: Vec<Prediction>,

    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Prediction {
    pub description: String,
    pub place_id: String,
}

/// The service reports failures through a body-level status string, not the
/// HTTP status.
pub(crate) fn check_status(status: &str, error_message: Option<String>) -> GeoResult<()> {
    let detail = error_message.unwrap_or_else(|| status.to_string());
    match status {
        "OK" => Ok(()),
        "ZERO_RESULTS" => Err(GeoError::NoResults),
        "OVER_QUERY_LIMIT" => Err(GeoError::RateLimited),
        "REQUEST_DENIED" => Err(GeoError::RequestDenied(detail)),
        "INVALID_REQUEST" => Err(GeoError::RequestFailed(detail)),
        _ => Err(GeoError::ServiceUnavailable(detail)),
    }
}

impl GeocodePayload {
    pub(crate) fn into_first_result(self) -> GeoResult<GeocodedLocation> {
        check_status(&self.status, self.error_message)?;
        let first = self.results.into_iter().next().ok_or(GeoError::NoResults)?;
        Ok(GeocodedLocation {
            formatted_address: first.formatted_address,
            latitude: first.geometry.location.lat,
            longitude: first.geometry.location.lng,
        })
    }
}

impl AutocompletePayload {
    pub(crate) fn into_suggestions(self) -> GeoResult<Vec<PlaceSuggestion>> {
        check_status(&self.status, self.error_message)?;
        Ok(self
            .predictions
            .into_iter()
            .map(|p| PlaceSuggestion {
                description: p.description,
                place_id: p.place_id,
            })
            .collect())
    }
}

// =============================================================================
// Tests
// =============================================================================
