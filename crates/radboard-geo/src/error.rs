//! Mapping client error types.

use thiserror::Error;

pub type GeoResult<T> = Result<T, GeoError>;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("No results for query")]
    NoResults,

    #[error("No API key configured")]
    MissingKey,

    #[error("Mapping service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Quota exhausted")]
    RateLimited,

    #[error("Request denied: {0}")]
    RequestDenied(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GeoError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GeoError::ServiceUnavailable(_) | GeoError::RateLimited | GeoError::Network(_)
        )
    }
}
