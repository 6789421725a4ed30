//! Mapping service HTTP client.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{GeoError, GeoResult};
use crate::types::{AutocompletePayload, GeocodePayload, GeocodedLocation, PlaceSuggestion};

/// Configuration for the mapping client.
#[derive(Debug, Clone)]
pub struct GeoConfig {
    /// Base URL of the mapping service
    pub base_url: String,
    /// API key; absent means the service is never called
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries for network failures
    pub max_retries: u32,
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com".to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
            max_retries: 2,
        }
    }
}

impl GeoConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("MAPS_SERVICE_URL")
                .unwrap_or_else(|_| "https://maps.googleapis.com".to_string()),
            api_key: std::env::var("MAPS_API_KEY").ok().filter(|k| !k.is_empty()),
            timeout: Duration::from_secs(
                std::env::var("MAPS_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            max_retries: 2,
        }
    }
}

/// Client for the hosted geocoding API.
pub struct GeoClient {
    http: Client,
    config: GeoConfig,
    api_key: String,
}

impl GeoClient {
    /// Create a new mapping client. Requires an API key.
    pub fn new(config: GeoConfig) -> GeoResult<Self> {
        let api_key = config.api_key.clone().ok_or(GeoError::MissingKey)?;
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GeoError::Network)?;

        Ok(Self {
            http,
            config,
            api_key,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> GeoResult<Self> {
        Self::new(GeoConfig::from_env())
    }

    /// Resolve a free-form address to coordinates.
    pub async fn geocode(&self, address: &str) -> GeoResult<GeocodedLocation> {
        let url = format!("{}/maps/api/geocode/json", self.config.base_url);
        debug!("Geocoding {:?}", address);

        let payload: GeocodePayload = self
            .get_json(&url, &[("address", address), ("key", &self.api_key)])
            .await?;
        payload.into_first_result()
    }

    /// Resolve coordinates to the nearest address.
    pub async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> GeoResult<GeocodedLocation> {
        let url = format!("{}/maps/api/geocode/json", self.config.base_url);
        let latlng = format!("{},{}", latitude, longitude);

        let payload: GeocodePayload = self
            .get_json(&url, &[("latlng", latlng.as_str()), ("key", &self.api_key)])
            .await?;
        payload.into_first_result()
    }

    /// City suggestions for a partial input.
    pub async fn autocomplete(&self, input: &str) -> GeoResult<Vec<PlaceSuggestion>> {
        let url = format!("{}/maps/api/place/autocomplete/json", self.config.base_url);

        let payload: AutocompletePayload = self
            .get_json(
                &url,
                &[
                    ("input", input),
                    ("types", "(cities)"),
                    ("key", &self.api_key),
                ],
            )
            .await?;
        payload.into_suggestions()
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> GeoResult<T> {
        let response = self
            .with_retry(|| async {
                self.http
                    .get(url)
                    .query(query)
                    .send()
                    .await
                    .map_err(GeoError::Network)
            })
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(if status.is_server_error() {
                GeoError::ServiceUnavailable(format!("{}: {}", status, body))
            } else {
                GeoError::RequestFailed(format!("{}: {}", status, body))
            });
        }

        let value: T = response.json().await?;
        Ok(value)
    }

    /// Execute with retry logic for network failures.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> GeoResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = GeoResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "Mapping request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(GeoError::RequestFailed("Unknown error".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = GeoConfig::default();
        assert_eq!(config.base_url, "https://maps.googleapis.com");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_client_requires_api_key() {
        let result = GeoClient::new(GeoConfig::default());
        assert!(matches!(result, Err(GeoError::MissingKey)));
    }
}
