use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::Coordinates;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Reverse geocoding capability used to name map pins.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Best address for a point, or `None` when the provider knows nothing there
    async fn reverse_geocode(&self, at: Coordinates) -> Result<Option<String>>;
}

/// Google Geocoding web service client.
#[derive(Clone)]
pub struct GeocodingClient {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl GeocodingClient {
    pub fn from_config(config: &Config) -> Self {
        Self::with_config(
            config.maps_api_key.clone(),
            config.geocoding_base_url.clone(),
            config.itinerary.routing_timeout,
        )
    }

    pub fn with_config(api_key: String, base_url: String, timeout: Duration) -> Self {
        GeocodingClient {
            client: Client::new(),
            api_key,
            base_url,
            timeout,
        }
    }
}

#[async_trait]
impl Geocoder for GeocodingClient {
    async fn reverse_geocode(&self, at: Coordinates) -> Result<Option<String>> {
        tracing::debug!(lat = at.lat, lng = at.lng, "Reverse geocoding request");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("latlng", at.to_param()), ("key", self.api_key.clone())])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| AppError::Geocoding(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Geocoding(format!("HTTP {}", status)));
        }

        let body: GoogleGeocodeResponse = response
            .json()
            .await
            .map_err(|e| AppError::Geocoding(format!("Failed to parse response: {}", e)))?;

        match body.status.as_str() {
            "OK" => Ok(body
                .results
                .into_iter()
                .next()
                .map(|result| result.formatted_address)),
            "ZERO_RESULTS" => Ok(None),
            other => {
                tracing::warn!("Geocoding API status {}", other);
                Err(AppError::Geocoding(match body.error_message {
                    Some(message) => format!("{}: {}", other, message),
                    None => other.to_string(),
                }))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoogleGeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GoogleGeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleGeocodeResult {
    formatted_address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing() {
        let body: GoogleGeocodeResponse = serde_json::from_value(serde_json::json!({
            "status": "OK",
            "results": [
                {"formatted_address": "Boulevard de la Corniche, Casablanca", "place_id": "x"},
                {"formatted_address": "Casablanca, Morocco"}
            ]
        }))
        .unwrap();
        assert_eq!(body.results.len(), 2);
        assert_eq!(body.results[0].formatted_address, "Boulevard de la Corniche, Casablanca");

        let empty: GoogleGeocodeResponse =
            serde_json::from_value(serde_json::json!({"status": "ZERO_RESULTS"})).unwrap();
        assert!(empty.results.is_empty());
    }
}
