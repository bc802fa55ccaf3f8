use crate::config::Config;
use crate::constants::MAX_STOPOVERS;
use crate::error::{AppError, Result};
use crate::models::{Coordinates, RouteLeg, TravelMode, WaypointOrder};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// A routing request between fixed endpoints through ordered stopovers.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsRequest {
    pub origin: Coordinates,
    pub destination: Coordinates,
    pub stopovers: Vec<Coordinates>,
    pub travel_mode: TravelMode,
    pub avoid_highways: bool,
    pub waypoint_order: WaypointOrder,
}

/// Candidate routes, best first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DirectionsResponse {
    pub routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DirectionsRoute {
    pub legs: Vec<RouteLeg>,
    /// Order the provider visited the stopovers in. Only meaningful when
    /// the request allowed [`WaypointOrder::Optimize`].
    pub waypoint_order: Vec<usize>,
}

/// Routing provider capability: leg geometry, distances and durations.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    async fn directions(&self, request: &DirectionsRequest) -> Result<DirectionsResponse>;
}

/// Google Directions web service client.
#[derive(Clone)]
pub struct DirectionsClient {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl DirectionsClient {
    /// Client for the configured endpoint, bounded by the routing timeout
    pub fn from_config(config: &Config) -> Self {
        Self::with_config(
            config.maps_api_key.clone(),
            config.directions_base_url.clone(),
            config.itinerary.routing_timeout,
        )
    }

    pub fn with_config(api_key: String, base_url: String, timeout: Duration) -> Self {
        DirectionsClient {
            client: Client::new(),
            api_key,
            base_url,
            timeout,
        }
    }

    /// Query parameters for a request, excluding the API key
    fn query_params(request: &DirectionsRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("origin", request.origin.to_param()),
            ("destination", request.destination.to_param()),
            ("mode", request.travel_mode.provider_mode().to_string()),
        ];

        if !request.stopovers.is_empty() {
            let joined = request
                .stopovers
                .iter()
                .map(Coordinates::to_param)
                .collect::<Vec<_>>()
                .join("|");
            let waypoints = match request.waypoint_order {
                WaypointOrder::Preserve => joined,
                WaypointOrder::Optimize => format!("optimize:true|{}", joined),
            };
            params.push(("waypoints", waypoints));
        }

        if request.avoid_highways {
            params.push(("avoid", "highways".to_string()));
        }

        params
    }
}

#[async_trait]
impl RoutingProvider for DirectionsClient {
    async fn directions(&self, request: &DirectionsRequest) -> Result<DirectionsResponse> {
        if request.stopovers.len() > MAX_STOPOVERS {
            return Err(AppError::RoutingRejected(format!(
                "Maximum {} stopovers allowed, got {}",
                MAX_STOPOVERS,
                request.stopovers.len()
            )));
        }

        tracing::debug!(
            stopovers = request.stopovers.len(),
            mode = %request.travel_mode,
            avoid_highways = request.avoid_highways,
            "Directions API request: {} stopovers, mode {}",
            request.stopovers.len(), request.travel_mode
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&Self::query_params(request))
            .query(&[("key", &self.api_key)])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::RoutingUnavailable(format!(
                        "Request timed out after {}ms",
                        self.timeout.as_millis()
                    ))
                } else {
                    AppError::RoutingUnavailable(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(
                status = %status,
                "Directions API HTTP error {}: {}",
                status, error_text
            );
            let message = format!("HTTP {}: {}", status, error_text);
            return Err(if status.is_server_error() {
                AppError::RoutingUnavailable(message)
            } else {
                AppError::RoutingRejected(message)
            });
        }

        let directions: GoogleDirectionsApiResponse = response
            .json()
            .await
            .map_err(|e| AppError::RoutingUnavailable(format!("Failed to parse response: {}", e)))?;

        check_status(&directions.status, directions.error_message.as_deref())?;

        tracing::debug!(
            routes = directions.routes.len(),
            legs = directions.routes.first().map_or(0, |r| r.legs.len()),
            "Directions API response: {} candidate routes",
            directions.routes.len()
        );

        Ok(DirectionsResponse {
            routes: directions
                .routes
                .into_iter()
                .map(GoogleRoute::into_route)
                .collect(),
        })
    }
}

/// Map a Directions API status string onto the routing error taxonomy
fn check_status(status: &str, error_message: Option<&str>) -> Result<()> {
    let detail = || match error_message {
        Some(message) => format!("{}: {}", status, message),
        None => status.to_string(),
    };

    match status {
        "OK" => Ok(()),
        // Quota and server-side hiccups clear up on their own
        "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" | "UNKNOWN_ERROR" => {
            tracing::warn!("Directions API transient status {}", status);
            Err(AppError::RoutingUnavailable(detail()))
        }
        _ => {
            tracing::warn!("Directions API status {}", status);
            Err(AppError::RoutingRejected(detail()))
        }
    }
}

// Google Directions API response types

#[derive(Debug, Deserialize)]
struct GoogleDirectionsApiResponse {
    status: String,
    #[serde(default)]
    routes: Vec<GoogleRoute>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleRoute {
    #[serde(default)]
    legs: Vec<GoogleLeg>,
    #[serde(default)]
    waypoint_order: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct GoogleLeg {
    #[serde(default)]
    start_address: String,
    #[serde(default)]
    end_address: String,
    start_location: GoogleLatLng,
    end_location: GoogleLatLng,
    distance: GoogleValue,
    duration: GoogleValue,
}

#[derive(Debug, Deserialize)]
struct GoogleLatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct GoogleValue {
    value: u64,
}

impl GoogleRoute {
    fn into_route(self) -> DirectionsRoute {
        DirectionsRoute {
            legs: self
                .legs
                .into_iter()
                .map(|leg| RouteLeg {
                    start_address: leg.start_address,
                    end_address: leg.end_address,
                    start: Coordinates {
                        lat: leg.start_location.lat,
                        lng: leg.start_location.lng,
                    },
                    end: Coordinates {
                        lat: leg.end_location.lat,
                        lng: leg.end_location.lng,
                    },
                    distance_meters: leg.distance.value,
                    duration_seconds: leg.duration.value,
                })
                .collect(),
            waypoint_order: self.waypoint_order,
        }
    }
}
