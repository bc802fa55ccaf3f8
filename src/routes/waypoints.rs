use crate::error::{AppError, Result};
use crate::models::{Coordinates, Waypoint};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct AddWaypointRequest {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct PinRequest {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize)]
pub struct AddedWaypoint {
    pub index: usize,
    pub waypoint: Waypoint,
}

/// GET /waypoints
pub async fn list_waypoints(State(state): State<Arc<AppState>>) -> Json<Vec<Waypoint>> {
    Json(state.itinerary.waypoints())
}

/// POST /waypoints
pub async fn add_waypoint(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddWaypointRequest>,
) -> Result<(StatusCode, Json<AddedWaypoint>)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidRequest(
            "Waypoint name must not be empty".to_string(),
        ));
    }
    let waypoint =
        Waypoint::new(name, request.lat, request.lng).map_err(AppError::InvalidRequest)?;

    let index = state.itinerary.append_waypoint(waypoint.clone());
    Ok((StatusCode::CREATED, Json(AddedWaypoint { index, waypoint })))
}

/// POST /waypoints/pin
/// Add a map pin, named by reverse geocoding. Nothing is added if the lookup fails.
pub async fn add_pin(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PinRequest>,
) -> Result<(StatusCode, Json<AddedWaypoint>)> {
    let at = Coordinates::new(request.lat, request.lng).map_err(AppError::InvalidRequest)?;

    let name = match state.geocoder.reverse_geocode(at).await? {
        Some(address) => address,
        None => {
            tracing::debug!(lat = at.lat, lng = at.lng, "No address for pin, using coordinates");
            at.to_string()
        }
    };

    let waypoint = Waypoint::new(name, at.lat, at.lng).map_err(AppError::InvalidRequest)?;
    let index = state.itinerary.append_waypoint(waypoint.clone());
    Ok((StatusCode::CREATED, Json(AddedWaypoint { index, waypoint })))
}

/// DELETE /waypoints/{index}
pub async fn remove_waypoint(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<Json<Waypoint>> {
    let removed = state.itinerary.remove_waypoint(index)?;
    tracing::debug!(index = index, name = %removed.name, "Removed waypoint");
    Ok(Json(removed))
}

/// DELETE /waypoints
pub async fn clear_waypoints(State(state): State<Arc<AppState>>) -> StatusCode {
    state.itinerary.clear_waypoints();
    StatusCode::NO_CONTENT
}
