use crate::error::{AppError, Result};
use crate::models::{
    ItinerarySettings, ItinerarySnapshot, ItineraryView, RouteSummary, SolverStrategy,
    WaypointOrder,
};
use crate::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Partial settings change; absent fields keep their current value.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsUpdate {
    pub strategy: Option<SolverStrategy>,
    pub avoid_highways: Option<bool>,
    pub round_trip: Option<bool>,
    pub waypoint_order: Option<WaypointOrder>,
}

impl SettingsUpdate {
    pub fn apply(self, mut settings: ItinerarySettings) -> ItinerarySettings {
        if let Some(strategy) = self.strategy {
            settings.strategy = strategy;
        }
        if let Some(avoid_highways) = self.avoid_highways {
            settings.options.avoid_highways = avoid_highways;
        }
        if let Some(round_trip) = self.round_trip {
            settings.options.round_trip = round_trip;
        }
        if let Some(waypoint_order) = self.waypoint_order {
            settings.options.waypoint_order = waypoint_order;
        }
        settings
    }
}

#[derive(Debug, Serialize)]
pub struct ShareLinkResponse {
    pub url: String,
}

/// GET /itinerary
pub async fn get_itinerary(State(state): State<Arc<AppState>>) -> Json<ItineraryView> {
    Json(state.itinerary.view())
}

/// GET /itinerary/settings
pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<ItinerarySettings> {
    Json(state.itinerary.settings())
}

/// PUT /itinerary/settings
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(update): Json<SettingsUpdate>,
) -> Json<ItinerarySettings> {
    let settings = update.apply(state.itinerary.settings());
    state.itinerary.update_settings(settings);
    tracing::debug!(strategy = %settings.strategy, "Itinerary settings updated");
    Json(settings)
}

/// POST /itinerary/compute
/// Solve and route the current waypoints with the selected settings
pub async fn compute(State(state): State<Arc<AppState>>) -> Result<Json<Arc<ItinerarySnapshot>>> {
    let snapshot = state.itinerary.compute_current().await?;
    Ok(Json(snapshot))
}

/// GET /itinerary/summary
pub async fn get_summary(State(state): State<Arc<AppState>>) -> Result<Json<RouteSummary>> {
    let route = state
        .itinerary
        .snapshot()
        .and_then(|snapshot| snapshot.route.clone())
        .ok_or(AppError::EmptyRoute)?;
    Ok(Json(route.summary()))
}

/// GET /itinerary/share
pub async fn get_share_link(State(state): State<Arc<AppState>>) -> Result<Json<ShareLinkResponse>> {
    let route = state
        .itinerary
        .snapshot()
        .and_then(|snapshot| snapshot.route.clone())
        .ok_or(AppError::EmptyRoute)?;
    let url = state.share_links.encode(&route)?;
    Ok(Json(ShareLinkResponse { url }))
}

/// POST /itinerary/reset
pub async fn reset(State(state): State<Arc<AppState>>) -> Json<ItineraryView> {
    state.itinerary.reset();
    Json(state.itinerary.view())
}
