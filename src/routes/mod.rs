pub mod debug;
pub mod itinerary;
pub mod waypoints;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/waypoints",
            get(waypoints::list_waypoints)
                .post(waypoints::add_waypoint)
                .delete(waypoints::clear_waypoints),
        )
        .route("/waypoints/pin", post(waypoints::add_pin))
        .route("/waypoints/{index}", delete(waypoints::remove_waypoint))
        .route("/itinerary", get(itinerary::get_itinerary))
        .route(
            "/itinerary/settings",
            get(itinerary::get_settings).put(itinerary::update_settings),
        )
        .route("/itinerary/compute", post(itinerary::compute))
        .route("/itinerary/summary", get(itinerary::get_summary))
        .route("/itinerary/share", get(itinerary::get_share_link))
        .route("/itinerary/reset", post(itinerary::reset))
        .route("/debug/health", get(debug::health_check))
        .with_state(state)
}
