use crate::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// GET /debug/health - Liveness plus a glance at the itinerary
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let view = state.itinerary.view();

    Json(json!({
        "status": "ok",
        "checks": {
            "phase": view.phase,
            "stale": view.stale,
            "waypoints": view.waypoints.len(),
        }
    }))
}
