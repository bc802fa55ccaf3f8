use crate::error::{AppError, ErrorKind, Stage};
use crate::models::{ResolvedRoute, RouteOptions, SolverStrategy, Waypoint};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Computing,
    Ready,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Computing => write!(f, "computing"),
            Phase::Ready => write!(f, "ready"),
            Phase::Failed => write!(f, "failed"),
        }
    }
}

/// What went wrong in a failed compute, in a form fit for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailureReport {
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    pub message: String,
}

impl From<&AppError> for FailureReport {
    fn from(error: &AppError) -> Self {
        FailureReport {
            kind: error.kind(),
            stage: error.stage(),
            message: error.to_string(),
        }
    }
}

/// Strategy and route options that persist across computations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ItinerarySettings {
    pub strategy: SolverStrategy,
    #[serde(flatten)]
    pub options: RouteOptions,
}

/// Immutable outcome of one compute request.
///
/// A failed snapshot keeps the route of the snapshot it supersedes so the
/// last good itinerary stays on display.
#[derive(Debug, Clone, Serialize)]
pub struct ItinerarySnapshot {
    pub id: Uuid,
    pub phase: Phase,
    pub waypoints: Vec<Waypoint>,
    pub strategy: SolverStrategy,
    pub options: RouteOptions,
    pub route: Option<Arc<ResolvedRoute>>,
    pub error: Option<FailureReport>,
    #[serde(with = "time::serde::rfc3339")]
    pub computed_at: OffsetDateTime,
    /// Store revision the waypoints were copied at
    #[serde(skip)]
    pub store_revision: u64,
}

impl ItinerarySnapshot {
    pub fn ready(
        waypoints: Vec<Waypoint>,
        settings: ItinerarySettings,
        route: ResolvedRoute,
        store_revision: u64,
    ) -> Self {
        ItinerarySnapshot {
            id: Uuid::new_v4(),
            phase: Phase::Ready,
            waypoints,
            strategy: settings.strategy,
            options: settings.options,
            route: Some(Arc::new(route)),
            error: None,
            computed_at: OffsetDateTime::now_utc(),
            store_revision,
        }
    }

    pub fn failed(
        waypoints: Vec<Waypoint>,
        settings: ItinerarySettings,
        error: &AppError,
        previous_route: Option<Arc<ResolvedRoute>>,
        store_revision: u64,
    ) -> Self {
        ItinerarySnapshot {
            id: Uuid::new_v4(),
            phase: Phase::Failed,
            waypoints,
            strategy: settings.strategy,
            options: settings.options,
            route: previous_route,
            error: Some(FailureReport::from(error)),
            computed_at: OffsetDateTime::now_utc(),
            store_revision,
        }
    }
}

/// Everything a view needs to render the itinerary at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct ItineraryView {
    pub phase: Phase,
    pub stale: bool,
    pub settings: ItinerarySettings,
    pub waypoints: Vec<Waypoint>,
    pub snapshot: Option<Arc<ItinerarySnapshot>>,
}
