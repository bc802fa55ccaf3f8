use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use thiserror::Error;

use crate::constants::MIN_WAYPOINTS;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("At least {} waypoints are required, got {count}", MIN_WAYPOINTS)]
    InsufficientWaypoints { count: usize },

    #[error("An itinerary computation is already in progress")]
    ComputeInProgress,

    #[error("Solver unavailable: {0}")]
    SolverUnavailable(String),

    #[error("Solver rejected the request: {0}")]
    SolverRejected(String),

    #[error("Malformed solver response: {0}")]
    MalformedSolverResponse(String),

    #[error("Routing provider unavailable: {0}")]
    RoutingUnavailable(String),

    #[error("Routing provider rejected the request: {0}")]
    RoutingRejected(String),

    #[error("Route has no legs")]
    EmptyRoute,

    #[error("Waypoint index {index} out of range (store holds {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Geocoding failed: {0}")]
    Geocoding(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Fieldless mirror of [`AppError`], stored in snapshots and sent to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InsufficientWaypoints,
    ComputeInProgress,
    SolverUnavailable,
    SolverRejected,
    MalformedSolverResponse,
    RoutingUnavailable,
    RoutingRejected,
    EmptyRoute,
    IndexOutOfRange,
    ConfigurationError,
    Geocoding,
    InvalidRequest,
}

/// The pipeline stage a compute failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Solving,
    Routing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Solving => write!(f, "solving"),
            Stage::Routing => write!(f, "routing"),
        }
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InsufficientWaypoints { .. } => ErrorKind::InsufficientWaypoints,
            AppError::ComputeInProgress => ErrorKind::ComputeInProgress,
            AppError::SolverUnavailable(_) => ErrorKind::SolverUnavailable,
            AppError::SolverRejected(_) => ErrorKind::SolverRejected,
            AppError::MalformedSolverResponse(_) => ErrorKind::MalformedSolverResponse,
            AppError::RoutingUnavailable(_) => ErrorKind::RoutingUnavailable,
            AppError::RoutingRejected(_) => ErrorKind::RoutingRejected,
            AppError::EmptyRoute => ErrorKind::EmptyRoute,
            AppError::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            AppError::Configuration(_) => ErrorKind::ConfigurationError,
            AppError::Geocoding(_) => ErrorKind::Geocoding,
            AppError::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }

    /// Which side of the pipeline failed, if the error came from one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            AppError::SolverUnavailable(_)
            | AppError::SolverRejected(_)
            | AppError::MalformedSolverResponse(_) => Some(Stage::Solving),
            AppError::RoutingUnavailable(_)
            | AppError::RoutingRejected(_)
            | AppError::EmptyRoute => Some(Stage::Routing),
            _ => None,
        }
    }

    /// Transport-level failures are the only ones worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::SolverUnavailable(_) | AppError::RoutingUnavailable(_)
        )
    }
}

// Convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::InsufficientWaypoints { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ComputeInProgress => StatusCode::CONFLICT,
            AppError::SolverUnavailable(ref e) => {
                tracing::error!("Solver unavailable: {}", e);
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::SolverRejected(ref e) => {
                tracing::warn!("Solver rejected request: {}", e);
                StatusCode::BAD_GATEWAY
            }
            AppError::MalformedSolverResponse(ref e) => {
                tracing::error!("Malformed solver response: {}", e);
                StatusCode::BAD_GATEWAY
            }
            AppError::RoutingUnavailable(ref e) => {
                tracing::error!("Routing provider unavailable: {}", e);
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::RoutingRejected(ref e) => {
                tracing::warn!("Routing provider rejected request: {}", e);
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::EmptyRoute => StatusCode::NOT_FOUND,
            AppError::IndexOutOfRange { .. } => StatusCode::NOT_FOUND,
            AppError::Configuration(ref e) => {
                tracing::error!("Configuration error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Geocoding(ref e) => {
                tracing::warn!("Geocoding failed: {}", e);
                StatusCode::BAD_GATEWAY
            }
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({
            "error": status.canonical_reason().unwrap_or("Unknown error"),
            "message": self.to_string(),
            "kind": self.kind(),
            "stage": self.stage(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
