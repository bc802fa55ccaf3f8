use crate::constants::{DEFAULT_SOLVER_TIMEOUT_SECS, MIN_WAYPOINTS};
use crate::error::{AppError, Result};
use crate::models::{SolverStrategy, VisitOrder, Waypoint};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Anything that can turn a waypoint set into a visiting order.
///
/// Implementations make a single attempt and must only return orders that
/// passed [`VisitOrder`] validation against `waypoints.len()`.
#[async_trait]
pub trait Solver: Send + Sync {
    async fn solve(&self, strategy: SolverStrategy, waypoints: &[Waypoint]) -> Result<VisitOrder>;
}

/// Client for the solver service, one POST endpoint per strategy.
#[derive(Clone)]
pub struct SolverClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl SolverClient {
    pub fn new(base_url: String) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_SOLVER_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: String, timeout: Duration) -> Self {
        SolverClient {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn endpoint_url(&self, strategy: SolverStrategy) -> String {
        format!("{}{}", self.base_url, strategy.endpoint())
    }

    /// Transport failures, including ones while the body streams, are retryable
    fn transport_error(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::SolverUnavailable(format!(
                "Request timed out after {}ms",
                self.timeout.as_millis()
            ))
        } else {
            AppError::SolverUnavailable(format!("Request failed: {}", e))
        }
    }
}

/// Decode a 2xx body; anything that is not the expected shape is a contract breach
fn decode_response(body: &[u8]) -> Result<SolveResponse> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::MalformedSolverResponse(format!("Failed to parse response: {}", e)))
}

#[async_trait]
impl Solver for SolverClient {
    async fn solve(&self, strategy: SolverStrategy, waypoints: &[Waypoint]) -> Result<VisitOrder> {
        if waypoints.len() < MIN_WAYPOINTS {
            return Err(AppError::InsufficientWaypoints {
                count: waypoints.len(),
            });
        }

        let url = self.endpoint_url(strategy);
        tracing::debug!(
            strategy = %strategy,
            waypoints = waypoints.len(),
            "Solver request: {} waypoints via {}",
            waypoints.len(), strategy
        );

        let response = self
            .client
            .post(&url)
            .json(&SolveRequest {
                locations: waypoints,
            })
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            // The service wraps its message as {"error": "..."}
            let message = serde_json::from_str::<SolveErrorBody>(&error_text)
                .map(|body| body.error)
                .unwrap_or(error_text);
            tracing::warn!(
                status = %status,
                strategy = %strategy,
                "Solver HTTP error {}: {}",
                status, message
            );
            return Err(AppError::SolverRejected(format!("HTTP {}: {}", status, message)));
        }

        let bytes = response.bytes().await.map_err(|e| {
            tracing::warn!(strategy = %strategy, "Solver response body failed: {}", e);
            self.transport_error(e)
        })?;
        let body = decode_response(&bytes)?;

        let path = body
            .path
            .ok_or_else(|| AppError::MalformedSolverResponse("Response has no path".to_string()))?;

        let order = VisitOrder::from_path(&path, waypoints.len()).inspect_err(|e| {
            tracing::warn!(
                strategy = %strategy,
                waypoints = waypoints.len(),
                "Solver returned an invalid path {:?}: {}",
                path, e
            );
        })?;

        tracing::debug!(strategy = %strategy, order = ?&*order, "Solver response accepted");
        Ok(order)
    }
}

// Solver service wire types

#[derive(Debug, Serialize)]
struct SolveRequest<'a> {
    locations: &'a [Waypoint],
}

#[derive(Debug, Deserialize)]
struct SolveResponse {
    path: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize)]
struct SolveErrorBody {
    error: String,
}
