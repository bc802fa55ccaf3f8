//! Stable application-wide constants.
//!
//! Values here are structural invariants, provider limits, and default
//! fallbacks for env-var-based configuration. Runtime tuning knobs live in
//! [`ItineraryConfig`](crate::config::ItineraryConfig).

// --- Server defaults (used when HOST / PORT env vars are absent) ---

/// Default bind address for the HTTP server.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default port for the HTTP server.
pub const DEFAULT_PORT: &str = "3000";

// --- External service defaults ---

/// Google Directions web service endpoint. Overridden by `DIRECTIONS_BASE_URL`.
pub const DEFAULT_DIRECTIONS_BASE_URL: &str =
    "https://maps.googleapis.com/maps/api/directions/json";
/// Google Geocoding web service endpoint. Overridden by `GEOCODING_BASE_URL`.
pub const DEFAULT_GEOCODING_BASE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
/// Host used when building shareable direction links. Overridden by `SHARE_MAPS_HOST`.
pub const DEFAULT_SHARE_MAPS_HOST: &str = "www.google.com";

// --- Compute policy defaults (used when env vars are absent) ---

/// Per-attempt bound on a solver call. Overridden by `SOLVER_TIMEOUT_SECS`.
pub const DEFAULT_SOLVER_TIMEOUT_SECS: u64 = 30;
/// Per-attempt bound on a routing call. Overridden by `ROUTING_TIMEOUT_SECS`.
pub const DEFAULT_ROUTING_TIMEOUT_SECS: u64 = 15;
/// Retries on transient failures per stage. Overridden by `COMPUTE_MAX_RETRIES`.
pub const DEFAULT_COMPUTE_MAX_RETRIES: u32 = 2;
/// First backoff delay; doubles on each retry. Overridden by `COMPUTE_RETRY_BACKOFF_MS`.
pub const DEFAULT_COMPUTE_RETRY_BACKOFF_MS: u64 = 500;

// --- Structural limits ---

/// Fewest waypoints an itinerary can be computed for.
pub const MIN_WAYPOINTS: usize = 2;
/// Google Directions accepts at most 25 intermediate waypoints per request.
pub const MAX_STOPOVERS: usize = 25;
/// Largest gap (meters) tolerated between one leg's end and the next leg's start.
pub const LEG_CONTINUITY_TOLERANCE_M: f64 = 100.0;
