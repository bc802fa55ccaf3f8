use crate::constants::*;
use crate::error::{AppError, Result};
use crate::models::{SolverStrategy, WaypointOrder};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub solver_base_url: String,
    pub maps_api_key: String,
    pub directions_base_url: String,
    pub geocoding_base_url: String,
    pub share_maps_host: String,
    pub itinerary: ItineraryConfig,
}

/// Knobs for the compute pipeline: initial selection, timeouts and retries.
#[derive(Debug, Clone, PartialEq)]
pub struct ItineraryConfig {
    /// Strategy selected until the user picks another
    pub default_strategy: SolverStrategy,

    /// Initial value of the avoid-highways option
    pub avoid_highways: bool,

    /// Initial stopover ordering policy handed to the routing provider
    pub waypoint_order: WaypointOrder,

    /// Bound on one solver attempt
    pub solver_timeout: Duration,

    /// Bound on one routing attempt
    pub routing_timeout: Duration,

    /// Extra attempts per stage after a transient failure
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each subsequent one
    pub retry_backoff: Duration,
}

impl Default for ItineraryConfig {
    fn default() -> Self {
        Self {
            default_strategy: SolverStrategy::default(),
            avoid_highways: false,
            waypoint_order: WaypointOrder::default(),
            solver_timeout: Duration::from_secs(DEFAULT_SOLVER_TIMEOUT_SECS),
            routing_timeout: Duration::from_secs(DEFAULT_ROUTING_TIMEOUT_SECS),
            max_retries: DEFAULT_COMPUTE_MAX_RETRIES,
            retry_backoff: Duration::from_millis(DEFAULT_COMPUTE_RETRY_BACKOFF_MS),
        }
    }
}

/// Read an optional variable, treating blank values as absent
fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn required_var(name: &str) -> Result<String> {
    optional_var(name).ok_or_else(|| AppError::Configuration(format!("{} must be set", name)))
}

fn parsed_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match optional_var(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("Invalid {}: '{}'", name, raw))),
        None => Ok(default),
    }
}

/// Base URLs must be absolute http(s) URLs
fn validate_base_url(name: &str, value: &str) -> Result<()> {
    let url = reqwest::Url::parse(value)
        .map_err(|e| AppError::Configuration(format!("Invalid {} '{}': {}", name, value, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Configuration(format!(
            "{} must be an http(s) URL, got '{}'",
            name, value
        )));
    }
    Ok(())
}

impl ItineraryConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let default_strategy = match optional_var("ITINERARY_DEFAULT_STRATEGY") {
            Some(raw) => raw.parse().map_err(AppError::Configuration)?,
            None => defaults.default_strategy,
        };

        let waypoint_order = match optional_var("ITINERARY_WAYPOINT_ORDER") {
            Some(raw) => raw.parse().map_err(AppError::Configuration)?,
            None => defaults.waypoint_order,
        };

        Ok(Self {
            default_strategy,
            avoid_highways: parsed_var("ITINERARY_AVOID_HIGHWAYS", defaults.avoid_highways)?,
            waypoint_order,
            solver_timeout: Duration::from_secs(parsed_var(
                "SOLVER_TIMEOUT_SECS",
                defaults.solver_timeout.as_secs(),
            )?),
            routing_timeout: Duration::from_secs(parsed_var(
                "ROUTING_TIMEOUT_SECS",
                defaults.routing_timeout.as_secs(),
            )?),
            max_retries: parsed_var("COMPUTE_MAX_RETRIES", defaults.max_retries)?,
            retry_backoff: Duration::from_millis(parsed_var(
                "COMPUTE_RETRY_BACKOFF_MS",
                DEFAULT_COMPUTE_RETRY_BACKOFF_MS,
            )?),
        })
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let solver_base_url = required_var("SOLVER_BASE_URL")?;
        validate_base_url("SOLVER_BASE_URL", &solver_base_url)?;

        let directions_base_url = optional_var("DIRECTIONS_BASE_URL")
            .unwrap_or_else(|| DEFAULT_DIRECTIONS_BASE_URL.to_string());
        validate_base_url("DIRECTIONS_BASE_URL", &directions_base_url)?;
        let geocoding_base_url = optional_var("GEOCODING_BASE_URL")
            .unwrap_or_else(|| DEFAULT_GEOCODING_BASE_URL.to_string());
        validate_base_url("GEOCODING_BASE_URL", &geocoding_base_url)?;

        let itinerary = ItineraryConfig::from_env()?;
        if itinerary.solver_timeout.is_zero() || itinerary.routing_timeout.is_zero() {
            return Err(AppError::Configuration(
                "SOLVER_TIMEOUT_SECS and ROUTING_TIMEOUT_SECS must be positive".to_string(),
            ));
        }

        Ok(Config {
            host: optional_var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parsed_var("PORT", DEFAULT_PORT.parse().unwrap_or(3000))?,
            solver_base_url,
            maps_api_key: required_var("MAPS_API_KEY")?,
            directions_base_url,
            geocoding_base_url,
            share_maps_host: optional_var("SHARE_MAPS_HOST")
                .unwrap_or_else(|| DEFAULT_SHARE_MAPS_HOST.to_string()),
            itinerary,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ALL_VARS: &[&str] = &[
        "SOLVER_BASE_URL",
        "MAPS_API_KEY",
        "DIRECTIONS_BASE_URL",
        "GEOCODING_BASE_URL",
        "SHARE_MAPS_HOST",
        "HOST",
        "PORT",
        "ITINERARY_DEFAULT_STRATEGY",
        "ITINERARY_AVOID_HIGHWAYS",
        "ITINERARY_WAYPOINT_ORDER",
        "SOLVER_TIMEOUT_SECS",
        "ROUTING_TIMEOUT_SECS",
        "COMPUTE_MAX_RETRIES",
        "COMPUTE_RETRY_BACKOFF_MS",
    ];

    fn clear_env() {
        for name in ALL_VARS {
            env::remove_var(name);
        }
    }

    fn set_required() {
        env::set_var("SOLVER_BASE_URL", "http://localhost:5001");
        env::set_var("MAPS_API_KEY", "test-key");
    }

    #[test]
    #[serial]
    fn test_defaults_with_required_vars() {
        clear_env();
        set_required();

        let config = Config::from_env().unwrap();
        assert_eq!(config.solver_base_url, "http://localhost:5001");
        assert_eq!(config.maps_api_key, "test-key");
        assert_eq!(config.server_address(), "0.0.0.0:3000");
        assert_eq!(config.share_maps_host, "www.google.com");
        assert_eq!(config.directions_base_url, DEFAULT_DIRECTIONS_BASE_URL);
        assert_eq!(config.geocoding_base_url, DEFAULT_GEOCODING_BASE_URL);
        assert_eq!(config.itinerary, ItineraryConfig::default());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_solver_url_fails_fast() {
        clear_env();
        env::set_var("MAPS_API_KEY", "test-key");

        let err = Config::from_env().unwrap_err();
        assert_eq!(
            err,
            AppError::Configuration("SOLVER_BASE_URL must be set".to_string())
        );

        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_or_blank_api_key_fails_fast() {
        clear_env();
        env::set_var("SOLVER_BASE_URL", "http://localhost:5001");
        assert!(matches!(
            Config::from_env(),
            Err(AppError::Configuration(ref m)) if m.contains("MAPS_API_KEY")
        ));

        env::set_var("MAPS_API_KEY", "   ");
        assert!(matches!(
            Config::from_env(),
            Err(AppError::Configuration(ref m)) if m.contains("MAPS_API_KEY")
        ));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_base_url_rejected() {
        clear_env();
        set_required();
        env::set_var("SOLVER_BASE_URL", "localhost:5001/solver");
        assert!(matches!(
            Config::from_env(),
            Err(AppError::Configuration(_))
        ));

        env::set_var("SOLVER_BASE_URL", "ftp://solver.example.com");
        assert!(matches!(
            Config::from_env(),
            Err(AppError::Configuration(ref m)) if m.contains("http(s)")
        ));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_itinerary_overrides() {
        clear_env();
        set_required();
        env::set_var("ITINERARY_DEFAULT_STRATEGY", "nearest-neighbor");
        env::set_var("ITINERARY_AVOID_HIGHWAYS", "true");
        env::set_var("ITINERARY_WAYPOINT_ORDER", "optimize");
        env::set_var("SOLVER_TIMEOUT_SECS", "5");
        env::set_var("ROUTING_TIMEOUT_SECS", "60");
        env::set_var("DIRECTIONS_BASE_URL", "http://127.0.0.1:8080/directions");
        env::set_var("COMPUTE_MAX_RETRIES", "0");
        env::set_var("COMPUTE_RETRY_BACKOFF_MS", "10");

        let config = Config::from_env().unwrap();
        assert_eq!(
            config.itinerary.default_strategy,
            SolverStrategy::NearestNeighbor
        );
        assert!(config.itinerary.avoid_highways);
        assert_eq!(config.itinerary.waypoint_order, WaypointOrder::Optimize);
        assert_eq!(config.itinerary.solver_timeout, Duration::from_secs(5));
        assert_eq!(config.itinerary.routing_timeout, Duration::from_secs(60));
        assert_eq!(config.directions_base_url, "http://127.0.0.1:8080/directions");
        assert_eq!(config.itinerary.max_retries, 0);
        assert_eq!(config.itinerary.retry_backoff, Duration::from_millis(10));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_unparsable_numbers_rejected() {
        clear_env();
        set_required();
        env::set_var("COMPUTE_MAX_RETRIES", "lots");
        assert!(matches!(
            Config::from_env(),
            Err(AppError::Configuration(ref m)) if m.contains("COMPUTE_MAX_RETRIES")
        ));

        env::remove_var("COMPUTE_MAX_RETRIES");
        env::set_var("ROUTING_TIMEOUT_SECS", "0");
        assert!(Config::from_env().is_err());

        env::remove_var("ROUTING_TIMEOUT_SECS");
        env::set_var("ITINERARY_DEFAULT_STRATEGY", "genetic");
        assert!(Config::from_env().is_err());

        env::remove_var("ITINERARY_DEFAULT_STRATEGY");
        env::set_var("ITINERARY_WAYPOINT_ORDER", "shuffle");
        assert!(matches!(
            Config::from_env(),
            Err(AppError::Configuration(ref m)) if m.contains("waypoint order")
        ));

        env::remove_var("ITINERARY_WAYPOINT_ORDER");
        env::set_var("GEOCODING_BASE_URL", "not a url");
        assert!(Config::from_env().is_err());

        clear_env();
    }
}
