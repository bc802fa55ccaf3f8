use crate::models::{Coordinates, VisitOrder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
}

impl TravelMode {
    /// Returns the Directions API mode name for this travel mode
    pub fn provider_mode(&self) -> &str {
        match self {
            TravelMode::Driving => "driving",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.provider_mode())
    }
}

/// Whether the routing provider may reorder stopovers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WaypointOrder {
    /// Visit stopovers exactly in the solver's order.
    #[default]
    Preserve,
    /// Let the provider re-optimise the stopovers between fixed endpoints.
    Optimize,
}

impl FromStr for WaypointOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "preserve" => Ok(WaypointOrder::Preserve),
            "optimize" | "optimise" => Ok(WaypointOrder::Optimize),
            _ => Err(format!("Invalid waypoint order: '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RouteOptions {
    #[serde(default)]
    pub avoid_highways: bool,
    /// Return to the origin after the last stop
    #[serde(default)]
    pub round_trip: bool,
    #[serde(default)]
    pub waypoint_order: WaypointOrder,
}

/// One provider-computed hop between two consecutive stops.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteLeg {
    pub start_address: String,
    pub end_address: String,
    pub start: Coordinates,
    pub end: Coordinates,
    pub distance_meters: u64,
    pub duration_seconds: u64,
}

/// Legs in visiting order, plus the order of store indices they realise.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedRoute {
    pub legs: Vec<RouteLeg>,
    pub visit_order: Vec<usize>,
}

impl ResolvedRoute {
    pub fn new(legs: Vec<RouteLeg>, visit_order: VisitOrder) -> Self {
        ResolvedRoute {
            legs,
            visit_order: visit_order.into_inner(),
        }
    }

    pub fn total_distance_meters(&self) -> u64 {
        self.legs.iter().map(|leg| leg.distance_meters).sum()
    }

    pub fn total_distance_km(&self) -> f64 {
        self.total_distance_meters() as f64 / 1000.0
    }

    pub fn total_duration_seconds(&self) -> u64 {
        self.legs.iter().map(|leg| leg.duration_seconds).sum()
    }

    pub fn origin(&self) -> Option<Coordinates> {
        self.legs.first().map(|leg| leg.start)
    }

    pub fn destination(&self) -> Option<Coordinates> {
        self.legs.last().map(|leg| leg.end)
    }

    pub fn summary(&self) -> RouteSummary {
        let mut steps: Vec<RouteStep> = self
            .legs
            .iter()
            .enumerate()
            .map(|(i, leg)| RouteStep {
                number: i + 1,
                address: leg.start_address.clone(),
                location: leg.start,
                distance_meters: Some(leg.distance_meters),
                duration_seconds: Some(leg.duration_seconds),
            })
            .collect();

        if let Some(last) = self.legs.last() {
            steps.push(RouteStep {
                number: self.legs.len() + 1,
                address: last.end_address.clone(),
                location: last.end,
                distance_meters: None,
                duration_seconds: None,
            });
        }

        RouteSummary {
            stops: steps.len(),
            total_distance_km: self.total_distance_km(),
            total_duration_seconds: self.total_duration_seconds(),
            formatted_duration: format_duration(self.total_duration_seconds()),
            steps,
        }
    }
}

/// Human-oriented view of a resolved route.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteSummary {
    pub stops: usize,
    pub total_distance_km: f64,
    pub total_duration_seconds: u64,
    pub formatted_duration: String,
    pub steps: Vec<RouteStep>,
}

/// A numbered stop; the distance and duration are those of the leg leaving it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteStep {
    pub number: usize,
    pub address: String,
    pub location: Coordinates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
}

/// `"42 min"` under an hour, `"2 h 5 min"` otherwise. Rounds to the nearest minute.
pub fn format_duration(seconds: u64) -> String {
    let minutes = (seconds + 30) / 60;
    if minutes < 60 {
        format!("{} min", minutes)
    } else {
        format!("{} h {} min", minutes / 60, minutes % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(from: (f64, f64), to: (f64, f64), meters: u64, seconds: u64) -> RouteLeg {
        RouteLeg {
            start_address: format!("{},{}", from.0, from.1),
            end_address: format!("{},{}", to.0, to.1),
            start: Coordinates::new(from.0, from.1).unwrap(),
            end: Coordinates::new(to.0, to.1).unwrap(),
            distance_meters: meters,
            duration_seconds: seconds,
        }
    }

    #[test]
    fn test_route_totals() {
        let route = ResolvedRoute::new(
            vec![
                leg((0.0, 0.0), (1.0, 1.0), 1500, 600),
                leg((1.0, 1.0), (0.0, 1.0), 2740, 3000),
            ],
            VisitOrder::from_indices(vec![0, 2, 1], 3).unwrap(),
        );

        assert_eq!(route.total_distance_meters(), 4240);
        assert_eq!(route.total_distance_km(), 4.24);
        assert_eq!(route.total_duration_seconds(), 3600);
        assert_eq!(route.origin(), Some(Coordinates { lat: 0.0, lng: 0.0 }));
        assert_eq!(route.destination(), Some(Coordinates { lat: 0.0, lng: 1.0 }));
        assert_eq!(route.visit_order, vec![0, 2, 1]);
    }

    #[test]
    fn test_summary_lists_every_stop() {
        let route = ResolvedRoute::new(
            vec![
                leg((0.0, 0.0), (1.0, 1.0), 1000, 60),
                leg((1.0, 1.0), (0.0, 1.0), 1000, 60),
            ],
            VisitOrder::identity(3),
        );

        let summary = route.summary();
        assert_eq!(summary.stops, 3);
        assert_eq!(summary.steps[0].number, 1);
        assert_eq!(summary.steps[0].address, "0,0");
        assert_eq!(summary.steps[0].distance_meters, Some(1000));
        assert_eq!(summary.steps[2].address, "0,1");
        assert_eq!(summary.steps[2].distance_meters, None);
        assert_eq!(summary.formatted_duration, "2 min");
    }

    #[test]
    fn test_empty_route_summary() {
        let route = ResolvedRoute::new(vec![], VisitOrder::identity(0));
        let summary = route.summary();
        assert_eq!(summary.stops, 0);
        assert!(summary.steps.is_empty());
        assert_eq!(route.origin(), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0 min");
        assert_eq!(format_duration(89), "1 min");
        assert_eq!(format_duration(59 * 60), "59 min");
        assert_eq!(format_duration(3600), "1 h 0 min");
        assert_eq!(format_duration(3720), "1 h 2 min");
        assert_eq!(format_duration(26 * 3600 + 5 * 60), "26 h 5 min");
    }

    #[test]
    fn test_route_options_defaults() {
        let options: RouteOptions = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(options, RouteOptions::default());
        assert!(!options.avoid_highways);
        assert!(!options.round_trip);
        assert_eq!(options.waypoint_order, WaypointOrder::Preserve);

        let options: RouteOptions =
            serde_json::from_value(serde_json::json!({"avoid_highways": true, "waypoint_order": "optimize"}))
                .unwrap();
        assert!(options.avoid_highways);
        assert_eq!(options.waypoint_order, WaypointOrder::Optimize);
    }

    #[test]
    fn test_travel_mode() {
        assert_eq!(TravelMode::Driving.provider_mode(), "driving");
        assert_eq!(TravelMode::default().to_string(), "driving");
        assert_eq!("OPTIMISE".parse::<WaypointOrder>().unwrap(), WaypointOrder::Optimize);
    }
}
