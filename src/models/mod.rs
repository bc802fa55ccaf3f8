pub mod coordinates;
pub mod itinerary;
pub mod route;
pub mod strategy;
pub mod visit_order;
pub mod waypoint;

pub use coordinates::Coordinates;
pub use itinerary::{FailureReport, ItinerarySettings, ItinerarySnapshot, ItineraryView, Phase};
pub use route::{ResolvedRoute, RouteLeg, RouteOptions, RouteSummary, TravelMode, WaypointOrder};
pub use strategy::SolverStrategy;
pub use visit_order::VisitOrder;
pub use waypoint::Waypoint;
