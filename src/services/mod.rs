pub mod directions;
pub mod geocoding;
pub mod itinerary;
pub mod route_resolver;
pub mod share_link;
pub mod solver;
pub mod waypoint_store;

pub use directions::{DirectionsClient, DirectionsRequest, DirectionsResponse, DirectionsRoute, RoutingProvider};
pub use geocoding::{Geocoder, GeocodingClient};
pub use itinerary::ItineraryState;
pub use route_resolver::RouteResolver;
pub use share_link::ShareLinkEncoder;
pub use solver::{Solver, SolverClient};
pub use waypoint_store::WaypointStore;
