use crate::constants::{LEG_CONTINUITY_TOLERANCE_M, MIN_WAYPOINTS};
use crate::error::{AppError, Result};
use crate::models::{Coordinates, ResolvedRoute, RouteOptions, TravelMode, VisitOrder, Waypoint, WaypointOrder};
use crate::services::directions::{DirectionsRequest, RoutingProvider};
use std::sync::Arc;

/// Turns a visiting order into concrete driving legs through a routing provider.
#[derive(Clone)]
pub struct RouteResolver {
    provider: Arc<dyn RoutingProvider>,
}

impl RouteResolver {
    pub fn new(provider: Arc<dyn RoutingProvider>) -> Self {
        RouteResolver { provider }
    }

    /// Resolve `waypoints` visited in `order` into a route.
    ///
    /// The first waypoint in `order` is the origin and the last the
    /// destination; everything between is a stopover. With
    /// `options.round_trip` the origin is also the destination and every
    /// other waypoint is a stopover. The provider is told to keep the
    /// stopover order unless `options.waypoint_order` opts into
    /// [`WaypointOrder::Optimize`].
    ///
    /// Single attempt; retries belong to the caller.
    pub async fn resolve(
        &self,
        waypoints: &[Waypoint],
        order: &VisitOrder,
        options: &RouteOptions,
    ) -> Result<ResolvedRoute> {
        // A caller bug, not a solver or provider failure
        if order.len() != waypoints.len() {
            return Err(AppError::InvalidRequest(format!(
                "order covers {} waypoints, {} were given",
                order.len(),
                waypoints.len()
            )));
        }
        if waypoints.len() < MIN_WAYPOINTS {
            return Err(AppError::InsufficientWaypoints {
                count: waypoints.len(),
            });
        }

        let ordered = order
            .iter()
            .map(|&i| {
                waypoints.get(i).map(Waypoint::coordinates).ok_or_else(|| {
                    AppError::InvalidRequest(format!("order index {} out of range", i))
                })
            })
            .collect::<Result<Vec<Coordinates>>>()?;

        let request = build_request(&ordered, options)?;
        let expected_legs = request.stopovers.len() + 1;

        tracing::debug!(
            waypoints = waypoints.len(),
            stopovers = request.stopovers.len(),
            round_trip = options.round_trip,
            "Resolving route for order {:?}",
            &**order
        );

        let response = self.provider.directions(&request).await?;

        let candidate = response.routes.into_iter().next().ok_or_else(|| {
            tracing::warn!("Routing provider returned no candidate routes");
            AppError::RoutingRejected("No route found".to_string())
        })?;

        if candidate.legs.is_empty() {
            return Err(AppError::EmptyRoute);
        }
        if candidate.legs.len() != expected_legs {
            tracing::warn!(
                expected = expected_legs,
                got = candidate.legs.len(),
                "Routing provider returned the wrong number of legs"
            );
            return Err(AppError::RoutingRejected(format!(
                "Expected {} legs, got {}",
                expected_legs,
                candidate.legs.len()
            )));
        }

        for (i, pair) in candidate.legs.windows(2).enumerate() {
            let gap_m = pair[0].end.distance_to(&pair[1].start) * 1000.0;
            if gap_m > LEG_CONTINUITY_TOLERANCE_M {
                tracing::warn!(
                    leg = i,
                    gap_m = gap_m,
                    "Route legs {} and {} do not connect ({:.0} m apart)",
                    i, i + 1, gap_m
                );
                return Err(AppError::RoutingRejected(format!(
                    "Leg {} ends {:.0} m from where leg {} starts",
                    i,
                    gap_m,
                    i + 1
                )));
            }
        }

        let visit_order = match options.waypoint_order {
            WaypointOrder::Preserve => order.clone(),
            WaypointOrder::Optimize => {
                apply_provider_order(order, &candidate.waypoint_order, options.round_trip)?
            }
        };

        let route = ResolvedRoute::new(candidate.legs, visit_order);
        tracing::info!(
            legs = route.legs.len(),
            distance_km = %format!("{:.2}", route.total_distance_km()),
            duration_min = route.total_duration_seconds() / 60,
            "Resolved route: {} legs, {:.2}km",
            route.legs.len(), route.total_distance_km()
        );
        Ok(route)
    }
}

/// Split ordered coordinates into origin, stopovers and destination
fn build_request(ordered: &[Coordinates], options: &RouteOptions) -> Result<DirectionsRequest> {
    let (origin, rest) = ordered
        .split_first()
        .ok_or(AppError::InsufficientWaypoints { count: 0 })?;

    let (destination, stopovers) = if options.round_trip {
        (*origin, rest.to_vec())
    } else {
        let (destination, middle) = rest
            .split_last()
            .ok_or(AppError::InsufficientWaypoints { count: 1 })?;
        (*destination, middle.to_vec())
    };

    Ok(DirectionsRequest {
        origin: *origin,
        destination,
        stopovers,
        travel_mode: TravelMode::Driving,
        avoid_highways: options.avoid_highways,
        waypoint_order: options.waypoint_order,
    })
}

/// Rewrite `order` so its stopover segment follows the provider's reordering
fn apply_provider_order(
    order: &VisitOrder,
    provider_order: &[usize],
    round_trip: bool,
) -> Result<VisitOrder> {
    let stop_end = if round_trip { order.len() } else { order.len() - 1 };
    let stopovers = &order[1..stop_end];

    if provider_order.is_empty() && stopovers.len() <= 1 {
        return Ok(order.clone());
    }

    let reordering = VisitOrder::from_indices(provider_order.to_vec(), stopovers.len())
        .map_err(|_| {
            AppError::RoutingRejected(format!(
                "Provider waypoint order {:?} is not a permutation of {} stopovers",
                provider_order,
                stopovers.len()
            ))
        })?;

    let mut indices = Vec::with_capacity(order.len());
    indices.push(order[0]);
    indices.extend(reordering.iter().map(|&i| stopovers[i]));
    indices.extend_from_slice(&order[stop_end..]);

    VisitOrder::from_indices(indices, order.len())
}
