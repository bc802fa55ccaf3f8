use crate::constants::DEFAULT_SHARE_MAPS_HOST;
use crate::error::{AppError, Result};
use crate::models::{ResolvedRoute, TravelMode};

/// Builds maps deep links (`/maps/dir/?api=1`) that open a resolved route
/// on any device.
#[derive(Debug, Clone)]
pub struct ShareLinkEncoder {
    maps_host: String,
}

impl Default for ShareLinkEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_SHARE_MAPS_HOST)
    }
}

impl ShareLinkEncoder {
    pub fn new(maps_host: impl Into<String>) -> Self {
        ShareLinkEncoder {
            maps_host: maps_host.into(),
        }
    }

    /// Origin is the first leg's start, destination the last leg's end, and
    /// the end of every other leg is an intermediate stop in visiting order.
    pub fn encode(&self, route: &ResolvedRoute) -> Result<String> {
        let (first, last) = match (route.legs.first(), route.legs.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(AppError::EmptyRoute),
        };

        let mut params = vec![
            ("origin", first.start.to_param()),
            ("destination", last.end.to_param()),
        ];

        let intermediate = &route.legs[..route.legs.len() - 1];
        if !intermediate.is_empty() {
            let waypoints = intermediate
                .iter()
                .map(|leg| leg.end.to_param())
                .collect::<Vec<_>>()
                .join("|");
            params.push(("waypoints", waypoints));
        }
        params.push(("travelmode", TravelMode::Driving.provider_mode().to_string()));

        let query = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        Ok(format!("https://{}/maps/dir/?api=1&{}", self.maps_host, query))
    }
}
