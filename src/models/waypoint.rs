use crate::models::Coordinates;
use serde::{Deserialize, Serialize};

/// A named point the user wants to visit.
///
/// Waypoints are identified by their position in the store, never by their
/// coordinates, so duplicates are allowed. They are replaced rather than edited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Waypoint {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Result<Self, String> {
        let coordinates = Coordinates::new(lat, lng)?;
        Ok(Waypoint {
            name: name.into(),
            lat: coordinates.lat,
            lng: coordinates.lng,
        })
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lng: self.lng,
        }
    }
}
