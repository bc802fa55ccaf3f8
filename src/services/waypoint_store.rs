use crate::error::{AppError, Result};
use crate::models::Waypoint;

/// Ordered, mutable collection of waypoints.
///
/// Insertion order is display order, not route order. Every effective
/// mutation bumps `revision`, which is how snapshots detect that they went
/// stale.
#[derive(Debug, Clone, Default)]
pub struct WaypointStore {
    waypoints: Vec<Waypoint>,
    revision: u64,
}

impl WaypointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append at the end and return the new index
    pub fn append(&mut self, waypoint: Waypoint) -> usize {
        self.waypoints.push(waypoint);
        self.revision += 1;
        self.waypoints.len() - 1
    }

    /// Remove and return the waypoint at `index`; later indices shift down by one
    pub fn remove_at(&mut self, index: usize) -> Result<Waypoint> {
        if index >= self.waypoints.len() {
            return Err(AppError::IndexOutOfRange {
                index,
                len: self.waypoints.len(),
            });
        }
        self.revision += 1;
        Ok(self.waypoints.remove(index))
    }

    pub fn clear(&mut self) {
        if self.waypoints.is_empty() {
            return;
        }
        self.waypoints.clear();
        self.revision += 1;
    }

    /// An owned copy; later mutations of the store never reach it
    pub fn snapshot(&self) -> Vec<Waypoint> {
        self.waypoints.clone()
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn iter(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter()
    }
}
