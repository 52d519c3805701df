use std::fmt::Display;

use serde::{Deserialize, Serialize};

//--------------------------------------     Coordinate       --------------------------------------------------------
/// A point on the integer grid the dispatch service operates on.
///
/// All distances in the system are Manhattan distances over these coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: i64,
    pub longitude: i64,
}

impl Coordinate {
    pub fn new(latitude: i64, longitude: i64) -> Self {
        Self { latitude, longitude }
    }

    /// The Manhattan distance between two coordinates: the sum of the absolute latitude and longitude differences.
    pub fn manhattan_distance(&self, other: &Self) -> i64 {
        (self.latitude - other.latitude).abs() + (self.longitude - other.longitude).abs()
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}
