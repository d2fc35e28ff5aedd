//! Geometric calculations on the planning grid

use crate::types::{Coordinates, Location};

/// Integer units per grid unit used by the analytical distance
pub const DISTANCE_SCALE: f64 = 100.0;

/// Straight-line distance between two grid points
pub fn euclidean_distance(from: &Location, to: &Location) -> f64 {
    (from.x - to.x).hypot(from.y - to.y)
}

/// Euclidean distance in scaled integer units
pub fn scaled_distance(from: &Location, to: &Location) -> i64 {
    (euclidean_distance(from, to) * DISTANCE_SCALE) as i64
}

/// Calculate the scaled distance matrix between all points
/// Returns a 2D vector where matrix[i][j] is the distance from point i to point j
pub fn distance_matrix(points: &[Location]) -> Vec<Vec<i64>> {
    let n = points.len();
    let mut matrix = vec![vec![0; n]; n];

    for i in 0..n {
        for j in 0..n {
            if i != j {
                matrix[i][j] = scaled_distance(&points[i], &points[j]);
            }
        }
    }

    matrix
}

/// Maps grid points onto latitude/longitude around an anchor.
///
/// Latitude follows `y`, longitude follows `x`. The grid offset shifts points so
/// the usual [20, 100] grid lands inland, north-east of the anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoProjection {
    pub anchor: Coordinates,
    pub degrees_per_unit: f64,
    pub grid_offset: f64,
}

impl Default for GeoProjection {
    fn default() -> Self {
        Self {
            anchor: Coordinates { lat: 34.0522, lng: -118.2437 },
            degrees_per_unit: 0.08,
            grid_offset: 20.0,
        }
    }
}

impl GeoProjection {
    pub fn project(&self, location: &Location) -> Coordinates {
        Coordinates {
            lat: self.anchor.lat + (location.y - self.grid_offset) * self.degrees_per_unit,
            lng: self.anchor.lng + (location.x - self.grid_offset) * self.degrees_per_unit,
        }
    }

    pub fn project_all(&self, locations: &[Location]) -> Vec<Coordinates> {
        locations.iter().map(|l| self.project(l)).collect()
    }
}
