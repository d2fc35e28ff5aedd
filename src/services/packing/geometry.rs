//! Axis-aligned box geometry for collision checks

use crate::types::ContainerDims;

/// Axis-aligned bounding box anchored at its minimum corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Extent along x (container width)
    pub w: f64,
    /// Extent along y (container height)
    pub h: f64,
    /// Extent along z (container depth)
    pub d: f64,
}

impl Aabb {
    pub fn new(corner: [f64; 3], extents: [f64; 3]) -> Self {
        Self {
            x: corner[0],
            y: corner[1],
            z: corner[2],
            w: extents[0],
            h: extents[1],
            d: extents[2],
        }
    }

    /// Two boxes overlap only if they overlap on every axis; touching faces do not count
    pub fn intersects(&self, other: &Aabb) -> bool {
        !(self.x + self.w <= other.x
            || other.x + other.w <= self.x
            || self.y + self.h <= other.y
            || other.y + other.h <= self.y
            || self.z + self.d <= other.z
            || other.z + other.d <= self.z)
    }

    pub fn within(&self, container: &ContainerDims) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.z >= 0.0
            && self.x + self.w <= container.width
            && self.y + self.h <= container.height
            && self.z + self.d <= container.depth
    }

    pub fn center(&self) -> [f64; 3] {
        [
            self.x + self.w / 2.0,
            self.y + self.h / 2.0,
            self.z + self.d / 2.0,
        ]
    }
}

/// Box extents fit the container in the given orientation
pub fn fits_container(extents: [f64; 3], container: &ContainerDims) -> bool {
    extents[0] <= container.width && extents[1] <= container.height && extents[2] <= container.depth
}
