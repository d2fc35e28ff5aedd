//! Row/layer stacking for per-route visualization
//!
//! Units go left to right along the width. A full row moves the cursor back
//! along the depth, a full floor starts a new layer on top of the tallest unit
//! of the current one. Slots are reserved monotonically, so no collision
//! checks are needed.

use tracing::{debug, warn};

use crate::types::ContainerDims;

use super::geometry::Aabb;
use super::{PackUnit, PackingResult, UnplacedReason};

/// Gap between neighbours in a row (cm)
pub const ITEM_GAP: f64 = 2.0;
/// Gap between rows (cm)
pub const ROW_GAP: f64 = 2.0;
/// Gap between layers (cm)
pub const LAYER_GAP: f64 = 5.0;
/// Units rendered per (order, item) line
pub const DISPLAY_CAP: u32 = 10;

#[derive(Debug, Default)]
struct Cursor {
    x: f64,
    y: f64,
    z: f64,
    /// Deepest unit of the current row, gap included
    row_depth: f64,
    /// Tallest unit of the current layer
    layer_height: f64,
}

impl Cursor {
    fn next_row(&mut self) {
        self.x = 0.0;
        self.z += self.row_depth;
        self.row_depth = 0.0;
    }

    fn next_layer(&mut self) {
        self.x = 0.0;
        self.z = 0.0;
        self.y += self.layer_height + LAYER_GAP;
        self.layer_height = 0.0;
        self.row_depth = 0.0;
    }
}

/// Stack units in input order; units that would poke through the ceiling are skipped
pub fn pack(units: &[PackUnit], container: &ContainerDims) -> PackingResult {
    let mut result = PackingResult::default();
    let mut cursor = Cursor::default();

    for unit in units {
        if !unit.has_valid_extents() {
            warn!("Unit {} has invalid extents {:?}, skipped", unit.id, unit.extents);
            result.unplaced.push(unit.unplaced(UnplacedReason::InvalidExtents));
            continue;
        }

        let [w, h, d] = unit.extents;
        if w > container.width || d > container.depth {
            warn!("Unit {} does not fit the container floor, skipped", unit.id);
            result.unplaced.push(unit.unplaced(UnplacedReason::ExceedsContainer));
            continue;
        }

        if cursor.x + w > container.width {
            cursor.next_row();
        }
        if cursor.z + d > container.depth {
            cursor.next_layer();
        }
        if cursor.y + h > container.height {
            debug!("Unit {} would reach {} cm, not rendered", unit.id, cursor.y + h);
            result.unplaced.push(unit.unplaced(UnplacedReason::HeightExceeded));
            continue;
        }

        let slot = Aabb::new([cursor.x, cursor.y, cursor.z], unit.extents);
        result.placed.push(unit.placed_at(&slot));

        cursor.x += w + ITEM_GAP;
        cursor.row_depth = cursor.row_depth.max(d + ROW_GAP);
        cursor.layer_height = cursor.layer_height.max(h);
    }

    let height_exceeded = result
        .unplaced
        .iter()
        .filter(|u| u.reason == UnplacedReason::HeightExceeded)
        .count();
    if height_exceeded > 0 {
        warn!("{} units did not fit under the container ceiling", height_exceeded);
    }

    result
}
