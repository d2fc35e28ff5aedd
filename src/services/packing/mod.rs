//! Container packing heuristics for cargo visualization
//!
//! Two layouts share one input and output shape:
//! - corner point: first-fit-decreasing over candidate corners with full AABB collision checks
//! - shelf: monotone row/layer stacking, capped per line to keep renders small
//!
//! Placed boxes are reported by their center coordinate.

mod corner_point;
mod geometry;
mod shelf;

pub use shelf::DISPLAY_CAP;

use tracing::debug;

use crate::types::{
    ContainerDims, PackLine, PackResponse, PackingVariant, PlacedBox, UnplacedItem,
};

use geometry::Aabb;

/// Why a unit was left out of the layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnplacedReason {
    /// At least one extent is larger than the container
    ExceedsContainer,
    /// Non-positive or non-finite extents
    InvalidExtents,
    /// Fits the container, but no candidate corner is free
    NoFreeCorner,
    /// The stacking cursor ran past the container ceiling
    HeightExceeded,
}

impl UnplacedReason {
    pub fn code(&self) -> &'static str {
        match self {
            UnplacedReason::ExceedsContainer => "exceeds_container",
            UnplacedReason::InvalidExtents => "invalid_extents",
            UnplacedReason::NoFreeCorner => "no_free_corner",
            UnplacedReason::HeightExceeded => "height_exceeded",
        }
    }
}

impl std::fmt::Display for UnplacedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnplacedReason::ExceedsContainer => write!(f, "item is larger than the container"),
            UnplacedReason::InvalidExtents => write!(f, "item extents must be positive"),
            UnplacedReason::NoFreeCorner => write!(f, "no free position left in the container"),
            UnplacedReason::HeightExceeded => write!(f, "stack would exceed the container height"),
        }
    }
}

/// One physical unit to lay out
#[derive(Debug, Clone, PartialEq)]
pub struct PackUnit {
    /// `{order}-{item}-{n}`, n counting from 1 within the line
    pub id: String,
    pub order_id: String,
    pub item_name: String,
    pub color: String,
    /// (width, height, depth)
    pub extents: [f64; 3],
}

impl PackUnit {
    pub fn volume(&self) -> f64 {
        self.extents.iter().product()
    }

    fn has_valid_extents(&self) -> bool {
        self.extents.iter().all(|e| e.is_finite() && *e > 0.0)
    }

    fn placed_at(&self, aabb: &Aabb) -> PlacedBox {
        let [x, y, z] = aabb.center();
        PlacedBox {
            id: self.id.clone(),
            order_id: self.order_id.clone(),
            item_name: self.item_name.clone(),
            color: self.color.clone(),
            x,
            y,
            z,
            w: aabb.w,
            h: aabb.h,
            d: aabb.d,
        }
    }

    fn unplaced(&self, reason: UnplacedReason) -> Unplaced {
        Unplaced {
            id: self.id.clone(),
            order_id: self.order_id.clone(),
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Unplaced {
    pub id: String,
    pub order_id: String,
    pub reason: UnplacedReason,
}

/// Layout of one container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackingResult {
    pub placed: Vec<PlacedBox>,
    pub unplaced: Vec<Unplaced>,
    /// Units left out by the display cap
    pub truncated: usize,
}

impl PackingResult {
    /// Units that were attempted but not rendered, plus capped ones
    pub fn omitted(&self) -> usize {
        self.unplaced.len() + self.truncated
    }
}

impl From<PackingResult> for PackResponse {
    fn from(result: PackingResult) -> Self {
        PackResponse {
            placed: result.placed,
            unplaced: result
                .unplaced
                .into_iter()
                .map(|u| UnplacedItem {
                    id: u.id,
                    order_id: u.order_id,
                    reason: u.reason.code().to_string(),
                })
                .collect(),
            truncated: result.truncated,
        }
    }
}

/// Most units a single packing run may lay out
pub const MAX_PACK_UNITS: u64 = 2_000;

/// Units `pack` would lay out for `lines`, after the display cap of the variant
pub fn unit_count(lines: &[PackLine], variant: PackingVariant) -> u64 {
    lines
        .iter()
        .map(|line| match variant {
            PackingVariant::CornerPoint => u64::from(line.quantity),
            PackingVariant::Shelf => u64::from(line.quantity.min(DISPLAY_CAP)),
        })
        .sum()
}

/// Expand lines into units, keeping at most `cap` units per line when given.
/// Returns the units and how many were cut.
pub fn expand_lines(lines: &[PackLine], cap: Option<u32>) -> (Vec<PackUnit>, usize) {
    let mut units = Vec::new();
    let mut truncated = 0usize;

    for line in lines {
        let shown = cap.map_or(line.quantity, |c| line.quantity.min(c));
        truncated += (line.quantity - shown) as usize;

        units.extend((1..=shown).map(|n| PackUnit {
            id: format!("{}-{}-{}", line.order_id, line.item_name, n),
            order_id: line.order_id.clone(),
            item_name: line.item_name.clone(),
            color: line.color.clone(),
            extents: [line.width, line.height, line.depth],
        }));
    }

    (units, truncated)
}

/// Lay out `lines` inside `container` with the chosen heuristic
pub fn pack(
    lines: &[PackLine],
    container: &ContainerDims,
    variant: PackingVariant,
) -> PackingResult {
    let result = match variant {
        PackingVariant::CornerPoint => {
            let (units, _) = expand_lines(lines, None);
            corner_point::pack(units, container)
        }
        PackingVariant::Shelf => {
            let (units, truncated) = expand_lines(lines, Some(DISPLAY_CAP));
            let mut result = shelf::pack(&units, container);
            result.truncated = truncated;
            result
        }
    };

    debug!(
        "Packed {} units ({:?}), {} unplaced, {} over display cap",
        result.placed.len(),
        variant,
        result.unplaced.len(),
        result.truncated
    );

    result
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn line(order: &str, item: &str, extents: [f64; 3], quantity: u32) -> PackLine {
        PackLine {
            order_id: order.to_string(),
            item_name: item.to_string(),
            width: extents[0],
            height: extents[1],
            depth: extents[2],
            quantity,
            color: "#3b82f6".to_string(),
        }
    }

    pub fn aabb_of(b: &PlacedBox) -> Aabb {
        Aabb::new([b.x - b.w / 2.0, b.y - b.h / 2.0, b.z - b.d / 2.0], [b.w, b.h, b.d])
    }

    pub fn assert_valid_layout(placed: &[PlacedBox], container: &ContainerDims) {
        let boxes: Vec<Aabb> = placed.iter().map(aabb_of).collect();
        for (i, a) in boxes.iter().enumerate() {
            assert!(a.within(container), "{} sticks out of the container", placed[i].id);
            for (j, b) in boxes.iter().enumerate().skip(i + 1) {
                assert!(!a.intersects(b), "{} overlaps {}", placed[i].id, placed[j].id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_unit_count_follows_display_cap() {
        let lines = vec![
            line("ORD-1", "Tower_Fan_Pilot", [30.0, 110.0, 30.0], 12),
            line("ORD-2", "Heater_Solaris", [25.0, 60.0, 25.0], 4),
        ];
        assert_eq!(unit_count(&lines, PackingVariant::CornerPoint), 16);
        assert_eq!(unit_count(&lines, PackingVariant::Shelf), 14);

        let huge = vec![line("ORD-3", "Air_Fryer_Pro", [35.0, 35.0, 40.0], u32::MAX)];
        assert_eq!(unit_count(&huge, PackingVariant::CornerPoint), u64::from(u32::MAX));
        assert_eq!(unit_count(&huge, PackingVariant::Shelf), u64::from(DISPLAY_CAP));
    }

    #[test]
    fn test_expand_lines_ids_and_cap() {
        let lines = vec![line("ORD-1000", "Tower_Fan_Pilot", [30.0, 110.0, 30.0], 12)];
        let (units, truncated) = expand_lines(&lines, Some(10));
        assert_eq!(units.len(), 10);
        assert_eq!(truncated, 2);
        assert_eq!(units[0].id, "ORD-1000-Tower_Fan_Pilot-1");
        assert_eq!(units[9].id, "ORD-1000-Tower_Fan_Pilot-10");

        let (all, none_cut) = expand_lines(&lines, None);
        assert_eq!(all.len(), 12);
        assert_eq!(none_cut, 0);
    }

    #[test]
    fn test_shelf_scenario_wraps_row() {
        let container = ContainerDims::default();
        let lines = vec![line("ORD-1000", "Tower_Fan_Pilot", [30.0, 110.0, 30.0], 10)];

        let result = pack(&lines, &container, PackingVariant::Shelf);
        assert_eq!(result.placed.len(), 10);
        assert!(result.unplaced.is_empty());
        assert_eq!(result.truncated, 0);

        let first_row = result.placed.iter().filter(|b| b.z == 15.0).count();
        let second_row = result.placed.iter().filter(|b| b.z == 47.0).count();
        assert_eq!(first_row, 7);
        assert_eq!(second_row, 3);
        assert_valid_layout(&result.placed, &container);
    }

    #[test]
    fn test_shelf_reports_display_cap() {
        let lines = vec![line("ORD-1000", "Tower_Fan_Pilot", [30.0, 110.0, 30.0], 12)];
        let result = pack(&lines, &ContainerDims::default(), PackingVariant::Shelf);
        assert_eq!(result.placed.len(), 10);
        assert_eq!(result.truncated, 2);
        assert_eq!(result.omitted(), 2);
    }

    #[test]
    fn test_corner_point_has_no_display_cap() {
        let lines = vec![line("ORD-1000", "Air_Fryer_Pro", [35.0, 35.0, 40.0], 25)];
        let container = ContainerDims::default();
        let result = pack(&lines, &container, PackingVariant::CornerPoint);
        assert_eq!(result.placed.len(), 25);
        assert_eq!(result.truncated, 0);
        assert_valid_layout(&result.placed, &container);
    }

    #[test]
    fn test_response_carries_reason_codes() {
        let container = ContainerDims::new(100.0, 100.0, 100.0);
        let lines = vec![line("ORD-1", "Huge", [150.0, 10.0, 10.0], 1)];
        let response: PackResponse = pack(&lines, &container, PackingVariant::CornerPoint).into();
        assert!(response.placed.is_empty());
        assert_eq!(response.unplaced.len(), 1);
        assert_eq!(response.unplaced[0].reason, "exceeds_container");
        assert_eq!(response.unplaced[0].id, "ORD-1-Huge-1");
    }

    #[test]
    fn test_empty_input() {
        for variant in [PackingVariant::CornerPoint, PackingVariant::Shelf] {
            let result = pack(&[], &ContainerDims::default(), variant);
            assert!(result.placed.is_empty());
            assert!(result.unplaced.is_empty());
        }
    }
}
