//! First-fit-decreasing over candidate corner points

use tracing::warn;

use crate::types::ContainerDims;

use super::geometry::{fits_container, Aabb};
use super::{PackUnit, PackingResult, UnplacedReason};

/// Place units largest first at the lowest (x, y, z) corner that is free.
///
/// Every placement consumes its corner and opens three new ones at the
/// unit's right, top and front faces.
pub fn pack(mut units: Vec<PackUnit>, container: &ContainerDims) -> PackingResult {
    // stable: equal volumes keep input order
    units.sort_by(|a, b| b.volume().total_cmp(&a.volume()));

    let mut result = PackingResult::default();
    let mut boxes: Vec<Aabb> = Vec::with_capacity(units.len());
    let mut corners: Vec<[f64; 3]> = vec![[0.0, 0.0, 0.0]];

    for unit in &units {
        if !unit.has_valid_extents() {
            warn!("Unit {} has invalid extents {:?}, skipped", unit.id, unit.extents);
            result.unplaced.push(unit.unplaced(UnplacedReason::InvalidExtents));
            continue;
        }
        if !fits_container(unit.extents, container) {
            warn!("Unit {} does not fit the container, skipped", unit.id);
            result.unplaced.push(unit.unplaced(UnplacedReason::ExceedsContainer));
            continue;
        }

        corners.sort_by(|a, b| {
            a[0].total_cmp(&b[0])
                .then(a[1].total_cmp(&b[1]))
                .then(a[2].total_cmp(&b[2]))
        });
        corners.dedup();

        let slot = corners.iter().position(|&corner| {
            let candidate = Aabb::new(corner, unit.extents);
            candidate.within(container) && !boxes.iter().any(|b| b.intersects(&candidate))
        });

        match slot {
            Some(i) => {
                let corner = corners.remove(i);
                let placed = Aabb::new(corner, unit.extents);

                corners.extend([
                    [placed.x + placed.w, placed.y, placed.z],
                    [placed.x, placed.y + placed.h, placed.z],
                    [placed.x, placed.y, placed.z + placed.d],
                ]);
                corners.retain(|c| {
                    c[0] < container.width && c[1] < container.height && c[2] < container.depth
                });

                result.placed.push(unit.placed_at(&placed));
                boxes.push(placed);
            }
            None => {
                warn!("No free corner for unit {}", unit.id);
                result.unplaced.push(unit.unplaced(UnplacedReason::NoFreeCorner));
            }
        }
    }

    result
}
