//! Pallet estimation
//!
//! Converts an order's item quantities into total volume, weight and pallet count.

use tracing::debug;

use crate::types::{Catalog, Order, PackedOrder};

/// Standard pallet footprint length in cm
pub const PALLET_LENGTH_CM: f64 = 120.0;
/// Standard pallet footprint width in cm
pub const PALLET_WIDTH_CM: f64 = 100.0;
/// Maximum stack height on a pallet in cm
pub const PALLET_MAX_HEIGHT_CM: f64 = 180.0;
/// Usable share of a pallet's volume after void space
pub const LOAD_FACTOR: f64 = 0.85;
/// Smallest pallet count ever reported for an order
pub const MIN_PALLETS: f64 = 0.1;

/// Volume of one fully stacked pallet in cm³
pub const fn pallet_volume() -> f64 {
    PALLET_LENGTH_CM * PALLET_WIDTH_CM * PALLET_MAX_HEIGHT_CM
}

/// Compute volumetric totals and pallet demand of an order.
///
/// Items missing from the catalog are skipped and contribute nothing. An order
/// without any recognised item still needs [`MIN_PALLETS`].
pub fn estimate(order: &Order, catalog: &Catalog) -> PackedOrder {
    let mut total_volume = 0.0;
    let mut total_weight = 0.0;

    for (name, &quantity) in &order.items {
        match catalog.get(name) {
            Some(entry) => {
                total_volume += entry.unit_volume() * quantity as f64;
                total_weight += entry.weight * quantity as f64;
            }
            None => {
                // Unknown names are not rejected; a strict mode could surface these instead.
                debug!("Order {}: item '{}' not in catalog, skipped", order.id, name);
            }
        }
    }

    PackedOrder {
        order: order.clone(),
        total_weight,
        total_volume,
        pallets_needed: pallets_for_volume(total_volume),
    }
}

/// Estimate a batch of orders against one catalog
pub fn estimate_all(orders: &[Order], catalog: &Catalog) -> Vec<PackedOrder> {
    orders.iter().map(|order| estimate(order, catalog)).collect()
}

/// Pallets needed for a cargo volume, rounded up to the next tenth
pub fn pallets_for_volume(total_volume: f64) -> f64 {
    let effective_volume = pallet_volume() * LOAD_FACTOR;
    let pallets = (total_volume * 10.0 / effective_volume).ceil() / 10.0;
    pallets.max(MIN_PALLETS)
}
