//! CVRP problem types

use crate::types::{pallets_to_units, Location, PackedOrder};

/// Cost of leaving an order unserved, per urgency class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropPenalties {
    pub urgent: i64,
    pub deferrable: i64,
}

impl Default for DropPenalties {
    fn default() -> Self {
        Self {
            urgent: 1_000_000_000,
            deferrable: 1_000_000,
        }
    }
}

/// A stop the engine may visit or drop
#[derive(Debug, Clone, PartialEq)]
pub struct CvrpStop {
    /// Order id
    pub id: String,
    pub location: Location,
    /// Demand in tenths of a pallet
    pub demand: i64,
    /// Objective cost added when the stop is not served
    pub penalty: i64,
    pub urgent: bool,
}

/// Capacitated routing problem with optional stops.
///
/// Matrix index 0 is the depot, stop `i` sits at matrix index `i + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct CvrpProblem {
    pub depot: Location,
    pub stops: Vec<CvrpStop>,
    pub fleet_size: usize,
    /// Per-vehicle capacity in tenths of a pallet
    pub capacity: i64,
}

impl CvrpProblem {
    /// Build the problem from estimated orders; capacity is given in pallets
    pub fn from_packed(
        depot: Location,
        orders: &[PackedOrder],
        fleet_size: usize,
        capacity_pallets: f64,
        penalties: DropPenalties,
    ) -> Self {
        let stops = orders
            .iter()
            .map(|order| CvrpStop {
                id: order.id().to_string(),
                location: order.order.location,
                demand: order.demand_units(),
                penalty: if order.is_urgent() {
                    penalties.urgent
                } else {
                    penalties.deferrable
                },
                urgent: order.is_urgent(),
            })
            .collect();

        Self {
            depot,
            stops,
            fleet_size,
            capacity: pallets_to_units(capacity_pallets),
        }
    }

    /// Depot followed by every stop, in matrix order
    pub fn locations(&self) -> Vec<Location> {
        std::iter::once(self.depot)
            .chain(self.stops.iter().map(|s| s.location))
            .collect()
    }

    pub fn total_demand(&self) -> i64 {
        self.stops.iter().map(|s| s.demand).sum()
    }
}

/// Matrix index of a stop
pub(super) fn node(stop: usize) -> usize {
    stop + 1
}

/// Matrix index of the depot
pub(super) const DEPOT: usize = 0;
