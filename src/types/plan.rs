//! Plan and packing message types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::catalog::CatalogEntry;
use super::order::{Coordinates, Location, Order};

/// Key used for the depot in the solution's location map
pub const DEPOT_KEY: &str = "DEPOT";

/// Inner dimensions of a container in cm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDims {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

impl ContainerDims {
    pub fn new(width: f64, height: f64, depth: f64) -> Self {
        Self { width, height, depth }
    }
}

impl Default for ContainerDims {
    fn default() -> Self {
        Self::new(240.0, 260.0, 1200.0)
    }
}

/// Which packing heuristic lays out the items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackingVariant {
    /// First-fit-decreasing over candidate corner points with collision checks
    CornerPoint,
    /// Row/layer stacking used for fast per-route visualization
    #[default]
    Shelf,
}

/// A run of identical units belonging to one order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackLine {
    pub order_id: String,
    pub item_name: String,
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub quantity: u32,
    pub color: String,
}

/// One rendered unit; coordinates are the box center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedBox {
    pub id: String,
    pub order_id: String,
    pub item_name: String,
    pub color: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
    pub h: f64,
    pub d: f64,
}

/// Unit that could not be placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnplacedItem {
    pub id: String,
    pub order_id: String,
    pub reason: String,
}

/// Planned route of one vehicle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRoute {
    /// 1-based vehicle slot
    pub vehicle_id: usize,
    /// Order ids in visiting order; the depot is implicit at both ends
    pub stops: Vec<String>,
    /// Pallets on board
    pub load: f64,
    pub load_percent: f64,
    pub distance: f64,
    pub is_urgent_covered: bool,
    /// Depot -> stops -> depot as [lat, lng]
    pub coordinates: Vec<[f64; 2]>,
    pub packed_items: Vec<PlacedBox>,
}

/// Full planning result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSolution {
    pub total_distance: f64,
    pub total_pallets: f64,
    pub routes: Vec<VehicleRoute>,
    pub dropped_orders: Vec<String>,
    /// Orders that were not awaiting planning and were left out
    pub skipped_orders: Vec<String>,
    /// Every location involved, keyed by order id plus [`DEPOT_KEY`]
    pub locations: BTreeMap<String, Location>,
    pub algorithm: String,
    pub distance_source: String,
    pub solve_time_ms: u64,
    pub iterations: u64,
    pub omitted_items: usize,
}

impl PlanSolution {
    /// Well-formed solution with nothing planned
    pub fn empty(depot: Location) -> Self {
        let mut locations = BTreeMap::new();
        locations.insert(DEPOT_KEY.to_string(), depot);

        Self {
            total_distance: 0.0,
            total_pallets: 0.0,
            routes: vec![],
            dropped_orders: vec![],
            skipped_orders: vec![],
            locations,
            algorithm: "none".to_string(),
            distance_source: "none".to_string(),
            solve_time_ms: 0,
            iterations: 0,
            omitted_items: 0,
        }
    }
}

/// Request for loadplan.plan.calculate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    /// Orders to plan; when absent, mock orders are generated
    #[serde(default)]
    pub orders: Option<Vec<Order>>,
    /// Number of mock orders when `orders` is absent
    #[serde(default)]
    pub mock_count: Option<usize>,
    #[serde(default)]
    pub mock_seed: Option<u64>,
    /// Extra catalog entries, added to the worker catalog
    #[serde(default)]
    pub catalog: Option<Vec<CatalogEntry>>,
    #[serde(default)]
    pub depot: Option<Location>,
    #[serde(default)]
    pub fleet_size: Option<usize>,
    /// Per-vehicle capacity in pallets
    #[serde(default)]
    pub vehicle_capacity: Option<f64>,
    #[serde(default)]
    pub time_limit_ms: Option<u64>,
    /// Externally supplied distance matrix (depot first, then orders in request order)
    #[serde(default)]
    pub distance_matrix: Option<Vec<Vec<f64>>>,
}

/// Request for loadplan.pack
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackRequest {
    pub lines: Vec<PackLine>,
    #[serde(default)]
    pub container: ContainerDims,
    #[serde(default)]
    pub variant: PackingVariant,
}

/// Response for loadplan.pack
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackResponse {
    pub placed: Vec<PlacedBox>,
    pub unplaced: Vec<UnplacedItem>,
    pub truncated: usize,
}

/// Coordinate pair as sent to map renderers
pub fn lat_lng(coordinates: Coordinates) -> [f64; 2] {
    [coordinates.lat, coordinates.lng]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_solution_contains_depot_only() {
        let solution = PlanSolution::empty(Location::new(50.0, 50.0));
        assert!(solution.routes.is_empty());
        assert!(solution.dropped_orders.is_empty());
        assert_eq!(solution.total_distance, 0.0);
        assert_eq!(solution.total_pallets, 0.0);
        assert_eq!(solution.locations.len(), 1);
        assert_eq!(solution.locations[DEPOT_KEY], Location::new(50.0, 50.0));
    }

    #[test]
    fn test_pack_request_defaults() {
        let json = r#"{"lines": []}"#;
        let request: PackRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.variant, PackingVariant::Shelf);
        assert_eq!(request.container, ContainerDims::new(240.0, 260.0, 1200.0));
    }

    #[test]
    fn test_variant_wire_names() {
        let variant: PackingVariant = serde_json::from_str("\"corner_point\"").unwrap();
        assert_eq!(variant, PackingVariant::CornerPoint);
    }

    #[test]
    fn test_plan_request_accepts_empty_object() {
        let request: PlanRequest = serde_json::from_str("{}").unwrap();
        assert!(request.orders.is_none());
        assert!(request.fleet_size.is_none());
    }
}
