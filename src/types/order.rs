//! Order types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Point on the planning grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
}

impl Location {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Geographic coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Delivery urgency of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    /// Must ship today
    Urgent,
    /// Can slip to the next planning run
    Deferrable,
}

impl Urgency {
    pub fn is_urgent(&self) -> bool {
        matches!(self, Urgency::Urgent)
    }
}

/// Order lifecycle status as tracked by the order source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    AwaitingPlanning,
    Planned,
    Dropped,
    Completed,
}

impl OrderStatus {
    /// Only orders waiting for a plan are handed to the routing engine
    pub fn is_plannable(&self) -> bool {
        matches!(self, OrderStatus::AwaitingPlanning)
    }
}

/// Customer order as delivered by the order source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub customer: String,
    pub urgency: Urgency,
    /// Item name -> quantity
    pub items: BTreeMap<String, u32>,
    pub location: Location,
    #[serde(default)]
    pub status: OrderStatus,
}

/// Order enriched with volumetric totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackedOrder {
    #[serde(flatten)]
    pub order: Order,
    /// Total weight in kg
    pub total_weight: f64,
    /// Total volume in cm³
    pub total_volume: f64,
    /// Pallets needed, rounded up to 0.1 and never below 0.1
    pub pallets_needed: f64,
}

impl PackedOrder {
    pub fn id(&self) -> &str {
        &self.order.id
    }

    pub fn is_urgent(&self) -> bool {
        self.order.urgency.is_urgent()
    }

    /// Demand in tenths of a pallet
    pub fn demand_units(&self) -> i64 {
        pallets_to_units(self.pallets_needed)
    }
}

/// Convert a pallet count to tenths-of-a-pallet units
pub fn pallets_to_units(pallets: f64) -> i64 {
    (pallets * 10.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_deserialize_defaults_status() {
        let json = r#"{
            "id": "ORD-1000",
            "customer": "Walmart DC_0",
            "urgency": "urgent",
            "items": {"Air_Fryer_Pro": 12},
            "location": {"x": 40.0, "y": 60.0}
        }"#;

        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.id, "ORD-1000");
        assert!(order.urgency.is_urgent());
        assert_eq!(order.items.get("Air_Fryer_Pro"), Some(&12));
        assert_eq!(order.status, OrderStatus::AwaitingPlanning);
    }

    #[test]
    fn test_status_plannable() {
        assert!(OrderStatus::AwaitingPlanning.is_plannable());
        assert!(!OrderStatus::Planned.is_plannable());
        assert!(!OrderStatus::Dropped.is_plannable());
        assert!(!OrderStatus::Completed.is_plannable());
    }

    #[test]
    fn test_pallets_to_units_rounds() {
        assert_eq!(pallets_to_units(0.1), 1);
        assert_eq!(pallets_to_units(2.6), 26);
        assert_eq!(pallets_to_units(0.30000000000000004), 3);
    }

    #[test]
    fn test_packed_order_flattens_order() {
        let packed = PackedOrder {
            order: Order {
                id: "ORD-1".to_string(),
                customer: "Target DC_1".to_string(),
                urgency: Urgency::Deferrable,
                items: BTreeMap::new(),
                location: Location::new(20.0, 20.0),
                status: OrderStatus::AwaitingPlanning,
            },
            total_weight: 0.0,
            total_volume: 0.0,
            pallets_needed: 0.1,
        };

        let value = serde_json::to_value(&packed).unwrap();
        assert_eq!(value["id"], "ORD-1");
        assert_eq!(value["palletsNeeded"], 0.1);
        assert_eq!(packed.demand_units(), 1);
        assert!(!packed.is_urgent());
    }
}
