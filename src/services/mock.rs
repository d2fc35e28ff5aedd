//! Seeded demo order source

use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::types::{Location, Order, OrderStatus, Urgency};

const CUSTOMERS: &[&str] = &["Walmart DC", "BestBuy Hub", "Target DC", "HomeDepot"];

/// Share of generated orders that are urgent
const URGENT_SHARE: f64 = 0.8;

/// Generates reproducible demo orders against the demo catalog
pub struct MockOrderGenerator {
    rng: SmallRng,
}

impl MockOrderGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// `count` orders with ids ORD-1000, ORD-1001, ...
    pub fn generate(&mut self, count: usize) -> Vec<Order> {
        (0..count).map(|i| self.order(i)).collect()
    }

    fn order(&mut self, i: usize) -> Order {
        let rng = &mut self.rng;
        let mut items = BTreeMap::new();

        if rng.gen_bool(0.5) {
            items.insert("Tower_Fan_Pilot".to_string(), rng.gen_range(50..=100));
        }
        if rng.gen_bool(0.7) {
            items.insert("Air_Fryer_Pro".to_string(), rng.gen_range(50..=150));
        }
        if items.is_empty() {
            items.insert("Heater_Solaris".to_string(), rng.gen_range(30..=80));
        }

        let urgency = if rng.gen_bool(URGENT_SHARE) {
            Urgency::Urgent
        } else {
            Urgency::Deferrable
        };

        let customer = CUSTOMERS.choose(rng).copied().unwrap_or("Walk-in");
        let location = Location::new(
            rng.gen_range(20..=100) as f64,
            rng.gen_range(20..=100) as f64,
        );

        Order {
            id: format!("ORD-{}", 1000 + i),
            customer: format!("{}_{}", customer, i),
            urgency,
            items,
            location,
            status: OrderStatus::AwaitingPlanning,
        }
    }
}
