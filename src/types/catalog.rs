//! Item catalog types

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Colours handed out to catalog entries without an explicit colour
const FALLBACK_PALETTE: &[&str] = &[
    "#6b7280", "#ef4444", "#8b5cf6", "#14b8a6", "#ec4899", "#84cc16", "#f97316", "#0ea5e9",
];

/// A catalog entry describing one item type (dimensions in cm, weight in kg)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub name: String,
    pub length: u32,
    pub width: u32,
    pub height: u32,
    pub weight: f64,
    /// Display colour used by the packing visualization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, length: u32, width: u32, height: u32, weight: f64) -> Self {
        Self {
            name: name.into(),
            length,
            width,
            height,
            weight,
            color: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Volume of a single unit in cm³
    pub fn unit_volume(&self) -> f64 {
        self.length as f64 * self.width as f64 * self.height as f64
    }

    /// Extents used when the item is rendered in a container: (width, height, depth).
    /// The entry's length runs along the container depth.
    pub fn render_extents(&self) -> (f64, f64, f64) {
        (self.width as f64, self.height as f64, self.length as f64)
    }
}

/// Item catalog keyed by entry name.
///
/// Passed explicitly into the estimator and planner; there is no process-wide catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<String, CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.name.clone(), entry))
                .collect(),
        }
    }

    /// Demo catalog with the three reference products
    pub fn demo() -> Self {
        Self::new([
            CatalogEntry::new("Tower_Fan_Pilot", 110, 30, 30, 8.5).with_color("#3b82f6"),
            CatalogEntry::new("Air_Fryer_Pro", 40, 35, 35, 6.0).with_color("#10b981"),
            CatalogEntry::new("Heater_Solaris", 25, 25, 60, 4.2).with_color("#f59e0b"),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.get(name)
    }

    pub fn insert(&mut self, entry: CatalogEntry) {
        self.entries.insert(entry.name.clone(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Display colour for an item name: the entry's own colour, otherwise a stable palette pick
    pub fn color_for(&self, name: &str) -> String {
        self.get(name)
            .and_then(|entry| entry.color.clone())
            .unwrap_or_else(|| fallback_color(name).to_string())
    }
}

/// Deterministic palette colour for a name (FNV-1a over the bytes)
pub fn fallback_color(name: &str) -> &'static str {
    let hash = name.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |acc, b| {
        (acc ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3)
    });
    FALLBACK_PALETTE[(hash % FALLBACK_PALETTE.len() as u64) as usize]
}
