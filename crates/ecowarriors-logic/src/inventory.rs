//! Player inventory: category -> item -> quantity.
//!
//! Quantities are always at least 1. Removing as much as (or more than) is
//! held deletes the entry instead of leaving a zero or negative count.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Categories every inventory starts with.
pub const DEFAULT_CATEGORIES: [&str; 3] = ["materials", "tools", "items"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    categories: BTreeMap<String, BTreeMap<String, u32>>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES
                .iter()
                .map(|c| (c.to_string(), BTreeMap::new()))
                .collect(),
        }
    }
}

impl Inventory {
    /// Rebuild an inventory from raw persisted data, dropping any zero
    /// entries and restoring missing default categories.
    pub fn from_raw(raw: BTreeMap<String, BTreeMap<String, u32>>) -> Self {
        let mut inv = Self::default();
        for (category, items) in raw {
            let slot = inv.categories.entry(category).or_default();
            for (item, qty) in items {
                if qty > 0 {
                    slot.insert(item, qty);
                }
            }
        }
        inv
    }

    /// Add `quantity` of `item` under `category`. Zero is a no-op.
    pub fn add(&mut self, category: &str, item: &str, quantity: u32) -> bool {
        if quantity == 0 {
            return false;
        }
        let slot = self
            .categories
            .entry(category.to_string())
            .or_default()
            .entry(item.to_string())
            .or_insert(0);
        *slot = slot.saturating_add(quantity);
        true
    }

    /// Remove `quantity` of `item`. Returns false if nothing was held.
    pub fn remove(&mut self, category: &str, item: &str, quantity: u32) -> bool {
        if quantity == 0 {
            return false;
        }
        let Some(items) = self.categories.get_mut(category) else {
            return false;
        };
        let Some(held) = items.get_mut(item) else {
            return false;
        };
        if *held <= quantity {
            items.remove(item);
        } else {
            *held -= quantity;
        }
        true
    }

    /// Quantity held, 0 when absent.
    pub fn quantity(&self, category: &str, item: &str) -> u32 {
        self.categories
            .get(category)
            .and_then(|items| items.get(item))
            .copied()
            .unwrap_or(0)
    }

    pub fn category(&self, category: &str) -> Option<&BTreeMap<String, u32>> {
        self.categories.get(category)
    }

    pub fn categories(&self) -> &BTreeMap<String, BTreeMap<String, u32>> {
        &self.categories
    }

    /// Total number of items across all categories.
    pub fn total_items(&self) -> u64 {
        self.categories
            .values()
            .flat_map(|items| items.values())
            .map(|&q| q as u64)
            .sum()
    }
}
