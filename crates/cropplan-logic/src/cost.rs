//! Upgrade cost accounting.
//!
//! Costs are mergeable so a multi-step plan can present one combined bill.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Farming contest medals usable as currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Medal {
    Bronze,
    Silver,
    Gold,
}

/// What an upgrade costs: consumable items plus currencies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpgradeCost {
    #[serde(default)]
    pub items: BTreeMap<String, u32>,
    #[serde(default)]
    pub coins: u64,
    #[serde(default)]
    pub copper: u64,
    #[serde(default)]
    pub medals: BTreeMap<Medal, u32>,
}

impl UpgradeCost {
    /// Cost of a single consumable item.
    pub fn item(id: impl Into<String>, count: u32) -> Self {
        let mut cost = Self::default();
        cost.items.insert(id.into(), count);
        cost
    }

    /// Cost in coins only.
    pub fn coins(coins: u64) -> Self {
        Self {
            coins,
            ..Self::default()
        }
    }

    pub fn is_free(&self) -> bool {
        self.items.is_empty() && self.coins == 0 && self.copper == 0 && self.medals.is_empty()
    }

    /// Add another cost into this one, component-wise.
    pub fn merge(&mut self, other: &UpgradeCost) {
        for (id, count) in &other.items {
            *self.items.entry(id.clone()).or_insert(0) += count;
        }
        self.coins = self.coins.saturating_add(other.coins);
        self.copper = self.copper.saturating_add(other.copper);
        for (medal, count) in &other.medals {
            *self.medals.entry(*medal).or_insert(0) += count;
        }
    }

    /// Merge a sequence of costs into one.
    pub fn merged<'a>(costs: impl IntoIterator<Item = &'a UpgradeCost>) -> Self {
        let mut total = Self::default();
        for cost in costs {
            total.merge(cost);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_items_and_currencies() {
        let mut a = UpgradeCost::item("FINE_PERIDOT_GEM", 1);
        a.coins = 100;
        let mut b = UpgradeCost::item("FINE_PERIDOT_GEM", 2);
        b.items.insert("FORTUNE_BOOK".into(), 1);
        b.copper = 5;
        b.medals.insert(Medal::Gold, 3);

        a.merge(&b);
        assert_eq!(a.items["FINE_PERIDOT_GEM"], 3);
        assert_eq!(a.items["FORTUNE_BOOK"], 1);
        assert_eq!(a.coins, 100);
        assert_eq!(a.copper, 5);
        assert_eq!(a.medals[&Medal::Gold], 3);
    }

    #[test]
    fn merged_over_list() {
        let costs = vec![UpgradeCost::coins(10), UpgradeCost::coins(20)];
        let total = UpgradeCost::merged(&costs);
        assert_eq!(total.coins, 30);
        assert!(!total.is_free());
    }

    #[test]
    fn default_is_free() {
        assert!(UpgradeCost::default().is_free());
    }
}
