//! Reforge definitions.
//!
//! A reforge is an exclusive modifier on a gear piece whose stats depend on
//! the piece's current rarity. At most one reforge is applied at a time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rarity::Rarity;
use crate::stats::{stat_value, Stat, StatMap};

/// Which gear a reforge or enchant can be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GearCategory {
    Hoe,
    Axe,
    Armor,
    Equipment,
}

/// Stats and apply fee of a reforge at one rarity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReforgeTier {
    pub stats: StatMap,
    /// Coins charged by the blacksmith to apply at this rarity.
    #[serde(default)]
    pub apply_cost: u64,
}

/// The consumable stone that carries a reforge, with its purchase price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReforgeStone {
    pub item_id: String,
    #[serde(default)]
    pub coins: u64,
    #[serde(default)]
    pub copper: u64,
}

/// A reforge definition with per-rarity tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReforgeDef {
    pub id: String,
    pub name: String,
    pub applies_to: Vec<GearCategory>,
    pub tiers: BTreeMap<Rarity, ReforgeTier>,
    #[serde(default)]
    pub stone: Option<ReforgeStone>,
    /// An intentional sidegrade: offered even when it does not strictly beat
    /// the current reforge, and its candidates are flagged optional.
    #[serde(default)]
    pub optional: bool,
}

impl ReforgeDef {
    pub fn applies_to(&self, category: GearCategory) -> bool {
        self.applies_to.contains(&category)
    }
}

/// Stat granted by a reforge at the given rarity. Missing tiers read as
/// zero so formulas stay total.
pub fn reforge_stat(def: &ReforgeDef, rarity: Rarity, stat: Stat) -> f64 {
    def.tiers
        .get(&rarity)
        .map(|tier| stat_value(&tier.stats, stat))
        .unwrap_or(0.0)
}
