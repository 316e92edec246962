//! Stat dimensions and stat maps.
//!
//! Every evaluation in the engine is parameterized by a [`Stat`]. Most
//! sources only feed [`Stat::FarmingFortune`]; a stat that no source feeds
//! simply reads as zero everywhere, so asking for an unusual dimension is
//! never an error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An aggregate quantity a player's setup produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stat {
    /// Primary score: bonus crop drops.
    FarmingFortune,
    /// Secondary counter: farming experience gain.
    FarmingWisdom,
}

impl Stat {
    /// All stat dimensions in order.
    pub const ALL: [Stat; 2] = [Stat::FarmingFortune, Stat::FarmingWisdom];

    pub fn name(self) -> &'static str {
        match self {
            Stat::FarmingFortune => "Farming Fortune",
            Stat::FarmingWisdom => "Farming Wisdom",
        }
    }
}

/// Ordered stat-to-amount mapping. Missing entries read as zero.
pub type StatMap = BTreeMap<Stat, f64>;

/// Read a stat from a map, defaulting to zero.
pub fn stat_value(map: &StatMap, stat: Stat) -> f64 {
    map.get(&stat).copied().unwrap_or(0.0)
}

/// Add an amount to a stat in a map, dropping exact zero additions.
pub fn add_stat(map: &mut StatMap, stat: Stat, amount: f64) {
    if amount != 0.0 {
        *map.entry(stat).or_insert(0.0) += amount;
    }
}

/// Build a single-entry stat map.
pub fn stat_map(stat: Stat, amount: f64) -> StatMap {
    let mut map = StatMap::new();
    add_stat(&mut map, stat, amount);
    map
}
