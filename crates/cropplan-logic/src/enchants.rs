//! Enchant definitions and per-level stat formulas.
//!
//! Enchant tiers carry their *total* stats at that level, not a delta, so
//! per-level curves need not be linear. A tier may also scale with a piece
//! of player world state (the crop milestone count), which is passed in as
//! a plain number to keep these formulas pure.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cost::UpgradeCost;
use crate::reforges::GearCategory;
use crate::stats::{stat_value, Stat, StatMap};

/// Stats of an enchant at one level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnchantTier {
    /// Flat stats at this level.
    #[serde(default)]
    pub stats: StatMap,
    /// Stats granted per crop-milestone level of the target crop.
    #[serde(default)]
    pub per_milestone: StatMap,
    /// Extra cost of reaching this level beyond the enchanted book itself.
    #[serde(default)]
    pub cost: Option<UpgradeCost>,
}

/// An enchant definition with a closed level table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnchantDef {
    pub id: String,
    pub name: String,
    pub applies_to: Vec<GearCategory>,
    /// Only meaningful on pieces bound to this crop, when set.
    #[serde(default)]
    pub crop: Option<String>,
    pub min_level: u8,
    pub max_level: u8,
    pub levels: BTreeMap<u8, EnchantTier>,
}

impl EnchantDef {
    pub fn applies_to(&self, category: GearCategory) -> bool {
        self.applies_to.contains(&category)
    }

    /// Item id of the enchanted book carrying this enchant at a level.
    pub fn book_item_id(&self, level: u8) -> String {
        format!("{}_BOOK_{level}", self.id.to_uppercase())
    }
}

/// Total stat from an enchant at the given level. Levels outside the table
/// (including zero) read as zero.
pub fn enchant_stat(level: u8, def: &EnchantDef, stat: Stat, milestone: u32) -> f64 {
    if level == 0 {
        return 0.0;
    }
    let Some(tier) = def.levels.get(&level) else {
        return 0.0;
    };
    stat_value(&tier.stats, stat) + stat_value(&tier.per_milestone, stat) * f64::from(milestone)
}

/// Total stat from an enchant at its level cap.
pub fn enchant_stat_max(def: &EnchantDef, stat: Stat, milestone: u32) -> f64 {
    enchant_stat(def.max_level, def, stat, milestone)
}
