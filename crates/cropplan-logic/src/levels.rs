//! Linear-with-cap level sources.
//!
//! Player-level scalar fields (skill level, unlocked plots, community
//! upgrades) all share the same shape: a fixed fortune amount per level up
//! to a level cap.

use serde::{Deserialize, Serialize};

use crate::cost::UpgradeCost;

/// A named scalar source worth `per_level` fortune per level, capped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSource {
    pub name: String,
    pub per_level: f64,
    pub max_level: u32,
    /// Cost of raising the level by one step, if purchasable.
    #[serde(default)]
    pub step_cost: Option<UpgradeCost>,
}

impl LevelSource {
    pub fn new(name: impl Into<String>, per_level: f64, max_level: u32) -> Self {
        Self {
            name: name.into(),
            per_level,
            max_level,
            step_cost: None,
        }
    }

    pub fn with_step_cost(mut self, cost: UpgradeCost) -> Self {
        self.step_cost = Some(cost);
        self
    }

    /// Maximum fortune this source can reach.
    pub fn max_fortune(&self) -> f64 {
        self.per_level * f64::from(self.max_level)
    }
}

/// Fortune from a level source at the given level, clamped to the cap.
pub fn level_fortune(level: u32, source: &LevelSource) -> f64 {
    f64::from(level.min(source.max_level)) * source.per_level
}
