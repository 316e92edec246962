//! The item rarity ladder.

use serde::{Deserialize, Serialize};

/// Item rarity tiers, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
}

impl Rarity {
    /// All rarities in ascending order.
    pub const ALL: [Rarity; 6] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
        Rarity::Mythic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::Epic => "Epic",
            Rarity::Legendary => "Legendary",
            Rarity::Mythic => "Mythic",
        }
    }

    /// The next rarity up, if any.
    pub fn next(self) -> Option<Rarity> {
        let idx = Rarity::ALL.iter().position(|r| *r == self)?;
        Rarity::ALL.get(idx + 1).copied()
    }

    /// The previous rarity down, if any.
    pub fn previous(self) -> Option<Rarity> {
        let idx = Rarity::ALL.iter().position(|r| *r == self)?;
        idx.checked_sub(1).and_then(|i| Rarity::ALL.get(i)).copied()
    }
}
