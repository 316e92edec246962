//! Plain serialized item and pet records.
//!
//! Records are the wire shape of a player's inventory: definition ids plus
//! attribute state, with every field optional so partially-known items
//! still load. [`crate::gear::GearPiece::from_record`] resolves a record
//! against the definition registry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cropplan_logic::gems::GemQuality;
use cropplan_logic::rarity::Rarity;

/// One gear item as stored or transmitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Stable identity of this concrete item instance.
    pub uid: String,
    pub definition_id: String,
    /// Absent means the definition's default rarity.
    #[serde(default)]
    pub rarity: Option<Rarity>,
    #[serde(default)]
    pub reforge: Option<String>,
    /// Enchant id to level.
    #[serde(default)]
    pub enchantments: BTreeMap<String, u8>,
    /// One entry per socket; `None` is an empty socket. Shorter or longer
    /// vectors are normalized to the definition's socket count on load.
    #[serde(default)]
    pub gems: Vec<Option<GemQuality>>,
    /// Whether the rarity-upgrade item has been applied.
    #[serde(default)]
    pub rarity_upgraded: bool,
    /// Fortune books consumed, zero to five.
    #[serde(default)]
    pub fortune_books: u8,
    /// Lifetime crops harvested with this item.
    #[serde(default)]
    pub counter: u64,
}

impl ItemRecord {
    pub fn new(uid: impl Into<String>, definition_id: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            definition_id: definition_id.into(),
            ..Self::default()
        }
    }

    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = Some(rarity);
        self
    }

    pub fn with_reforge(mut self, reforge: impl Into<String>) -> Self {
        self.reforge = Some(reforge.into());
        self
    }

    pub fn with_enchant(mut self, id: impl Into<String>, level: u8) -> Self {
        self.enchantments.insert(id.into(), level);
        self
    }

    pub fn with_gems(mut self, gems: Vec<Option<GemQuality>>) -> Self {
        self.gems = gems;
        self
    }
}

/// One pet as stored or transmitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PetRecord {
    pub uid: String,
    pub definition_id: String,
    #[serde(default)]
    pub level: u32,
}

impl PetRecord {
    pub fn new(uid: impl Into<String>, definition_id: impl Into<String>, level: u32) -> Self {
        Self {
            uid: uid.into(),
            definition_id: definition_id.into(),
            level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_record_deserializes() {
        let record: ItemRecord =
            serde_json::from_str(r#"{"uid": "a", "definition_id": "SPELT_HOE_1"}"#).unwrap();
        assert_eq!(record.uid, "a");
        assert_eq!(record.rarity, None);
        assert!(record.enchantments.is_empty());
        assert!(!record.rarity_upgraded);
        assert_eq!(record.fortune_books, 0);
    }

    #[test]
    fn builder_round_trip() {
        let record = ItemRecord::new("a", "SPELT_HOE_1")
            .with_rarity(Rarity::Rare)
            .with_reforge("blessed")
            .with_enchant("harvesting", 3)
            .with_gems(vec![Some(GemQuality::Fine)]);
        let json = serde_json::to_string(&record).unwrap();
        let back: ItemRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
