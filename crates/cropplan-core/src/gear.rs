//! Gear entities: a definition reference plus mutable attributes.
//!
//! Definitions are shared by `Arc` and never change; everything a plan or a
//! live upgrade can touch lives in [`GearAttributes`]. Cloning a piece deep
//! copies the attributes and shares the definition, which is exactly the
//! clone the planner needs.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use cropplan_logic::definitions::{Definitions, GearDefinition, GearKind};
use cropplan_logic::gems::GemQuality;
use cropplan_logic::rarity::Rarity;
use cropplan_logic::reforges::reforge_stat;
use cropplan_logic::stats::Stat;

use crate::error::{EngineError, EngineResult};
use crate::record::ItemRecord;

/// Maximum number of fortune books a tool can absorb.
pub const MAX_FORTUNE_BOOKS: u8 = 5;

/// The mutable state of a gear piece.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GearAttributes {
    pub reforge: Option<String>,
    pub enchantments: BTreeMap<String, u8>,
    /// One entry per socket; `None` is an empty socket.
    pub gems: Vec<Option<GemQuality>>,
    pub rarity_upgraded: bool,
    pub fortune_books: u8,
    /// Lifetime crops harvested with this piece.
    pub counter: u64,
}

/// A concrete gear instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearPiece {
    pub uid: String,
    pub def: Arc<GearDefinition>,
    pub rarity: Rarity,
    pub attrs: GearAttributes,
}

/// The rarity a freshly obtained instance of a definition has. The rarity
/// ceiling already accounts for the rarity-upgrade item, so a fresh piece
/// sits one step below it.
pub fn default_rarity(def: &GearDefinition) -> Rarity {
    def.max_rarity.previous().unwrap_or(def.max_rarity)
}

fn normalized_gems(gems: &[Option<GemQuality>], slots: u8) -> Vec<Option<GemQuality>> {
    let mut gems = gems.to_vec();
    gems.resize(usize::from(slots), None);
    gems
}

impl GearPiece {
    /// Resolve a raw record against the registry. The only hard failure is
    /// an unknown definition id; every other oddity in the record is
    /// normalized (rarity clamped to the ceiling, gem vector resized to the
    /// socket count).
    pub fn from_record(record: &ItemRecord, defs: &Definitions) -> EngineResult<Self> {
        let def = defs
            .gear(&record.definition_id)
            .ok_or_else(|| EngineError::UnknownDefinition {
                id: record.definition_id.clone(),
            })?;
        let rarity = record
            .rarity
            .unwrap_or_else(|| default_rarity(def))
            .min(def.max_rarity);
        Ok(Self {
            uid: record.uid.clone(),
            def: Arc::clone(def),
            rarity,
            attrs: GearAttributes {
                reforge: record.reforge.clone(),
                enchantments: record.enchantments.clone(),
                gems: normalized_gems(&record.gems, def.gem_slots),
                rarity_upgraded: record.rarity_upgraded,
                fortune_books: record.fortune_books.min(MAX_FORTUNE_BOOKS),
                counter: record.counter,
            },
        })
    }

    /// A fresh, unmodified instance of a definition, as if just obtained.
    pub fn from_definition(uid: impl Into<String>, def: &Arc<GearDefinition>) -> Self {
        Self {
            uid: uid.into(),
            def: Arc::clone(def),
            rarity: default_rarity(def),
            attrs: GearAttributes {
                gems: vec![None; usize::from(def.gem_slots)],
                ..GearAttributes::default()
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn kind(&self) -> GearKind {
        self.def.kind
    }

    /// The synthetic fully-upgraded instance that bounds this piece: its
    /// definition chased to the end of the progress chain, at the rarity
    /// ceiling with the upgrade flag set, every applicable enchant at cap,
    /// every socket holding a perfect gem, and the best applicable reforge.
    /// Pieces without a chain bound themselves.
    pub fn reference_peak(&self, defs: &Definitions) -> GearPiece {
        let def = defs
            .final_tier(&self.def)
            .unwrap_or_else(|| Arc::clone(&self.def));
        fully_upgraded(&self.uid, &def, defs)
    }
}

/// Build the fully-upgraded instance of a definition.
pub fn fully_upgraded(
    uid: impl Into<String>,
    def: &Arc<GearDefinition>,
    defs: &Definitions,
) -> GearPiece {
    let rarity = def.max_rarity;
    let reforge = defs
        .reforges_for(def.category)
        .max_by(|a, b| {
            let a_val = reforge_stat(a, rarity, Stat::FarmingFortune);
            let b_val = reforge_stat(b, rarity, Stat::FarmingFortune);
            a_val.partial_cmp(&b_val).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|r| r.id.clone());
    let enchantments = defs
        .enchants_for(def.category)
        .filter(|e| e.crop.is_none() || e.crop == def.crop)
        .map(|e| (e.id.clone(), e.max_level))
        .collect();
    GearPiece {
        uid: uid.into(),
        def: Arc::clone(def),
        rarity,
        attrs: GearAttributes {
            reforge,
            enchantments,
            gems: vec![Some(GemQuality::Perfect); usize::from(def.gem_slots)],
            rarity_upgraded: true,
            fortune_books: if def.kind == GearKind::Tool {
                MAX_FORTUNE_BOOKS
            } else {
                0
            },
            counter: 0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cropplan_logic::definitions::sample_definitions;

    #[test]
    fn unknown_definition_is_a_hard_error() {
        let defs = sample_definitions();
        let record = ItemRecord::new("a", "NOT_A_THING");
        let err = GearPiece::from_record(&record, &defs).unwrap_err();
        assert!(matches!(err, EngineError::UnknownDefinition { id } if id == "NOT_A_THING"));
    }

    #[test]
    fn missing_rarity_defaults_below_ceiling() {
        let defs = sample_definitions();
        let piece =
            GearPiece::from_record(&ItemRecord::new("a", "CACTUS_BLADE"), &defs).unwrap();
        assert_eq!(piece.rarity, Rarity::Rare);
        assert_eq!(piece.attrs.gems, vec![None]);
    }

    #[test]
    fn record_rarity_is_clamped_to_ceiling() {
        let defs = sample_definitions();
        let record = ItemRecord::new("a", "CACTUS_BLADE").with_rarity(Rarity::Mythic);
        let piece = GearPiece::from_record(&record, &defs).unwrap();
        assert_eq!(piece.rarity, Rarity::Epic);
    }

    #[test]
    fn gem_vector_is_normalized_to_socket_count() {
        let defs = sample_definitions();
        let record = ItemRecord::new("a", "SPELT_HOE_3")
            .with_gems(vec![Some(GemQuality::Fine)]);
        let piece = GearPiece::from_record(&record, &defs).unwrap();
        assert_eq!(piece.attrs.gems.len(), 2);
        assert_eq!(piece.attrs.gems[0], Some(GemQuality::Fine));
        assert_eq!(piece.attrs.gems[1], None);
    }

    #[test]
    fn reference_peak_chases_the_chain() {
        let defs = sample_definitions();
        let piece =
            GearPiece::from_record(&ItemRecord::new("a", "SPELT_HOE_1"), &defs).unwrap();
        let peak = piece.reference_peak(&defs);
        assert_eq!(peak.def.id, "SPELT_HOE_3");
        assert_eq!(peak.rarity, Rarity::Legendary);
        assert!(peak.attrs.rarity_upgraded);
        assert_eq!(peak.attrs.gems, vec![Some(GemQuality::Perfect); 2]);
        assert_eq!(peak.attrs.enchantments["harvesting"], 6);
        assert_eq!(peak.attrs.fortune_books, MAX_FORTUNE_BOOKS);
    }

    #[test]
    fn reference_peak_without_chain_is_own_definition() {
        let defs = sample_definitions();
        let piece =
            GearPiece::from_record(&ItemRecord::new("a", "CACTUS_BLADE"), &defs).unwrap();
        let peak = piece.reference_peak(&defs);
        assert_eq!(peak.def.id, "CACTUS_BLADE");
        assert_eq!(peak.rarity, Rarity::Epic);
    }
}
