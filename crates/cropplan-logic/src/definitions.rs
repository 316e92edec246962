//! Gear and pet definitions, upgrade chains, and the definition registry.
//!
//! Definitions are immutable external configuration. The engine only ever
//! reads them; entities share them by `Arc` so cloning a player never copies
//! a definition.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cost::UpgradeCost;
use crate::enchants::{EnchantDef, EnchantTier};
use crate::levels::LevelSource;
use crate::rarity::Rarity;
use crate::reforges::{GearCategory, ReforgeDef, ReforgeStone, ReforgeTier};
use crate::stats::{stat_map, Stat, StatMap};

/// What role a gear definition plays in a player's setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GearKind {
    Tool,
    Armor,
    Equipment,
    Accessory,
}

/// Wearable slot for armor and equipment pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GearSlot {
    Helmet,
    Chestplate,
    Leggings,
    Boots,
    Necklace,
    Cloak,
    Belt,
    Gloves,
}

impl GearSlot {
    /// All slots in display order.
    pub const ALL: [GearSlot; 8] = [
        GearSlot::Helmet,
        GearSlot::Chestplate,
        GearSlot::Leggings,
        GearSlot::Boots,
        GearSlot::Necklace,
        GearSlot::Cloak,
        GearSlot::Belt,
        GearSlot::Gloves,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GearSlot::Helmet => "Helmet",
            GearSlot::Chestplate => "Chestplate",
            GearSlot::Leggings => "Leggings",
            GearSlot::Boots => "Boots",
            GearSlot::Necklace => "Necklace",
            GearSlot::Cloak => "Cloak",
            GearSlot::Belt => "Belt",
            GearSlot::Gloves => "Gloves",
        }
    }
}

/// Why a definition points at another definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainReason {
    /// Standard next tier, always worth taking.
    NextTier,
    /// Not worth buying into; the chain ends here for planning purposes.
    DeadEnd,
    /// A sidegrade that is only sometimes preferred.
    Situational,
}

/// A pointer from one gear definition to its upgrade target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainLink {
    pub id: String,
    pub reason: ChainReason,
    /// Whether a situational link should be treated as real progress.
    /// Explicit data, never inferred.
    #[serde(default)]
    pub preferred: bool,
    #[serde(default)]
    pub why: Option<String>,
    #[serde(default)]
    pub cost: Option<UpgradeCost>,
}

impl ChainLink {
    /// Whether chasing this link counts as progress toward a piece's
    /// ceiling. Dead ends and non-preferred sidegrades do not.
    pub fn counts_as_progress(&self) -> bool {
        match self.reason {
            ChainReason::NextTier => true,
            ChainReason::DeadEnd => false,
            ChainReason::Situational => self.preferred,
        }
    }
}

/// Immutable description of one gear item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearDefinition {
    pub id: String,
    pub name: String,
    pub kind: GearKind,
    pub category: GearCategory,
    #[serde(default)]
    pub slot: Option<GearSlot>,
    /// Family for one-counted-per-family rules and set bonuses.
    #[serde(default)]
    pub family: Option<String>,
    /// Crop this piece is bound to (tools), if any.
    #[serde(default)]
    pub crop: Option<String>,
    pub max_rarity: Rarity,
    #[serde(default)]
    pub base_stats: StatMap,
    /// Per-rarity stat table. Looked up at the highest defined tier not
    /// above the piece's effective rarity.
    #[serde(default)]
    pub rarity_stats: BTreeMap<Rarity, StatMap>,
    #[serde(default)]
    pub gem_slots: u8,
    #[serde(default)]
    pub upgrade: Option<ChainLink>,
}

impl GearDefinition {
    /// Per-rarity stat at the given effective rarity (nearest tier at or
    /// below it; zero when no tier qualifies).
    pub fn rarity_stat(&self, rarity: Rarity, stat: Stat) -> f64 {
        self.rarity_stats
            .range(..=rarity)
            .next_back()
            .map(|(_, stats)| crate::stats::stat_value(stats, stat))
            .unwrap_or(0.0)
    }

    pub fn base_stat(&self, stat: Stat) -> f64 {
        crate::stats::stat_value(&self.base_stats, stat)
    }
}

/// Immutable description of one pet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetDefinition {
    pub id: String,
    pub name: String,
    pub max_level: u32,
    #[serde(default)]
    pub base_stats: StatMap,
    #[serde(default)]
    pub per_level: StatMap,
}

/// Stepped armor set bonus, defined only at piece counts 2 to 4.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetBonus {
    pub name: String,
    pub tiers: BTreeMap<u8, StatMap>,
}

impl SetBonus {
    /// Bonus at the given equipped piece count; counts outside the defined
    /// range contribute zero.
    pub fn stat_at(&self, count: u8, stat: Stat) -> f64 {
        self.tiers
            .get(&count)
            .map(|stats| crate::stats::stat_value(stats, stat))
            .unwrap_or(0.0)
    }
}

/// Level sources for the player's scalar world fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSources {
    pub skill_level: LevelSource,
    pub plots: LevelSource,
    pub community_upgrade: LevelSource,
}

/// The injected definition registry. Declaration order of enchants and
/// reforges is significant: it fixes source ordering and ranking
/// tie-breaks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Definitions {
    pub gear: BTreeMap<String, Arc<GearDefinition>>,
    pub pets: BTreeMap<String, Arc<PetDefinition>>,
    pub enchants: Vec<Arc<EnchantDef>>,
    pub reforges: Vec<Arc<ReforgeDef>>,
    /// Set bonuses keyed by gear family.
    pub set_bonuses: BTreeMap<String, SetBonus>,
    pub world: WorldSources,
}

/// Safety cap when walking upgrade chains, in case config contains a cycle.
const MAX_CHAIN_STEPS: usize = 32;

impl Definitions {
    pub fn gear(&self, id: &str) -> Option<&Arc<GearDefinition>> {
        self.gear.get(id)
    }

    pub fn pet(&self, id: &str) -> Option<&Arc<PetDefinition>> {
        self.pets.get(id)
    }

    pub fn reforge(&self, id: &str) -> Option<&Arc<ReforgeDef>> {
        self.reforges.iter().find(|r| r.id == id)
    }

    pub fn enchant(&self, id: &str) -> Option<&Arc<EnchantDef>> {
        self.enchants.iter().find(|e| e.id == id)
    }

    pub fn set_bonus(&self, family: &str) -> Option<&SetBonus> {
        self.set_bonuses.get(family)
    }

    /// Enchants applicable to a gear category, in declaration order.
    pub fn enchants_for(
        &self,
        category: GearCategory,
    ) -> impl Iterator<Item = &Arc<EnchantDef>> + '_ {
        self.enchants.iter().filter(move |e| e.applies_to(category))
    }

    /// Reforges applicable to a gear category, in declaration order.
    pub fn reforges_for(
        &self,
        category: GearCategory,
    ) -> impl Iterator<Item = &Arc<ReforgeDef>> + '_ {
        self.reforges.iter().filter(move |r| r.applies_to(category))
    }

    /// The final definition reachable from `def` by chasing progress links.
    /// Returns `None` when no link is followed (the piece is already final),
    /// mirroring "no upgrade chain means the piece is its own ceiling".
    /// A link to a missing definition ends the chase rather than failing.
    pub fn final_tier(&self, def: &GearDefinition) -> Option<Arc<GearDefinition>> {
        let mut current: Option<Arc<GearDefinition>> = None;
        let mut link = def.upgrade.as_ref();
        for _ in 0..MAX_CHAIN_STEPS {
            let Some(next_link) = link.filter(|l| l.counts_as_progress()) else {
                break;
            };
            let Some(next) = self.gear(&next_link.id) else {
                break;
            };
            current = Some(Arc::clone(next));
            link = next.upgrade.as_ref();
        }
        current
    }

    /// Check that every upgrade-chain pointer resolves. Unknown ids in
    /// chains are configuration errors; callers that want them fatal run
    /// this once after loading config.
    pub fn validate(&self) -> Result<(), String> {
        for def in self.gear.values() {
            if let Some(link) = &def.upgrade {
                if self.gear(&link.id).is_none() {
                    return Err(format!(
                        "gear '{}' upgrade chain points at unknown definition '{}'",
                        def.id, link.id
                    ));
                }
            }
        }
        Ok(())
    }
}

fn gear_def(def: GearDefinition) -> (String, Arc<GearDefinition>) {
    (def.id.clone(), Arc::new(def))
}

fn rarity_ff_table(entries: &[(Rarity, f64)]) -> BTreeMap<Rarity, StatMap> {
    entries
        .iter()
        .map(|(rarity, ff)| (*rarity, stat_map(Stat::FarmingFortune, *ff)))
        .collect()
}

fn reforge_ff_tiers(entries: &[(Rarity, f64, u64)]) -> BTreeMap<Rarity, ReforgeTier> {
    entries
        .iter()
        .map(|(rarity, ff, apply_cost)| {
            (
                *rarity,
                ReforgeTier {
                    stats: stat_map(Stat::FarmingFortune, *ff),
                    apply_cost: *apply_cost,
                },
            )
        })
        .collect()
}

/// A standard, coherent dataset covering every definition feature: tool
/// tier chains, a situational boots sidegrade, an armor set bonus, tiered
/// accessories, a milestone-scaled enchant, and an optional reforge.
/// Used by tests and demos; real deployments inject their own tables.
pub fn sample_definitions() -> Definitions {
    let mut gear = BTreeMap::new();

    // Wheat tool line: three tiers.
    gear.extend([
        gear_def(GearDefinition {
            id: "SPELT_HOE_1".into(),
            name: "Spelt Hoe".into(),
            kind: GearKind::Tool,
            category: GearCategory::Hoe,
            slot: None,
            family: None,
            crop: Some("wheat".into()),
            max_rarity: Rarity::Rare,
            base_stats: stat_map(Stat::FarmingFortune, 10.0),
            rarity_stats: BTreeMap::new(),
            gem_slots: 0,
            upgrade: Some(ChainLink {
                id: "SPELT_HOE_2".into(),
                reason: ChainReason::NextTier,
                preferred: false,
                why: None,
                cost: Some(UpgradeCost::item("ENRICHED_SEEDS", 64)),
            }),
        }),
        gear_def(GearDefinition {
            id: "SPELT_HOE_2".into(),
            name: "Spelt Hoe II".into(),
            kind: GearKind::Tool,
            category: GearCategory::Hoe,
            slot: None,
            family: None,
            crop: Some("wheat".into()),
            max_rarity: Rarity::Epic,
            base_stats: stat_map(Stat::FarmingFortune, 25.0),
            rarity_stats: BTreeMap::new(),
            gem_slots: 1,
            upgrade: Some(ChainLink {
                id: "SPELT_HOE_3".into(),
                reason: ChainReason::NextTier,
                preferred: false,
                why: None,
                cost: Some(UpgradeCost::item("ENRICHED_SEEDS", 256)),
            }),
        }),
        gear_def(GearDefinition {
            id: "SPELT_HOE_3".into(),
            name: "Spelt Hoe III".into(),
            kind: GearKind::Tool,
            category: GearCategory::Hoe,
            slot: None,
            family: None,
            crop: Some("wheat".into()),
            max_rarity: Rarity::Legendary,
            base_stats: {
                let mut stats = stat_map(Stat::FarmingFortune, 50.0);
                stats.insert(Stat::FarmingWisdom, 5.0);
                stats
            },
            rarity_stats: BTreeMap::new(),
            gem_slots: 2,
            upgrade: None,
        }),
        // Standalone cactus tool: one gem socket, no chain.
        gear_def(GearDefinition {
            id: "CACTUS_BLADE".into(),
            name: "Cactus Blade".into(),
            kind: GearKind::Tool,
            category: GearCategory::Hoe,
            slot: None,
            family: None,
            crop: Some("cactus".into()),
            max_rarity: Rarity::Epic,
            base_stats: stat_map(Stat::FarmingFortune, 20.0),
            rarity_stats: BTreeMap::new(),
            gem_slots: 1,
            upgrade: None,
        }),
    ]);

    // Verdant armor family with a set bonus, plus an entry-level helmet
    // that upgrades into it and a situational boots alternative.
    let verdant_rarities = rarity_ff_table(&[
        (Rarity::Rare, 20.0),
        (Rarity::Epic, 25.0),
        (Rarity::Legendary, 30.0),
    ]);
    for (id, name, slot) in [
        ("VERDANT_HELMET", "Verdant Helmet", GearSlot::Helmet),
        (
            "VERDANT_CHESTPLATE",
            "Verdant Chestplate",
            GearSlot::Chestplate,
        ),
        ("VERDANT_LEGGINGS", "Verdant Leggings", GearSlot::Leggings),
        ("VERDANT_BOOTS", "Verdant Boots", GearSlot::Boots),
    ] {
        gear.extend([gear_def(GearDefinition {
            id: id.into(),
            name: name.into(),
            kind: GearKind::Armor,
            category: GearCategory::Armor,
            slot: Some(slot),
            family: Some("VERDANT".into()),
            crop: None,
            max_rarity: Rarity::Legendary,
            base_stats: stat_map(Stat::FarmingFortune, 5.0),
            rarity_stats: verdant_rarities.clone(),
            gem_slots: 1,
            upgrade: None,
        })]);
    }
    gear.extend([
        gear_def(GearDefinition {
            id: "GOURD_HELMET".into(),
            name: "Gourd Helmet".into(),
            kind: GearKind::Armor,
            category: GearCategory::Armor,
            slot: Some(GearSlot::Helmet),
            family: None,
            crop: None,
            max_rarity: Rarity::Epic,
            base_stats: stat_map(Stat::FarmingFortune, 25.0),
            rarity_stats: BTreeMap::new(),
            gem_slots: 0,
            upgrade: Some(ChainLink {
                id: "VERDANT_HELMET".into(),
                reason: ChainReason::NextTier,
                preferred: false,
                why: None,
                cost: Some(UpgradeCost::coins(250_000)),
            }),
        }),
        gear_def(GearDefinition {
            id: "SWIFT_BOOTS".into(),
            name: "Swift Boots".into(),
            kind: GearKind::Armor,
            category: GearCategory::Armor,
            slot: Some(GearSlot::Boots),
            family: None,
            crop: None,
            max_rarity: Rarity::Legendary,
            base_stats: stat_map(Stat::FarmingFortune, 22.0),
            rarity_stats: BTreeMap::new(),
            gem_slots: 1,
            upgrade: Some(ChainLink {
                id: "VERDANT_BOOTS".into(),
                reason: ChainReason::Situational,
                preferred: false,
                why: Some(
                    "Verdant Boots grant more fortune but give up the speed control ability"
                        .into(),
                ),
                cost: Some(UpgradeCost::coins(400_000)),
            }),
        }),
    ]);

    // Nettle equipment family.
    for (id, name, slot) in [
        ("NETTLE_BELT", "Nettle Belt", GearSlot::Belt),
        ("NETTLE_GLOVES", "Nettle Gloves", GearSlot::Gloves),
    ] {
        gear.extend([gear_def(GearDefinition {
            id: id.into(),
            name: name.into(),
            kind: GearKind::Equipment,
            category: GearCategory::Equipment,
            slot: Some(slot),
            family: Some("NETTLE".into()),
            crop: None,
            max_rarity: Rarity::Legendary,
            base_stats: stat_map(Stat::FarmingFortune, 8.0),
            rarity_stats: BTreeMap::new(),
            gem_slots: 0,
            upgrade: None,
        })]);
    }

    // Growth accessory family in two tiers.
    gear.extend([
        gear_def(GearDefinition {
            id: "GROWTH_CHARM".into(),
            name: "Growth Charm".into(),
            kind: GearKind::Accessory,
            category: GearCategory::Equipment,
            slot: None,
            family: Some("GROWTH".into()),
            crop: None,
            max_rarity: Rarity::Uncommon,
            base_stats: stat_map(Stat::FarmingFortune, 10.0),
            rarity_stats: BTreeMap::new(),
            gem_slots: 0,
            upgrade: Some(ChainLink {
                id: "GROWTH_RELIC".into(),
                reason: ChainReason::NextTier,
                preferred: false,
                why: None,
                cost: Some(UpgradeCost::coins(100_000)),
            }),
        }),
        gear_def(GearDefinition {
            id: "GROWTH_RELIC".into(),
            name: "Growth Relic".into(),
            kind: GearKind::Accessory,
            category: GearCategory::Equipment,
            slot: None,
            family: Some("GROWTH".into()),
            crop: None,
            max_rarity: Rarity::Rare,
            base_stats: stat_map(Stat::FarmingFortune, 20.0),
            rarity_stats: BTreeMap::new(),
            gem_slots: 1,
            upgrade: None,
        }),
    ]);

    let mut pets = BTreeMap::new();
    pets.insert(
        "HARVEST_HARE".to_string(),
        Arc::new(PetDefinition {
            id: "HARVEST_HARE".into(),
            name: "Harvest Hare".into(),
            max_level: 100,
            base_stats: stat_map(Stat::FarmingFortune, 10.0),
            per_level: stat_map(Stat::FarmingFortune, 0.5),
        }),
    );

    let enchants = vec![
        Arc::new(EnchantDef {
            id: "harvesting".into(),
            name: "Harvesting".into(),
            applies_to: vec![GearCategory::Hoe],
            crop: None,
            min_level: 1,
            max_level: 6,
            levels: (1..=6u8)
                .map(|level| {
                    (
                        level,
                        EnchantTier {
                            stats: stat_map(Stat::FarmingFortune, 12.5 * f64::from(level)),
                            ..EnchantTier::default()
                        },
                    )
                })
                .collect(),
        }),
        Arc::new(EnchantDef {
            id: "cultivating".into(),
            name: "Cultivating".into(),
            applies_to: vec![GearCategory::Hoe, GearCategory::Axe],
            crop: None,
            min_level: 1,
            max_level: 10,
            levels: (1..=10u8)
                .map(|level| {
                    let mut stats = stat_map(Stat::FarmingFortune, 2.0 * f64::from(level));
                    stats.insert(Stat::FarmingWisdom, f64::from(level));
                    (
                        level,
                        EnchantTier {
                            stats,
                            ..EnchantTier::default()
                        },
                    )
                })
                .collect(),
        }),
        Arc::new(EnchantDef {
            id: "dedication".into(),
            name: "Dedication".into(),
            applies_to: vec![GearCategory::Hoe],
            crop: None,
            min_level: 1,
            max_level: 4,
            levels: [(1u8, 0.5), (2, 0.75), (3, 1.0), (4, 2.0)]
                .into_iter()
                .map(|(level, factor)| {
                    (
                        level,
                        EnchantTier {
                            per_milestone: stat_map(Stat::FarmingFortune, factor),
                            ..EnchantTier::default()
                        },
                    )
                })
                .collect(),
        }),
        Arc::new(EnchantDef {
            id: "repellent".into(),
            name: "Repellent".into(),
            applies_to: vec![GearCategory::Armor],
            crop: None,
            min_level: 1,
            max_level: 5,
            levels: (1..=5u8)
                .map(|level| {
                    (
                        level,
                        EnchantTier {
                            stats: stat_map(Stat::FarmingFortune, 2.0 * f64::from(level)),
                            ..EnchantTier::default()
                        },
                    )
                })
                .collect(),
        }),
    ];

    let all_rarities = |values: [f64; 6], costs: [u64; 6]| -> Vec<(Rarity, f64, u64)> {
        Rarity::ALL
            .iter()
            .zip(values)
            .zip(costs)
            .map(|((rarity, ff), cost)| (*rarity, ff, cost))
            .collect()
    };

    let reforges = vec![
        Arc::new(ReforgeDef {
            id: "blessed".into(),
            name: "Blessed".into(),
            applies_to: vec![GearCategory::Hoe, GearCategory::Axe],
            tiers: reforge_ff_tiers(&all_rarities(
                [10.0, 15.0, 20.0, 25.0, 30.0, 35.0],
                [100, 200, 400, 800, 1500, 3000],
            )),
            stone: Some(ReforgeStone {
                item_id: "BLESSED_FRUIT".into(),
                coins: 500,
                copper: 0,
            }),
            optional: false,
        }),
        // Same fortune as Blessed; kept around for its coin bonus, so it is
        // an intentional sidegrade.
        Arc::new(ReforgeDef {
            id: "bountiful".into(),
            name: "Bountiful".into(),
            applies_to: vec![GearCategory::Hoe, GearCategory::Axe],
            tiers: reforge_ff_tiers(&all_rarities(
                [10.0, 15.0, 20.0, 25.0, 30.0, 35.0],
                [100, 200, 400, 800, 1500, 3000],
            )),
            stone: Some(ReforgeStone {
                item_id: "GOLDEN_BALL".into(),
                coins: 1000,
                copper: 0,
            }),
            optional: true,
        }),
        Arc::new(ReforgeDef {
            id: "mossy".into(),
            name: "Mossy".into(),
            applies_to: vec![GearCategory::Armor],
            tiers: reforge_ff_tiers(&all_rarities(
                [5.0, 10.0, 15.0, 20.0, 25.0, 30.0],
                [50, 100, 200, 400, 800, 1600],
            )),
            stone: Some(ReforgeStone {
                item_id: "OVERGROWN_GRASS".into(),
                coins: 200,
                copper: 0,
            }),
            optional: false,
        }),
        // Strictly dominated by Mossy; exercises the non-domination filter.
        Arc::new(ReforgeDef {
            id: "sturdy".into(),
            name: "Sturdy".into(),
            applies_to: vec![GearCategory::Armor],
            tiers: reforge_ff_tiers(&all_rarities(
                [2.0, 4.0, 6.0, 8.0, 10.0, 12.0],
                [50, 100, 200, 400, 800, 1600],
            )),
            stone: None,
            optional: false,
        }),
        Arc::new(ReforgeDef {
            id: "rooted".into(),
            name: "Rooted".into(),
            applies_to: vec![GearCategory::Equipment],
            tiers: reforge_ff_tiers(&all_rarities(
                [3.0, 6.0, 9.0, 12.0, 15.0, 18.0],
                [50, 100, 200, 400, 800, 1600],
            )),
            stone: Some(ReforgeStone {
                item_id: "DEEP_ROOT".into(),
                coins: 300,
                copper: 0,
            }),
            optional: false,
        }),
    ];

    let mut set_bonuses = BTreeMap::new();
    set_bonuses.insert(
        "VERDANT".to_string(),
        SetBonus {
            name: "Verdant Vigor".into(),
            tiers: [
                (2u8, stat_map(Stat::FarmingFortune, 10.0)),
                (3, stat_map(Stat::FarmingFortune, 20.0)),
                (4, stat_map(Stat::FarmingFortune, 40.0)),
            ]
            .into_iter()
            .collect(),
        },
    );

    Definitions {
        gear,
        pets,
        enchants,
        reforges,
        set_bonuses,
        world: WorldSources {
            skill_level: LevelSource::new("Farming Level", 4.0, 60),
            plots: LevelSource::new("Unlocked Plots", 3.0, 8)
                .with_step_cost(UpgradeCost::item("COMPOST_BUNDLE", 16)),
            community_upgrade: LevelSource::new("Community Upgrades", 2.0, 10),
        },
    }
}
