//! Upgrade candidates: concrete next steps with their exact stat gain.
//!
//! Every generator works the same way: build the [`ItemChange`] it would
//! apply, apply it to a throwaway copy of the piece, and report the value
//! difference. Deltas therefore come from the same evaluation code as live
//! state, so non-linear formulas (milestone-scaled enchants, rarity-scaled
//! gems and reforges) are respected exactly.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use cropplan_logic::cost::UpgradeCost;
use cropplan_logic::definitions::ChainReason;
use cropplan_logic::enchants::EnchantDef;
use cropplan_logic::gems::GemQuality;
use cropplan_logic::levels::level_fortune;
use cropplan_logic::reforges::reforge_stat;
use cropplan_logic::stats::{add_stat, stat_value, Stat, StatMap};

use crate::apply::apply_to_piece;
use crate::gear::{GearPiece, MAX_FORTUNE_BOOKS};
use crate::player::WorldState;
use crate::sources::{piece_value, EvalContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeCategory {
    Enchant,
    Reforge,
    Gem,
    Rarity,
    /// Replacing the whole item with its next chain tier.
    Item,
    Skill,
    World,
    Misc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeAction {
    Apply,
    LevelUp,
    RarityUpgrade,
    Purchase,
    Unlock,
}

/// The exact mutation an item-targeted upgrade performs. Values are
/// absolute, not incremental, so re-applying a stale candidate can never
/// push state past what the candidate described.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemChange {
    Enchant { id: String, level: u8 },
    Reforge { id: String },
    Gem { slot: usize, quality: GemQuality },
    RarityUpgrade,
    Replace { definition_id: String },
    FortuneBook { count: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorldField {
    SkillLevel,
    PlotsUnlocked,
    CommunityUpgrade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UpgradeTarget {
    Item { uid: String, change: ItemChange },
    World { field: WorldField, level: u32 },
}

/// One atomic candidate change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upgrade {
    pub title: String,
    pub category: UpgradeCategory,
    pub action: UpgradeAction,
    /// A sidegrade worth surfacing even without a strict stat gain.
    pub optional: bool,
    pub increase: StatMap,
    pub cost: UpgradeCost,
    pub target: UpgradeTarget,
}

impl Upgrade {
    pub fn fortune_increase(&self) -> f64 {
        stat_value(&self.increase, Stat::FarmingFortune)
    }
}

/// Sort candidates descending by primary-stat gain. The sort is stable, so
/// equal gains keep their source declaration order.
pub fn rank(candidates: &mut [Upgrade]) {
    candidates.sort_by(|a, b| {
        b.fortune_increase()
            .partial_cmp(&a.fortune_increase())
            .unwrap_or(Ordering::Equal)
    });
}

/// Stat gain of moving a piece from `before` to `after`.
fn gain(before: &GearPiece, after: &GearPiece, ctx: &EvalContext) -> StatMap {
    let mut increase = StatMap::new();
    for stat in Stat::ALL {
        add_stat(
            &mut increase,
            stat,
            piece_value(after, ctx, stat) - piece_value(before, ctx, stat),
        );
    }
    increase
}

/// Build an item-targeted upgrade by simulating its change on the piece.
fn simulated(
    piece: &GearPiece,
    ctx: &EvalContext,
    change: ItemChange,
    title: String,
    category: UpgradeCategory,
    action: UpgradeAction,
    optional: bool,
    cost: UpgradeCost,
) -> Option<Upgrade> {
    let after = apply_to_piece(piece, &change, ctx.defs).ok()?;
    Some(Upgrade {
        title,
        category,
        action,
        optional,
        increase: gain(piece, &after, ctx),
        cost,
        target: UpgradeTarget::Item {
            uid: piece.uid.clone(),
            change,
        },
    })
}

/// Next enchant step: apply at the minimum level, or raise by one. No
/// candidate at the level cap.
pub fn enchant_candidate(
    piece: &GearPiece,
    def: &EnchantDef,
    ctx: &EvalContext,
) -> Option<Upgrade> {
    let level = piece.attrs.enchantments.get(&def.id).copied().unwrap_or(0);
    let target = if level == 0 {
        def.min_level
    } else if level < def.max_level {
        level + 1
    } else {
        return None;
    };
    let mut cost = UpgradeCost::item(def.book_item_id(target), 1);
    if let Some(extra) = def.levels.get(&target).and_then(|tier| tier.cost.as_ref()) {
        cost.merge(extra);
    }
    simulated(
        piece,
        ctx,
        ItemChange::Enchant {
            id: def.id.clone(),
            level: target,
        },
        format!("{} {}", def.name, target),
        UpgradeCategory::Enchant,
        if level == 0 {
            UpgradeAction::Apply
        } else {
            UpgradeAction::LevelUp
        },
        false,
        cost,
    )
}

/// Reforges that beat the currently applied one at the piece's rarity.
/// A reforge marked optional is also offered on an exact tie, flagged so a
/// caller can present it as a sidegrade.
pub fn reforge_candidates(piece: &GearPiece, ctx: &EvalContext) -> Vec<Upgrade> {
    let current_value = piece
        .attrs
        .reforge
        .as_ref()
        .and_then(|id| ctx.defs.reforge(id))
        .map(|def| reforge_stat(def, piece.rarity, Stat::FarmingFortune))
        .unwrap_or(0.0);

    ctx.defs
        .reforges_for(piece.def.category)
        .filter(|def| piece.attrs.reforge.as_deref() != Some(def.id.as_str()))
        .filter(|def| {
            let value = reforge_stat(def, piece.rarity, Stat::FarmingFortune);
            value > current_value || (def.optional && value >= current_value)
        })
        .filter_map(|def| {
            let mut cost = UpgradeCost::default();
            if let Some(stone) = &def.stone {
                cost.merge(&UpgradeCost::item(stone.item_id.clone(), 1));
                cost.coins = cost.coins.saturating_add(stone.coins);
                cost.copper = cost.copper.saturating_add(stone.copper);
            }
            if let Some(tier) = def.tiers.get(&piece.rarity) {
                cost.coins = cost.coins.saturating_add(tier.apply_cost);
            }
            simulated(
                piece,
                ctx,
                ItemChange::Reforge { id: def.id.clone() },
                format!("{} Reforge", def.name),
                UpgradeCategory::Reforge,
                UpgradeAction::Apply,
                def.optional,
                cost,
            )
        })
        .collect()
}

/// Per socket: fill an empty socket with a fine gem, or step a filled one
/// to the next quality. Gem values are taken at the piece's current rarity.
pub fn gem_candidates(piece: &GearPiece, ctx: &EvalContext) -> Vec<Upgrade> {
    piece
        .attrs
        .gems
        .iter()
        .enumerate()
        .filter_map(|(slot, socket)| {
            let (quality, action) = match socket {
                None => (GemQuality::Fine, UpgradeAction::Apply),
                Some(current) => (current.next()?, UpgradeAction::LevelUp),
            };
            simulated(
                piece,
                ctx,
                ItemChange::Gem { slot, quality },
                format!("{} Peridot Gem", quality.name()),
                UpgradeCategory::Gem,
                action,
                false,
                UpgradeCost::item(quality.item_id(), 1),
            )
        })
        .collect()
}

/// Consumable id of the item that raises a piece's rarity ceiling flag.
pub const RARITY_UPGRADE_ITEM: &str = "RARITY_UPGRADE_STONE";

/// One-time rarity bump. The gain covers everything rarity touches at
/// once: per-rarity stats, gem values, and the reforge tier.
pub fn rarity_candidate(piece: &GearPiece, ctx: &EvalContext) -> Option<Upgrade> {
    if piece.attrs.rarity_upgraded {
        return None;
    }
    let next = piece.rarity.next().filter(|r| *r <= piece.def.max_rarity)?;
    simulated(
        piece,
        ctx,
        ItemChange::RarityUpgrade,
        format!("{} Rarity Upgrade", next.name()),
        UpgradeCategory::Rarity,
        UpgradeAction::RarityUpgrade,
        false,
        UpgradeCost::item(RARITY_UPGRADE_ITEM, 1),
    )
}

/// Replace the piece with its declared next tier. Dead-end links produce
/// nothing; situational links are offered as optional sidegrades. The gain
/// compares a fresh instance of the next tier against the current total,
/// since modifiers transfer on application anyway.
pub fn replacement_candidate(piece: &GearPiece, ctx: &EvalContext) -> Option<Upgrade> {
    let link = piece.def.upgrade.as_ref()?;
    if link.reason == ChainReason::DeadEnd {
        return None;
    }
    let next_def = ctx.defs.gear(&link.id)?;
    let fresh = GearPiece::from_definition(piece.uid.clone(), next_def);

    let mut increase = StatMap::new();
    for stat in Stat::ALL {
        add_stat(
            &mut increase,
            stat,
            piece_value(&fresh, ctx, stat) - piece_value(piece, ctx, stat),
        );
    }
    Some(Upgrade {
        title: format!("Upgrade to {}", next_def.name),
        category: UpgradeCategory::Item,
        action: UpgradeAction::Purchase,
        optional: link.reason == ChainReason::Situational,
        increase,
        cost: link.cost.clone().unwrap_or_default(),
        target: UpgradeTarget::Item {
            uid: piece.uid.clone(),
            change: ItemChange::Replace {
                definition_id: link.id.clone(),
            },
        },
    })
}

/// Next fortune book, up to the cap.
pub fn book_candidate(piece: &GearPiece, ctx: &EvalContext) -> Option<Upgrade> {
    let books = piece.attrs.fortune_books;
    if books >= MAX_FORTUNE_BOOKS {
        return None;
    }
    simulated(
        piece,
        ctx,
        ItemChange::FortuneBook { count: books + 1 },
        "Fortune Book".to_string(),
        UpgradeCategory::Misc,
        UpgradeAction::Apply,
        false,
        UpgradeCost::item("FORTUNE_BOOK", 1),
    )
}

/// Single-step increments on the player's scalar world fields, using the
/// same linear-with-cap formula as normal evaluation.
pub fn world_candidates(world: &WorldState, ctx: &EvalContext) -> Vec<Upgrade> {
    let fields = [
        (
            WorldField::SkillLevel,
            world.skill_level,
            &ctx.defs.world.skill_level,
            UpgradeCategory::Skill,
            UpgradeAction::LevelUp,
        ),
        (
            WorldField::PlotsUnlocked,
            world.plots_unlocked,
            &ctx.defs.world.plots,
            UpgradeCategory::World,
            UpgradeAction::Unlock,
        ),
        (
            WorldField::CommunityUpgrade,
            world.community_upgrade,
            &ctx.defs.world.community_upgrade,
            UpgradeCategory::World,
            UpgradeAction::LevelUp,
        ),
    ];

    fields
        .into_iter()
        .filter(|(_, level, source, _, _)| *level < source.max_level)
        .map(|(field, level, source, category, action)| {
            let delta = level_fortune(level + 1, source) - level_fortune(level, source);
            Upgrade {
                title: format!("{} {}", source.name, level + 1),
                category,
                action,
                optional: false,
                increase: cropplan_logic::stats::stat_map(Stat::FarmingFortune, delta),
                cost: source.step_cost.clone().unwrap_or_default(),
                target: UpgradeTarget::World {
                    field,
                    level: level + 1,
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use cropplan_logic::definitions::{sample_definitions, ChainLink, Definitions};
    use cropplan_logic::gems::gem_fortune;
    use cropplan_logic::rarity::Rarity;

    use crate::record::ItemRecord;

    fn ctx<'a>(defs: &'a Definitions, milestones: &'a BTreeMap<String, u32>) -> EvalContext<'a> {
        EvalContext { defs, milestones }
    }

    fn piece(defs: &Definitions, record: ItemRecord) -> GearPiece {
        GearPiece::from_record(&record, defs).unwrap()
    }

    #[test]
    fn unapplied_enchant_starts_at_minimum_level() {
        let defs = sample_definitions();
        let milestones = BTreeMap::new();
        let ctx = ctx(&defs, &milestones);
        let hoe = piece(&defs, ItemRecord::new("a", "SPELT_HOE_1"));

        let def = defs.enchant("harvesting").unwrap();
        let candidate = enchant_candidate(&hoe, def, &ctx).unwrap();
        assert_eq!(candidate.title, "Harvesting 1");
        assert_eq!(candidate.action, UpgradeAction::Apply);
        assert_eq!(candidate.fortune_increase(), 12.5);
        assert_eq!(candidate.cost.items["HARVESTING_BOOK_1"], 1);
    }

    #[test]
    fn applied_enchant_steps_by_one_and_stops_at_cap() {
        let defs = sample_definitions();
        let milestones = BTreeMap::new();
        let ctx = ctx(&defs, &milestones);
        let def = defs.enchant("harvesting").unwrap();

        let mid = piece(&defs, ItemRecord::new("a", "SPELT_HOE_1").with_enchant("harvesting", 3));
        let candidate = enchant_candidate(&mid, def, &ctx).unwrap();
        assert_eq!(candidate.title, "Harvesting 4");
        assert_eq!(candidate.fortune_increase(), 12.5);
        assert_eq!(candidate.action, UpgradeAction::LevelUp);

        let capped =
            piece(&defs, ItemRecord::new("a", "SPELT_HOE_1").with_enchant("harvesting", 6));
        assert!(enchant_candidate(&capped, def, &ctx).is_none());
    }

    #[test]
    fn reforge_must_beat_the_current_one() {
        let defs = sample_definitions();
        let milestones = BTreeMap::new();
        let ctx = ctx(&defs, &milestones);

        // Mossy beats Sturdy at every rarity, so with Mossy applied nothing
        // but Mossy itself could qualify.
        let armor = piece(
            &defs,
            ItemRecord::new("a", "VERDANT_HELMET").with_reforge("mossy"),
        );
        let candidates = reforge_candidates(&armor, &ctx);
        assert!(candidates.is_empty());

        // Unreforged armor gets every strict improvement over nothing.
        let bare = piece(&defs, ItemRecord::new("a", "VERDANT_HELMET"));
        let ids: Vec<_> = reforge_candidates(&bare, &ctx)
            .iter()
            .map(|u| u.title.clone())
            .collect();
        assert!(ids.contains(&"Mossy Reforge".to_string()));
        assert!(ids.contains(&"Sturdy Reforge".to_string()));
    }

    #[test]
    fn optional_reforge_is_offered_on_a_tie() {
        let defs = sample_definitions();
        let milestones = BTreeMap::new();
        let ctx = ctx(&defs, &milestones);
        let hoe = piece(
            &defs,
            ItemRecord::new("a", "SPELT_HOE_1").with_reforge("blessed"),
        );

        let candidates = reforge_candidates(&hoe, &ctx);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Bountiful Reforge");
        assert!(candidates[0].optional);
        assert_eq!(candidates[0].fortune_increase(), 0.0);
    }

    #[test]
    fn gem_candidates_fill_then_step() {
        let defs = sample_definitions();
        let milestones = BTreeMap::new();
        let ctx = ctx(&defs, &milestones);

        // Default rarity for the blade is Rare.
        let empty = piece(&defs, ItemRecord::new("a", "CACTUS_BLADE"));
        let candidates = gem_candidates(&empty, &ctx);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].title, "Fine Peridot Gem");
        assert_eq!(
            candidates[0].fortune_increase(),
            gem_fortune(Rarity::Rare, GemQuality::Fine)
        );

        let filled = piece(
            &defs,
            ItemRecord::new("a", "CACTUS_BLADE").with_gems(vec![Some(GemQuality::Fine)]),
        );
        let candidates = gem_candidates(&filled, &ctx);
        assert_eq!(candidates[0].title, "Flawless Peridot Gem");
        assert_eq!(
            candidates[0].fortune_increase(),
            gem_fortune(Rarity::Rare, GemQuality::Flawless)
                - gem_fortune(Rarity::Rare, GemQuality::Fine)
        );

        let perfect = piece(
            &defs,
            ItemRecord::new("a", "CACTUS_BLADE").with_gems(vec![Some(GemQuality::Perfect)]),
        );
        assert!(gem_candidates(&perfect, &ctx).is_empty());
    }

    #[test]
    fn rarity_candidate_covers_every_rarity_scaled_source() {
        let defs = sample_definitions();
        let milestones = BTreeMap::new();
        let ctx = ctx(&defs, &milestones);
        let armor = piece(
            &defs,
            ItemRecord::new("a", "VERDANT_HELMET")
                .with_rarity(Rarity::Epic)
                .with_reforge("mossy")
                .with_gems(vec![Some(GemQuality::Fine)]),
        );

        let candidate = rarity_candidate(&armor, &ctx).unwrap();
        // Rarity table 25 -> 30, Mossy 20 -> 25, Fine gem 4 -> 5.
        assert_eq!(candidate.fortune_increase(), 5.0 + 5.0 + 1.0);
        assert_eq!(candidate.cost.items[RARITY_UPGRADE_ITEM], 1);

        let upgraded = piece(
            &defs,
            ItemRecord {
                rarity_upgraded: true,
                ..ItemRecord::new("a", "VERDANT_HELMET")
            },
        );
        assert!(rarity_candidate(&upgraded, &ctx).is_none());
    }

    #[test]
    fn replacement_compares_fresh_next_tier_against_current_total() {
        let defs = sample_definitions();
        let milestones = BTreeMap::new();
        let ctx = ctx(&defs, &milestones);
        let helmet = piece(&defs, ItemRecord::new("a", "GOURD_HELMET"));

        let candidate = replacement_candidate(&helmet, &ctx).unwrap();
        assert_eq!(candidate.title, "Upgrade to Verdant Helmet");
        // Fresh Verdant at its default Epic rarity: 5 base + 25 from the
        // rarity table, against the Gourd's flat 25.
        assert_eq!(candidate.fortune_increase(), 5.0);
        assert!(!candidate.optional);
        assert_eq!(candidate.cost.coins, 250_000);
    }

    #[test]
    fn situational_replacement_is_optional_and_dead_ends_are_silent() {
        let mut defs = sample_definitions();
        let milestones = BTreeMap::new();

        // Graft a dead-end link onto a copy of an existing definition.
        let mut dead = (*defs.gear("CACTUS_BLADE").unwrap().clone()).clone();
        dead.id = "BRITTLE_BLADE".into();
        dead.upgrade = Some(ChainLink {
            id: "CACTUS_BLADE".into(),
            reason: cropplan_logic::definitions::ChainReason::DeadEnd,
            preferred: false,
            why: None,
            cost: None,
        });
        defs.gear.insert(dead.id.clone(), Arc::new(dead));

        let ctx = ctx(&defs, &milestones);
        let boots = piece(&defs, ItemRecord::new("a", "SWIFT_BOOTS"));
        let candidate = replacement_candidate(&boots, &ctx).unwrap();
        assert!(candidate.optional);

        let brittle = piece(&defs, ItemRecord::new("b", "BRITTLE_BLADE"));
        assert!(replacement_candidate(&brittle, &ctx).is_none());
    }

    #[test]
    fn fortune_books_step_to_the_cap() {
        let defs = sample_definitions();
        let milestones = BTreeMap::new();
        let ctx = ctx(&defs, &milestones);

        let fresh = piece(&defs, ItemRecord::new("a", "SPELT_HOE_1"));
        let candidate = book_candidate(&fresh, &ctx).unwrap();
        assert_eq!(candidate.fortune_increase(), 1.0);

        let full = piece(
            &defs,
            ItemRecord {
                fortune_books: 5,
                ..ItemRecord::new("a", "SPELT_HOE_1")
            },
        );
        assert!(book_candidate(&full, &ctx).is_none());
    }

    #[test]
    fn world_candidates_step_scalar_fields() {
        let defs = sample_definitions();
        let milestones = BTreeMap::new();
        let ctx = ctx(&defs, &milestones);
        let world = WorldState {
            skill_level: 10,
            plots_unlocked: 8,
            community_upgrade: 0,
            milestones: BTreeMap::new(),
        };

        let candidates = world_candidates(&world, &ctx);
        // Plots are already capped, the other two fields step by one.
        assert_eq!(candidates.len(), 2);
        let skill = candidates
            .iter()
            .find(|u| matches!(u.target, UpgradeTarget::World { field: WorldField::SkillLevel, .. }))
            .unwrap();
        assert_eq!(skill.title, "Farming Level 11");
        assert_eq!(skill.fortune_increase(), 4.0);
    }

    #[test]
    fn ranking_is_descending_by_primary_gain() {
        let defs = sample_definitions();
        let milestones = BTreeMap::new();
        let ctx = ctx(&defs, &milestones);
        let hoe = piece(&defs, ItemRecord::new("a", "SPELT_HOE_1"));

        let mut candidates = reforge_candidates(&hoe, &ctx);
        candidates.extend(gem_candidates(&hoe, &ctx));
        if let Some(c) = book_candidate(&hoe, &ctx) {
            candidates.push(c);
        }
        rank(&mut candidates);
        for pair in candidates.windows(2) {
            assert!(pair[0].fortune_increase() >= pair[1].fortune_increase());
        }
    }
}
