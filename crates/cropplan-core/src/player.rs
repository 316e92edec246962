//! The player aggregate: gear collections, pets, and scalar world state.
//!
//! Aggregation is a full recompute on every query. Collections keep every
//! owned piece; counting rules (one piece per worn slot, one accessory per
//! family, the selected tool and pet) are applied at read time so a
//! reselection never loses data.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use cropplan_logic::definitions::{Definitions, GearKind, GearSlot};
use cropplan_logic::levels::level_fortune;
use cropplan_logic::stats::Stat;

use crate::apply;
use crate::error::EngineResult;
use crate::gear::GearPiece;
use crate::pet::Pet;
use crate::record::{ItemRecord, PetRecord};
use crate::sources::{piece_upgrades, piece_value, EvalContext, SourceProgress, TOLERANCE};
use crate::upgrades::{self, Upgrade, UpgradeTarget, WorldField};

/// Scalar player-wide fields that feed the score directly or scale other
/// sources (crop milestones).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub skill_level: u32,
    pub plots_unlocked: u32,
    pub community_upgrade: u32,
    /// Crop milestone levels keyed by crop id.
    #[serde(default)]
    pub milestones: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub defs: Arc<Definitions>,
    pub world: WorldState,
    pub tools: Vec<GearPiece>,
    pub armor: Vec<GearPiece>,
    pub equipment: Vec<GearPiece>,
    pub accessories: Vec<GearPiece>,
    pub pets: Vec<Pet>,
    pub selected_tool: Option<usize>,
    pub selected_pet: Option<usize>,
}

impl Player {
    /// Build a player from raw records. Any record naming an unknown
    /// definition fails the whole construction. Collections are sorted by
    /// descending fortune and the best tool and pet start selected.
    pub fn from_records(
        defs: Arc<Definitions>,
        world: WorldState,
        items: &[ItemRecord],
        pets: &[PetRecord],
    ) -> EngineResult<Player> {
        let mut tools = Vec::new();
        let mut armor = Vec::new();
        let mut equipment = Vec::new();
        let mut accessories = Vec::new();
        for record in items {
            let piece = GearPiece::from_record(record, &defs)?;
            match piece.kind() {
                GearKind::Tool => tools.push(piece),
                GearKind::Armor => armor.push(piece),
                GearKind::Equipment => equipment.push(piece),
                GearKind::Accessory => accessories.push(piece),
            }
        }
        let mut pets: Vec<Pet> = pets
            .iter()
            .map(|record| Pet::from_record(record, &defs))
            .collect::<EngineResult<_>>()?;

        {
            let ctx = EvalContext {
                defs: &defs,
                milestones: &world.milestones,
            };
            let by_fortune = |a: &GearPiece, b: &GearPiece| {
                piece_value(b, &ctx, Stat::FarmingFortune)
                    .partial_cmp(&piece_value(a, &ctx, Stat::FarmingFortune))
                    .unwrap_or(std::cmp::Ordering::Equal)
            };
            tools.sort_by(by_fortune);
            armor.sort_by(by_fortune);
            equipment.sort_by(by_fortune);
            accessories.sort_by(by_fortune);
            pets.sort_by(|a, b| {
                b.value(Stat::FarmingFortune)
                    .partial_cmp(&a.value(Stat::FarmingFortune))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        let selected_tool = (!tools.is_empty()).then_some(0);
        let selected_pet = (!pets.is_empty()).then_some(0);
        Ok(Player {
            defs,
            world,
            tools,
            armor,
            equipment,
            accessories,
            pets,
            selected_tool,
            selected_pet,
        })
    }

    pub fn ctx(&self) -> EvalContext<'_> {
        EvalContext {
            defs: &self.defs,
            milestones: &self.world.milestones,
        }
    }

    pub fn piece(&self, uid: &str) -> Option<&GearPiece> {
        self.all_pieces().find(|piece| piece.uid == uid)
    }

    pub fn all_pieces(&self) -> impl Iterator<Item = &GearPiece> + '_ {
        self.tools
            .iter()
            .chain(&self.armor)
            .chain(&self.equipment)
            .chain(&self.accessories)
    }

    pub fn selected_tool(&self) -> Option<&GearPiece> {
        self.selected_tool.and_then(|idx| self.tools.get(idx))
    }

    pub fn selected_pet(&self) -> Option<&Pet> {
        self.selected_pet.and_then(|idx| self.pets.get(idx))
    }

    /// The best piece per worn slot in a collection.
    fn worn<'a>(&self, pieces: &'a [GearPiece], stat: Stat) -> Vec<&'a GearPiece> {
        let ctx = self.ctx();
        let mut best: BTreeMap<GearSlot, &GearPiece> = BTreeMap::new();
        for piece in pieces {
            let Some(slot) = piece.def.slot else { continue };
            let replace = match best.get(&slot) {
                Some(current) => {
                    piece_value(piece, &ctx, stat) > piece_value(current, &ctx, stat)
                }
                None => true,
            };
            if replace {
                best.insert(slot, piece);
            }
        }
        best.into_values().collect()
    }

    /// The highest-value accessory of each family. Accessories without a
    /// family count individually.
    fn counted_accessories(&self, stat: Stat) -> Vec<&GearPiece> {
        let ctx = self.ctx();
        let mut best: BTreeMap<&str, &GearPiece> = BTreeMap::new();
        for piece in &self.accessories {
            let key = piece.def.family.as_deref().unwrap_or(&piece.def.id);
            let replace = match best.get(key) {
                Some(current) => {
                    piece_value(piece, &ctx, stat) > piece_value(current, &ctx, stat)
                }
                None => true,
            };
            if replace {
                best.insert(key, piece);
            }
        }
        best.into_values().collect()
    }

    /// Every piece that counts toward the total right now.
    fn counted_pieces(&self, stat: Stat) -> Vec<&GearPiece> {
        let mut counted = Vec::new();
        counted.extend(self.selected_tool());
        counted.extend(self.worn(&self.armor, stat));
        counted.extend(self.worn(&self.equipment, stat));
        counted.extend(self.counted_accessories(stat));
        counted
    }

    /// Named contributions toward a stat, in display order: world state,
    /// the selected tool, worn armor with set bonuses, worn equipment,
    /// counted accessories, and the selected pet. Zero entries are skipped.
    pub fn breakdown(&self, stat: Stat) -> Vec<(String, f64)> {
        let ctx = self.ctx();
        let mut entries: Vec<(String, f64)> = Vec::new();

        if stat == Stat::FarmingFortune {
            let world = &self.defs.world;
            entries.push((
                world.skill_level.name.clone(),
                level_fortune(self.world.skill_level, &world.skill_level),
            ));
            entries.push((
                world.plots.name.clone(),
                level_fortune(self.world.plots_unlocked, &world.plots),
            ));
            entries.push((
                world.community_upgrade.name.clone(),
                level_fortune(self.world.community_upgrade, &world.community_upgrade),
            ));
        }

        if let Some(tool) = self.selected_tool() {
            entries.push((tool.name().to_string(), piece_value(tool, &ctx, stat)));
        }

        let worn_armor = self.worn(&self.armor, stat);
        for piece in &worn_armor {
            entries.push((piece.name().to_string(), piece_value(piece, &ctx, stat)));
        }
        let mut family_counts: BTreeMap<&str, u8> = BTreeMap::new();
        for piece in &worn_armor {
            if let Some(family) = piece.def.family.as_deref() {
                *family_counts.entry(family).or_insert(0) += 1;
            }
        }
        for (family, count) in family_counts {
            if let Some(bonus) = self.defs.set_bonus(family) {
                entries.push((bonus.name.clone(), bonus.stat_at(count, stat)));
            }
        }

        for piece in self.worn(&self.equipment, stat) {
            entries.push((piece.name().to_string(), piece_value(piece, &ctx, stat)));
        }
        for piece in self.counted_accessories(stat) {
            entries.push((piece.name().to_string(), piece_value(piece, &ctx, stat)));
        }
        if let Some(pet) = self.selected_pet() {
            entries.push((pet.name().to_string(), pet.value(stat)));
        }

        entries.retain(|(_, value)| *value != 0.0);
        entries
    }

    pub fn total(&self, stat: Stat) -> f64 {
        self.breakdown(stat).iter().map(|(_, value)| value).sum()
    }

    /// Progress of the scalar world sources.
    pub fn world_progress(&self, stat: Stat) -> Vec<SourceProgress> {
        let ctx = self.ctx();
        let candidates = upgrades::world_candidates(&self.world, &ctx);
        let fields = [
            (
                WorldField::SkillLevel,
                self.world.skill_level,
                &self.defs.world.skill_level,
            ),
            (
                WorldField::PlotsUnlocked,
                self.world.plots_unlocked,
                &self.defs.world.plots,
            ),
            (
                WorldField::CommunityUpgrade,
                self.world.community_upgrade,
                &self.defs.world.community_upgrade,
            ),
        ];
        fields
            .into_iter()
            .map(|(field, level, source)| {
                let current = if stat == Stat::FarmingFortune {
                    level_fortune(level, source)
                } else {
                    0.0
                };
                let max = if stat == Stat::FarmingFortune {
                    source.max_fortune()
                } else {
                    0.0
                };
                let ratio = if max > TOLERANCE {
                    (current / max).min(1.0)
                } else {
                    0.0
                };
                SourceProgress {
                    name: source.name.clone(),
                    current,
                    max,
                    ratio,
                    upgrades: candidates
                        .iter()
                        .filter(|u| {
                            matches!(u.target, UpgradeTarget::World { field: f, .. } if f == field)
                        })
                        .cloned()
                        .collect(),
                }
            })
            .collect()
    }

    /// Every candidate across world fields and counted pieces, ranked
    /// descending by primary-stat gain.
    pub fn upgrades(&self) -> Vec<Upgrade> {
        let ctx = self.ctx();
        let mut candidates = upgrades::world_candidates(&self.world, &ctx);
        for piece in self.counted_pieces(Stat::FarmingFortune) {
            candidates.extend(piece_upgrades(piece, &ctx));
        }
        upgrades::rank(&mut candidates);
        candidates
    }

    /// Live, in-place mutation entry point. Planning never goes through
    /// here; it clones first.
    pub fn apply_upgrade(&mut self, upgrade: &Upgrade) -> EngineResult<()> {
        log::debug!("applying upgrade '{}'", upgrade.title);
        apply::apply_change(self, upgrade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cropplan_logic::definitions::sample_definitions;
    use cropplan_logic::rarity::Rarity;
    use crate::sources::piece_progress;

    fn player(items: &[ItemRecord], pets: &[PetRecord], world: WorldState) -> Player {
        Player::from_records(Arc::new(sample_definitions()), world, items, pets).unwrap()
    }

    #[test]
    fn plots_contribute_per_unlocked_plot() {
        let world = WorldState {
            plots_unlocked: 1,
            ..WorldState::default()
        };
        let player = player(&[], &[], world);
        let breakdown = player.breakdown(Stat::FarmingFortune);
        assert_eq!(breakdown, vec![("Unlocked Plots".to_string(), 3.0)]);
        assert_eq!(player.total(Stat::FarmingFortune), 3.0);
    }

    #[test]
    fn one_accessory_counts_per_family() {
        let items = [
            ItemRecord::new("charm", "GROWTH_CHARM"),
            ItemRecord::new("relic", "GROWTH_RELIC"),
        ];
        let player = player(&items, &[], WorldState::default());

        let breakdown = player.breakdown(Stat::FarmingFortune);
        assert!(breakdown.contains(&("Growth Relic".to_string(), 20.0)));
        assert!(!breakdown.iter().any(|(name, _)| name == "Growth Charm"));
        assert_eq!(player.total(Stat::FarmingFortune), 20.0);

        // The charm stays in the collection and is still queryable.
        assert_eq!(player.accessories.len(), 2);
        let charm = player.piece("charm").unwrap();
        let progress = piece_progress(charm, &player.ctx(), Stat::FarmingFortune);
        assert!(!progress.is_empty());
    }

    #[test]
    fn set_bonus_follows_worn_piece_count() {
        let two = [
            ItemRecord::new("h", "VERDANT_HELMET").with_rarity(Rarity::Rare),
            ItemRecord::new("c", "VERDANT_CHESTPLATE").with_rarity(Rarity::Rare),
        ];
        let player2 = player(&two, &[], WorldState::default());
        let breakdown = player2.breakdown(Stat::FarmingFortune);
        assert!(breakdown.contains(&("Verdant Vigor".to_string(), 10.0)));

        let four = [
            ItemRecord::new("h", "VERDANT_HELMET").with_rarity(Rarity::Rare),
            ItemRecord::new("c", "VERDANT_CHESTPLATE").with_rarity(Rarity::Rare),
            ItemRecord::new("l", "VERDANT_LEGGINGS").with_rarity(Rarity::Rare),
            ItemRecord::new("b", "VERDANT_BOOTS").with_rarity(Rarity::Rare),
        ];
        let player4 = player(&four, &[], WorldState::default());
        let breakdown = player4.breakdown(Stat::FarmingFortune);
        assert!(breakdown.contains(&("Verdant Vigor".to_string(), 40.0)));

        let one = [ItemRecord::new("h", "VERDANT_HELMET").with_rarity(Rarity::Rare)];
        let player1 = player(&one, &[], WorldState::default());
        let breakdown = player1.breakdown(Stat::FarmingFortune);
        assert!(!breakdown.iter().any(|(name, _)| name == "Verdant Vigor"));
    }

    #[test]
    fn only_the_best_piece_per_slot_is_worn() {
        let items = [
            ItemRecord::new("gourd", "GOURD_HELMET"),
            ItemRecord::new("verdant", "VERDANT_HELMET"),
        ];
        let player = player(&items, &[], WorldState::default());
        let breakdown = player.breakdown(Stat::FarmingFortune);
        // Verdant at its default Epic rarity is 30, the gourd only 25.
        assert!(breakdown.contains(&("Verdant Helmet".to_string(), 30.0)));
        assert!(!breakdown.iter().any(|(name, _)| name == "Gourd Helmet"));
    }

    #[test]
    fn best_tool_and_pet_start_selected() {
        let items = [
            ItemRecord::new("t1", "SPELT_HOE_1"),
            ItemRecord::new("t3", "SPELT_HOE_3"),
        ];
        let pets = [PetRecord::new("p", "HARVEST_HARE", 50)];
        let player = player(&items, &pets, WorldState::default());

        assert_eq!(player.selected_tool().unwrap().uid, "t3");
        assert_eq!(player.selected_pet().unwrap().uid, "p");
        let breakdown = player.breakdown(Stat::FarmingFortune);
        assert!(breakdown.contains(&("Spelt Hoe III".to_string(), 50.0)));
        assert!(breakdown.contains(&("Harvest Hare".to_string(), 35.0)));
    }

    #[test]
    fn secondary_stat_only_reads_contributing_sources() {
        let items = [ItemRecord::new("t", "SPELT_HOE_3")];
        let world = WorldState {
            skill_level: 10,
            ..WorldState::default()
        };
        let player = player(&items, &[], world);
        let breakdown = player.breakdown(Stat::FarmingWisdom);
        assert_eq!(breakdown, vec![("Spelt Hoe III".to_string(), 5.0)]);
    }

    #[test]
    fn world_progress_reports_levels_ceilings_and_candidates() {
        let world = WorldState {
            skill_level: 60,
            plots_unlocked: 2,
            ..WorldState::default()
        };
        let player = player(&[], &[], world);
        let progress = player.world_progress(Stat::FarmingFortune);

        let plots = progress
            .iter()
            .find(|p| p.name == "Unlocked Plots")
            .unwrap();
        assert_eq!(plots.current, 6.0);
        assert_eq!(plots.max, 24.0);
        assert!((plots.ratio - 0.25).abs() < TOLERANCE);
        assert_eq!(plots.upgrades.len(), 1);
        assert_eq!(plots.upgrades[0].title, "Unlocked Plots 3");
        assert_eq!(plots.upgrades[0].fortune_increase(), 3.0);
        assert_eq!(plots.upgrades[0].cost.items["COMPOST_BUNDLE"], 16);

        // A capped field reports a full bar and offers nothing further.
        let skill = progress.iter().find(|p| p.name == "Farming Level").unwrap();
        assert_eq!(skill.current, 240.0);
        assert_eq!(skill.ratio, 1.0);
        assert!(skill.upgrades.is_empty());

        // The secondary stat gets no world contributions.
        for entry in player.world_progress(Stat::FarmingWisdom) {
            assert_eq!(entry.current, 0.0);
            assert_eq!(entry.max, 0.0);
        }
    }

    #[test]
    fn player_upgrades_are_ranked_and_span_world_and_items() {
        let items = [ItemRecord::new("t", "SPELT_HOE_1")];
        let player = player(&items, &[], WorldState::default());
        let candidates = player.upgrades();
        assert!(candidates
            .iter()
            .any(|u| matches!(u.target, UpgradeTarget::World { .. })));
        assert!(candidates
            .iter()
            .any(|u| matches!(u.target, UpgradeTarget::Item { .. })));
        for pair in candidates.windows(2) {
            assert!(pair[0].fortune_increase() >= pair[1].fortune_increase());
        }
    }
}
