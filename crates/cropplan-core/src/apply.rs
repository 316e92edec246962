//! The single application routine behind both live upgrades and planning.
//!
//! [`apply_to_piece`] and [`apply_change`] write the absolute values an
//! [`Upgrade`] carries onto state; [`apply_to_clone`] wraps the same routine
//! around a deep copy so planning can never leak into live state. All
//! derived values are recomputed from scratch on the next read, so a change
//! that touches several sources at once (rarity, for instance) needs no
//! special casing here.

use std::sync::Arc;

use cropplan_logic::definitions::Definitions;
use cropplan_logic::rarity::Rarity;

use crate::error::{EngineError, EngineResult};
use crate::gear::{default_rarity, GearAttributes, GearPiece, MAX_FORTUNE_BOOKS};
use crate::player::Player;
use crate::upgrades::{ItemChange, Upgrade, UpgradeTarget, WorldField};

/// Apply one change to a copy of a piece. The input is never touched.
pub fn apply_to_piece(
    piece: &GearPiece,
    change: &ItemChange,
    defs: &Definitions,
) -> EngineResult<GearPiece> {
    let mut next = piece.clone();
    match change {
        ItemChange::Enchant { id, level } => {
            let def = defs.enchant(id).ok_or_else(|| EngineError::InvalidUpgrade {
                reason: format!("unknown enchant '{id}'"),
            })?;
            next.attrs
                .enchantments
                .insert(id.clone(), (*level).min(def.max_level));
        }
        ItemChange::Reforge { id } => {
            if defs.reforge(id).is_none() {
                return Err(EngineError::InvalidUpgrade {
                    reason: format!("unknown reforge '{id}'"),
                });
            }
            next.attrs.reforge = Some(id.clone());
        }
        ItemChange::Gem { slot, quality } => {
            let socket = next.attrs.gems.get_mut(*slot).ok_or_else(|| {
                EngineError::InvalidUpgrade {
                    reason: format!("piece '{}' has no gem socket {slot}", piece.uid),
                }
            })?;
            *socket = Some(*quality);
        }
        ItemChange::RarityUpgrade => {
            // Already upgraded: applying again is a no-op, never a second bump.
            if !next.attrs.rarity_upgraded {
                next.attrs.rarity_upgraded = true;
                next.rarity = next
                    .rarity
                    .next()
                    .map(|r| r.min(next.def.max_rarity))
                    .unwrap_or(next.rarity);
            }
        }
        ItemChange::Replace { definition_id } => {
            next = replace_piece(piece, definition_id, defs)?;
        }
        ItemChange::FortuneBook { count } => {
            next.attrs.fortune_books = (*count).min(MAX_FORTUNE_BOOKS);
        }
    }
    Ok(next)
}

/// Build the next chain tier with the old piece's modifiers transferred.
/// The new instance takes its own definition's natural rarity; the
/// transferred upgrade flag bumps it one step, the same as on the old piece.
fn replace_piece(
    piece: &GearPiece,
    definition_id: &str,
    defs: &Definitions,
) -> EngineResult<GearPiece> {
    let def = defs
        .gear(definition_id)
        .ok_or_else(|| EngineError::UnknownDefinition {
            id: definition_id.to_string(),
        })?;
    let mut rarity = default_rarity(def);
    if piece.attrs.rarity_upgraded {
        rarity = rarity
            .next()
            .map(|r: Rarity| r.min(def.max_rarity))
            .unwrap_or(rarity);
    }
    let mut gems = piece.attrs.gems.clone();
    gems.resize(usize::from(def.gem_slots), None);
    Ok(GearPiece {
        uid: piece.uid.clone(),
        def: Arc::clone(def),
        rarity,
        attrs: GearAttributes {
            reforge: piece.attrs.reforge.clone(),
            enchantments: piece.attrs.enchantments.clone(),
            gems,
            rarity_upgraded: piece.attrs.rarity_upgraded,
            fortune_books: piece.attrs.fortune_books,
            counter: piece.attrs.counter,
        },
    })
}

/// Apply one upgrade to the player in place. Item replacement swaps the new
/// instance into the old one's collection position, so ordering and
/// selection indexes stay valid.
pub fn apply_change(player: &mut Player, upgrade: &Upgrade) -> EngineResult<()> {
    match &upgrade.target {
        UpgradeTarget::World { field, level } => {
            let world = &player.defs.world;
            match field {
                WorldField::SkillLevel => {
                    player.world.skill_level = (*level).min(world.skill_level.max_level);
                }
                WorldField::PlotsUnlocked => {
                    player.world.plots_unlocked = (*level).min(world.plots.max_level);
                }
                WorldField::CommunityUpgrade => {
                    player.world.community_upgrade =
                        (*level).min(world.community_upgrade.max_level);
                }
            }
            Ok(())
        }
        UpgradeTarget::Item { uid, change } => {
            let defs = Arc::clone(&player.defs);
            let slot = player
                .tools
                .iter_mut()
                .chain(player.armor.iter_mut())
                .chain(player.equipment.iter_mut())
                .chain(player.accessories.iter_mut())
                .find(|piece| piece.uid == *uid)
                .ok_or_else(|| EngineError::TargetNotFound { uid: uid.clone() })?;
            *slot = apply_to_piece(slot, change, &defs)?;
            Ok(())
        }
    }
}

/// Apply one upgrade to a deep copy of the player, leaving the original
/// untouched. This is the planning primitive.
pub fn apply_to_clone(player: &Player, upgrade: &Upgrade) -> EngineResult<Player> {
    let mut clone = player.clone();
    apply_change(&mut clone, upgrade)?;
    Ok(clone)
}
