//! The source abstraction: per-piece contribution rules.
//!
//! Every gear piece is evaluated as an ordered list of sources. Each source
//! reports whether it applies, how much it currently contributes, and how
//! much it could contribute on the fully-upgraded reference instance of the
//! piece. A piece's value for a stat is by definition the sum of `current`
//! over its existing sources, so the breakdown always reconciles with the
//! total.
//!
//! All contribution formulas are total: anything missing or out of range
//! reads as zero, and "does this apply at all" lives entirely in
//! [`GearSource::exists`].

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use cropplan_logic::definitions::{Definitions, GearKind};
use cropplan_logic::enchants::{enchant_stat, EnchantDef};
use cropplan_logic::gems::{gem_fortune, ACCESSORY_GEM_FACTOR};
use cropplan_logic::reforges::reforge_stat;
use cropplan_logic::stats::Stat;

use crate::gear::GearPiece;
use crate::upgrades::{self, Upgrade};

/// Tolerance for floating-point reconciliation of sums and ratios.
pub const TOLERANCE: f64 = 1e-6;

/// Fortune granted per consumed fortune book.
pub const FORTUNE_PER_BOOK: f64 = 1.0;

/// Read-only state every evaluation needs besides the piece itself.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub defs: &'a Definitions,
    /// Crop milestone levels, for milestone-scaled enchants.
    pub milestones: &'a BTreeMap<String, u32>,
}

impl<'a> EvalContext<'a> {
    /// Milestone level of the crop a piece is bound to; zero when the piece
    /// is not crop-bound or the crop has no recorded milestone.
    pub fn milestone_for(&self, piece: &GearPiece) -> u32 {
        piece
            .def
            .crop
            .as_ref()
            .and_then(|crop| self.milestones.get(crop))
            .copied()
            .unwrap_or(0)
    }
}

/// Evaluation result for one source on one piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceProgress {
    pub name: String,
    pub current: f64,
    pub max: f64,
    /// `current / max`, clamped to 1; zero when the source has no ceiling.
    pub ratio: f64,
    /// Ranked candidates that would raise this source.
    pub upgrades: Vec<Upgrade>,
}

/// The contribution rules for gear pieces, in evaluation order.
#[derive(Debug, Clone)]
pub enum GearSource {
    BaseStats,
    RarityStats,
    Reforge,
    GemSlots,
    FortuneBooks,
    Enchant(Arc<EnchantDef>),
}

impl GearSource {
    pub fn name(&self) -> String {
        match self {
            GearSource::BaseStats => "Base Stats".to_string(),
            GearSource::RarityStats => "Rarity".to_string(),
            GearSource::Reforge => "Reforge".to_string(),
            GearSource::GemSlots => "Gemstone Slot".to_string(),
            GearSource::FortuneBooks => "Fortune Books".to_string(),
            GearSource::Enchant(def) => def.name.clone(),
        }
    }

    /// Whether this rule applies to the piece at all. The reference peak is
    /// consulted so a socket that only appears on a later chain tier still
    /// shows up as an unfilled ceiling today.
    pub fn exists(&self, piece: &GearPiece, reference: &GearPiece) -> bool {
        match self {
            GearSource::BaseStats | GearSource::RarityStats => true,
            GearSource::Reforge => piece.def.kind != GearKind::Accessory,
            GearSource::GemSlots => piece.def.gem_slots > 0 || reference.def.gem_slots > 0,
            GearSource::FortuneBooks => piece.def.kind == GearKind::Tool,
            GearSource::Enchant(def) => {
                piece.def.kind != GearKind::Accessory
                    && def.applies_to(piece.def.category)
                    && (def.crop.is_none() || def.crop == piece.def.crop)
            }
        }
    }

    /// Current contribution of this source on the live piece.
    pub fn current(&self, piece: &GearPiece, ctx: &EvalContext, stat: Stat) -> f64 {
        match self {
            GearSource::BaseStats => piece.def.base_stat(stat),
            GearSource::RarityStats => piece.def.rarity_stat(piece.rarity, stat),
            GearSource::Reforge => piece
                .attrs
                .reforge
                .as_ref()
                .and_then(|id| ctx.defs.reforge(id))
                .map(|def| reforge_stat(def, piece.rarity, stat))
                .unwrap_or(0.0),
            GearSource::GemSlots => {
                if stat != Stat::FarmingFortune {
                    return 0.0;
                }
                let factor = if piece.def.kind == GearKind::Accessory {
                    ACCESSORY_GEM_FACTOR
                } else {
                    1.0
                };
                piece
                    .attrs
                    .gems
                    .iter()
                    .flatten()
                    .map(|quality| gem_fortune(piece.rarity, *quality) * factor)
                    .sum()
            }
            GearSource::FortuneBooks => {
                if stat == Stat::FarmingFortune {
                    f64::from(piece.attrs.fortune_books) * FORTUNE_PER_BOOK
                } else {
                    0.0
                }
            }
            GearSource::Enchant(def) => {
                let level = piece.attrs.enchantments.get(&def.id).copied().unwrap_or(0);
                enchant_stat(level, def, stat, ctx.milestone_for(piece))
            }
        }
    }

    /// Ceiling of this source, evaluated on the reference peak.
    pub fn max(&self, reference: &GearPiece, ctx: &EvalContext, stat: Stat) -> f64 {
        self.current(reference, ctx, stat)
    }

    /// Candidates that would raise this source on this piece.
    pub fn upgrades(&self, piece: &GearPiece, ctx: &EvalContext) -> Vec<Upgrade> {
        match self {
            GearSource::BaseStats => upgrades::replacement_candidate(piece, ctx)
                .into_iter()
                .collect(),
            GearSource::RarityStats => upgrades::rarity_candidate(piece, ctx)
                .into_iter()
                .collect(),
            GearSource::Reforge => upgrades::reforge_candidates(piece, ctx),
            GearSource::GemSlots => upgrades::gem_candidates(piece, ctx),
            GearSource::FortuneBooks => upgrades::book_candidate(piece, ctx)
                .into_iter()
                .collect(),
            GearSource::Enchant(def) => upgrades::enchant_candidate(piece, def, ctx)
                .into_iter()
                .collect(),
        }
    }
}

/// The existing sources for a piece, in fixed declaration order.
pub fn sources_for(piece: &GearPiece, reference: &GearPiece, defs: &Definitions) -> Vec<GearSource> {
    let mut sources = vec![
        GearSource::BaseStats,
        GearSource::RarityStats,
        GearSource::Reforge,
        GearSource::GemSlots,
        GearSource::FortuneBooks,
    ];
    sources.extend(
        defs.enchants_for(piece.def.category)
            .map(|def| GearSource::Enchant(Arc::clone(def))),
    );
    sources.retain(|source| source.exists(piece, reference));
    sources
}

/// Total value of a piece for a stat: the sum of its sources.
pub fn piece_value(piece: &GearPiece, ctx: &EvalContext, stat: Stat) -> f64 {
    let reference = piece.reference_peak(ctx.defs);
    sources_for(piece, &reference, ctx.defs)
        .iter()
        .map(|source| source.current(piece, ctx, stat))
        .sum()
}

/// Named nonzero contributions of a piece, in source order.
pub fn piece_breakdown(piece: &GearPiece, ctx: &EvalContext, stat: Stat) -> Vec<(String, f64)> {
    let reference = piece.reference_peak(ctx.defs);
    sources_for(piece, &reference, ctx.defs)
        .iter()
        .filter_map(|source| {
            let value = source.current(piece, ctx, stat);
            (value != 0.0).then(|| (source.name(), value))
        })
        .collect()
}

/// Full progress report for a piece: one entry per existing source.
pub fn piece_progress(piece: &GearPiece, ctx: &EvalContext, stat: Stat) -> Vec<SourceProgress> {
    let reference = piece.reference_peak(ctx.defs);
    sources_for(piece, &reference, ctx.defs)
        .iter()
        .map(|source| {
            let current = source.current(piece, ctx, stat);
            let max = source.max(&reference, ctx, stat);
            let ratio = if max > TOLERANCE {
                (current / max).min(1.0)
            } else {
                0.0
            };
            let mut candidates = source.upgrades(piece, ctx);
            upgrades::rank(&mut candidates);
            SourceProgress {
                name: source.name(),
                current,
                max,
                ratio,
                upgrades: candidates,
            }
        })
        .collect()
}

/// All candidates for a piece across its sources, ranked descending by
/// primary-stat gain.
pub fn piece_upgrades(piece: &GearPiece, ctx: &EvalContext) -> Vec<Upgrade> {
    let reference = piece.reference_peak(ctx.defs);
    let mut candidates: Vec<Upgrade> = sources_for(piece, &reference, ctx.defs)
        .iter()
        .flat_map(|source| source.upgrades(piece, ctx))
        .collect();
    upgrades::rank(&mut candidates);
    candidates
}
