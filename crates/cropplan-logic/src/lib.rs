//! Pure farming-score logic for Cropplan.
//!
//! This crate contains all formulas and immutable definition types that are
//! independent of any player state or engine. Functions take plain data and
//! return numbers, making them unit-testable and portable.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`stats`] | Stat dimensions (fortune, wisdom) and stat maps |
//! | [`rarity`] | Rarity ladder with next/previous steps |
//! | [`gems`] | Gem quality ladder and per-rarity gem fortune table |
//! | [`cost`] | Mergeable upgrade cost (items, coins, copper, medals) |
//! | [`levels`] | Linear-with-cap level sources (skill, plots, ...) |
//! | [`reforges`] | Reforge definitions with per-rarity stat tiers |
//! | [`enchants`] | Enchant definitions with per-level stat tiers |
//! | [`definitions`] | Gear/pet definitions, upgrade chains, registry |

pub mod cost;
pub mod definitions;
pub mod enchants;
pub mod gems;
pub mod levels;
pub mod rarity;
pub mod reforges;
pub mod stats;
