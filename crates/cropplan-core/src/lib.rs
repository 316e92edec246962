//! Farming-score progression engine.
//!
//! Evaluates how much score a player's setup produces, where it comes from,
//! how far each contribution is from its ceiling, and which concrete
//! upgrade steps close the gap. A non-mutating planner chains steps into a
//! what-if tree of cumulative gains.
//!
//! Definition tables (items, enchants, reforges, pets, world sources) are
//! injected read-only configuration from [`cropplan_logic`]; this crate
//! owns the entity state, the evaluation, and the planning on top of them.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`error`] | Engine error taxonomy |
//! | [`record`] | Raw serialized item and pet records |
//! | [`gear`] | Gear entities and the fully-upgraded reference instance |
//! | [`pet`] | Pet entities |
//! | [`sources`] | The source abstraction: exists/current/max/upgrades |
//! | [`upgrades`] | Candidate generation and ranking |
//! | [`apply`] | The shared live/clone application routine |
//! | [`player`] | The player aggregate: collections, rollup, breakdown |
//! | [`planner`] | What-if tree expansion |

pub mod apply;
pub mod error;
pub mod gear;
pub mod pet;
pub mod planner;
pub mod player;
pub mod record;
pub mod sources;
pub mod upgrades;

pub use apply::{apply_to_clone, apply_to_piece};
pub use error::{EngineError, EngineResult};
pub use gear::{GearAttributes, GearPiece};
pub use pet::Pet;
pub use planner::{expand, ExpandOptions, UpgradeNode};
pub use player::{Player, WorldState};
pub use record::{ItemRecord, PetRecord};
pub use sources::{EvalContext, GearSource, SourceProgress};
pub use upgrades::{ItemChange, Upgrade, UpgradeCategory, UpgradeTarget};
