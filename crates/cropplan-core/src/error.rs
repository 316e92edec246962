//! Engine error taxonomy.
//!
//! Only genuine caller mistakes surface as errors: referencing definitions
//! or targets that do not exist, or applying an upgrade whose preconditions
//! no longer hold. Broken or missing *reference data* (unknown reforge ids
//! on records, holes in stat tables) never errors; those reads degrade to
//! zero instead so an odd inventory cannot take the whole evaluation down.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// An item record names a gear definition the registry does not have.
    #[error("unknown gear definition '{id}'")]
    UnknownDefinition { id: String },

    /// A pet record names a pet definition the registry does not have.
    #[error("unknown pet definition '{id}'")]
    UnknownPetDefinition { id: String },

    /// An upgrade targets an item uid not present in the player's setup.
    #[error("no item with uid '{uid}' in player setup")]
    TargetNotFound { uid: String },

    /// An upgrade can no longer be applied to the current state.
    #[error("upgrade cannot be applied: {reason}")]
    InvalidUpgrade { reason: String },
}

pub type EngineResult<T> = Result<T, EngineError>;
