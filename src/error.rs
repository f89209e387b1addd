use thiserror::Error;

use crate::model::{PlayerId, RosterEntryId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Shirt number {shirt_number} is already taken")]
    DuplicateShirtNumber { shirt_number: u8 },

    #[error("Player {player_id} is not on the field at {at_seconds}s")]
    PlayerNotActive { player_id: PlayerId, at_seconds: u32 },

    #[error("Player {player_id} is already on the field")]
    PlayerAlreadyActive { player_id: PlayerId },

    #[error("Stat value must be at least 1, got {value}")]
    InvalidStatValue { value: u32 },

    #[error("Unknown stat type: {0}")]
    UnknownStatType(String),

    #[error("Stat type {0} is not active")]
    InactiveStatType(String),

    #[error("Invalid match format: {0}")]
    InvalidMatchFormat(String),

    #[error("Match is over")]
    MatchClosed,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CoreError {
    /// Validation failures the scorekeeper can correct and retry.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CoreError::Store(_) | CoreError::MatchClosed)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Roster entry {0} not found")]
    UnknownRosterEntry(RosterEntryId),

    #[error("Roster entry {0} has already been closed")]
    EntryAlreadyClosed(RosterEntryId),
}

pub type Result<T> = std::result::Result<T, CoreError>;
