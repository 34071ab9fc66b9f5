//! Core type aliases used throughout the crate.

use serde::{Deserialize, Serialize};

/// Unique identifier for a game session.
pub type GameId = String;

/// Participant index within a game (0-based, assignment order).
pub type ParticipantId = u8;

/// Unique identifier for a unit.
pub type UnitId = u64;

/// Unique identifier for a city.
pub type CityId = u64;

/// Row-major tile index into the map arena (`row * width + col`).
pub type TileId = u32;

/// Lifecycle status of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GameStatus {
    /// Game is in progress and accepts actions.
    #[default]
    Active,
    /// Game has concluded; all actions are rejected.
    Finished,
}

impl GameStatus {
    /// Check whether the game still accepts actions.
    pub const fn is_active(&self) -> bool {
        matches!(self, GameStatus::Active)
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameStatus::Active => write!(f, "active"),
            GameStatus::Finished => write!(f, "finished"),
        }
    }
}
