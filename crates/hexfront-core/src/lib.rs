//! Hexfront Core Library
//!
//! This crate contains the authoritative simulation core for Hexfront, a
//! server-hosted turn-based hex strategy game. It is consumed as a library
//! by the surrounding service; HTTP transport, authentication and
//! persistence live outside.
//!
//! # Design Principles
//!
//! - **No I/O dependencies**: This crate is purely game logic
//! - **Deterministic**: Same inputs always produce same outputs - no
//!   randomness anywhere in movement or combat
//! - **Serializable**: All state and action results round-trip via serde
//! - **Safely retryable**: Every mutating action carries an idempotency
//!   token, so network retries never double-apply

// Core modules
pub mod hex;
pub mod map;
pub mod types;

// Units, cities and participants
pub mod city;
pub mod player;
pub mod unit;

// Movement and combat
pub mod combat;
pub mod pathfinding;

// Game state and the action state machine
pub mod engine;
pub mod game_state;
pub mod idempotency;
pub mod projection;

// Re-exports for convenience
pub use city::{City, CITY_DEFENCE, CITY_MAX_HEALTH};
pub use combat::{
    resolve_city_combat, resolve_unit_combat, strike_damage, CityCombatResult, CombatResult,
};
pub use engine::{
    ActionEffect, ActionError, ActionRequest, ActionResult, GameAction, TurnEngine,
};
pub use game_state::{GameError, GameState};
pub use hex::{CubeCoord, OffsetCoord, CUBE_DIRECTIONS};
pub use idempotency::{action_key, IdempotencyStore, MemoryIdempotencyStore};
pub use map::{Map, ResourceDeposit, ResourceKind, Terrain, Tile};
pub use pathfinding::{find_path, reachable_within, PathQuery};
pub use player::{Participant, ParticipantKind};
pub use projection::{CityView, GameView, ParticipantView, UnitView};
pub use types::{CityId, GameId, GameStatus, ParticipantId, TileId, UnitId};
pub use unit::{Unit, UnitStats, UnitType};
