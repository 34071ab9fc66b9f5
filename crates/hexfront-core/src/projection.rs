//! Client-facing read model of the game state.
//!
//! Views are plain data ordered deterministically (sorted by id), so the
//! projection of a replayed action compares equal to the original down to
//! the serialized bytes.

use crate::game_state::GameState;
use crate::hex::OffsetCoord;
use crate::player::ParticipantKind;
use crate::types::{CityId, GameId, GameStatus, ParticipantId, UnitId};
use crate::unit::UnitType;
use serde::{Deserialize, Serialize};

/// Snapshot of a game as presented to clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameView {
    pub game_id: GameId,
    pub turn: u32,
    pub active_participant: ParticipantId,
    pub status: GameStatus,
    pub participants: Vec<ParticipantView>,
    pub units: Vec<UnitView>,
    pub cities: Vec<CityView>,
}

/// Read model of one participant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticipantView {
    pub id: ParticipantId,
    pub kind: ParticipantKind,
    pub name: String,
    pub eliminated: bool,
}

/// Read model of one unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitView {
    pub id: UnitId,
    pub owner: ParticipantId,
    pub unit_type: UnitType,
    pub position: OffsetCoord,
    pub health: u32,
    pub max_health: u32,
    pub has_acted: bool,
}

/// Read model of one city.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CityView {
    pub id: CityId,
    pub owner: ParticipantId,
    pub name: String,
    pub position: OffsetCoord,
    pub health: u32,
    pub max_health: u32,
}

impl GameView {
    /// Project the in-memory state into the read model.
    pub fn from_state(state: &GameState) -> Self {
        let mut units: Vec<UnitView> = state
            .units
            .values()
            .map(|u| UnitView {
                id: u.id,
                owner: u.owner,
                unit_type: u.unit_type,
                position: u.position,
                health: u.health,
                max_health: u.stats().max_health,
                has_acted: u.has_acted,
            })
            .collect();
        units.sort_by_key(|u| u.id);

        let mut cities: Vec<CityView> = state
            .cities
            .values()
            .map(|c| CityView {
                id: c.id,
                owner: c.owner,
                name: c.name.clone(),
                position: c.position,
                health: c.health,
                max_health: c.max_health,
            })
            .collect();
        cities.sort_by_key(|c| c.id);

        Self {
            game_id: state.id.clone(),
            turn: state.turn,
            active_participant: state.active_participant,
            status: state.status,
            participants: state
                .participants
                .iter()
                .map(|p| ParticipantView {
                    id: p.id,
                    kind: p.kind,
                    name: p.name.clone(),
                    eliminated: p.eliminated,
                })
                .collect(),
            units,
            cities,
        }
    }
}
