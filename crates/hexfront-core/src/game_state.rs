//! Root game state containing all game data.

use crate::city::City;
use crate::hex::OffsetCoord;
use crate::map::Map;
use crate::player::Participant;
use crate::types::{CityId, GameId, GameStatus, ParticipantId, TileId, UnitId};
use crate::unit::{Unit, UnitType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The complete state of a game at any point in time.
///
/// Units and cities live in id-keyed arenas; tile occupancy is a derived
/// index (`TileId -> UnitId`) maintained alongside every mutation rather
/// than a property stored on the tiles themselves. The whole struct is
/// serde-serializable for snapshotting.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    /// Unique identifier for this game.
    pub id: GameId,
    /// Current turn number (starts at 1).
    pub turn: u32,
    /// Which participant may currently act.
    pub active_participant: ParticipantId,
    /// Guard flag: is an action currently being applied to this game?
    pub turn_in_progress: bool,
    /// Game lifecycle status.
    pub status: GameStatus,
    /// All participants, in play order.
    pub participants: Vec<Participant>,
    /// The game map.
    pub map: Map,
    /// All units in the game, indexed by id.
    pub units: HashMap<UnitId, Unit>,
    /// All cities in the game, indexed by id.
    pub cities: HashMap<CityId, City>,
    /// Derived occupancy index enforcing one unit per tile.
    pub occupancy: HashMap<TileId, UnitId>,
    /// Next available unit id.
    pub next_unit_id: UnitId,
    /// Next available city id.
    pub next_city_id: CityId,
}

impl GameState {
    /// Create a new game over the given map and participants.
    pub fn new(id: GameId, map: Map, participants: Vec<Participant>) -> Self {
        Self {
            id,
            turn: 1,
            active_participant: 0,
            turn_in_progress: false,
            status: GameStatus::Active,
            participants,
            map,
            units: HashMap::new(),
            cities: HashMap::new(),
            occupancy: HashMap::new(),
            next_unit_id: 1,
            next_city_id: 1,
        }
    }

    /// Get a participant by id.
    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.get(id as usize)
    }

    /// Check if it's a specific participant's turn.
    pub fn is_participant_turn(&self, id: ParticipantId) -> bool {
        self.status.is_active() && self.active_participant == id
    }

    /// Spawn a new unit, enforcing bounds and one-unit-per-tile.
    pub fn spawn_unit(
        &mut self,
        owner: ParticipantId,
        unit_type: UnitType,
        position: OffsetCoord,
    ) -> Result<UnitId, GameError> {
        if self.participant(owner).is_none() {
            return Err(GameError::UnknownParticipant(owner));
        }
        let tile_id = self
            .map
            .tile_id(&position)
            .ok_or(GameError::OutOfBounds(position))?;
        if self.occupancy.contains_key(&tile_id) {
            return Err(GameError::TileOccupied(position));
        }

        let id = self.next_unit_id;
        self.next_unit_id += 1;
        self.units.insert(id, Unit::new(id, owner, unit_type, position));
        self.occupancy.insert(tile_id, id);
        Ok(id)
    }

    /// Found a new city. Cities do not participate in unit occupancy.
    pub fn found_city(
        &mut self,
        owner: ParticipantId,
        name: impl Into<String>,
        position: OffsetCoord,
    ) -> Result<CityId, GameError> {
        if self.participant(owner).is_none() {
            return Err(GameError::UnknownParticipant(owner));
        }
        if !self.map.in_bounds(&position) {
            return Err(GameError::OutOfBounds(position));
        }

        let id = self.next_city_id;
        self.next_city_id += 1;
        self.cities.insert(id, City::new(id, owner, name.into(), position));
        Ok(id)
    }

    /// Get the unit standing on a tile, if any.
    pub fn unit_at(&self, coord: &OffsetCoord) -> Option<&Unit> {
        let tile_id = self.map.tile_id(coord)?;
        self.occupancy.get(&tile_id).and_then(|id| self.units.get(id))
    }

    /// Get the city on a tile, if any.
    pub fn city_at(&self, coord: &OffsetCoord) -> Option<&City> {
        self.cities.values().find(|c| c.position == *coord)
    }

    /// Move a unit to a new tile, keeping the occupancy index in step.
    ///
    /// The destination must be in bounds and free; callers validate this
    /// before committing.
    pub fn relocate_unit(&mut self, unit_id: UnitId, to: OffsetCoord) -> Result<(), GameError> {
        let dest_tile = self.map.tile_id(&to).ok_or(GameError::OutOfBounds(to))?;
        if self.occupancy.get(&dest_tile).is_some_and(|&u| u != unit_id) {
            return Err(GameError::TileOccupied(to));
        }
        let unit = self
            .units
            .get_mut(&unit_id)
            .ok_or(GameError::UnknownUnit(unit_id))?;

        if let Some(old_tile) = self.map.tile_id(&unit.position) {
            if self.occupancy.get(&old_tile) == Some(&unit_id) {
                self.occupancy.remove(&old_tile);
            }
        }
        unit.position = to;
        self.occupancy.insert(dest_tile, unit_id);
        Ok(())
    }

    /// Remove a destroyed unit, freeing its tile.
    pub fn remove_unit(&mut self, unit_id: UnitId) {
        if let Some(unit) = self.units.remove(&unit_id) {
            if let Some(tile_id) = self.map.tile_id(&unit.position) {
                if self.occupancy.get(&tile_id) == Some(&unit_id) {
                    self.occupancy.remove(&tile_id);
                }
            }
        }
    }

    /// Remove a fallen city.
    pub fn remove_city(&mut self, city_id: CityId) {
        self.cities.remove(&city_id);
    }

    /// Rebuild the occupancy index from unit positions.
    ///
    /// Used after loading a snapshot; incremental maintenance keeps the
    /// index correct during normal play.
    pub fn rebuild_occupancy(&mut self) {
        self.occupancy.clear();
        for unit in self.units.values() {
            if let Some(tile_id) = self.map.tile_id(&unit.position) {
                self.occupancy.insert(tile_id, unit.id);
            }
        }
    }

    /// Advance to the next turn.
    ///
    /// Increments the turn number, clears every unit's acted flag, and hands
    /// play to the next non-eliminated participant, wrapping past the end of
    /// the list.
    pub fn advance_turn(&mut self) {
        self.turn += 1;
        for unit in self.units.values_mut() {
            unit.reset_for_turn();
        }

        let count = self.participants.len() as u8;
        if count == 0 {
            return;
        }
        let mut next = (self.active_participant + 1) % count;
        let mut attempts = 0;
        while self.participants[next as usize].eliminated && attempts < count {
            next = (next + 1) % count;
            attempts += 1;
        }
        self.active_participant = next;
    }

    /// Mark a participant eliminated if nothing of theirs remains on the
    /// board, then finish the game once at most one participant survives.
    pub fn update_elimination(&mut self, id: ParticipantId) {
        let has_assets = self.units.values().any(|u| u.owner == id)
            || self.cities.values().any(|c| c.owner == id);
        if !has_assets {
            if let Some(p) = self.participants.get_mut(id as usize) {
                p.eliminated = true;
            }
        }

        let survivors = self.participants.iter().filter(|p| !p.eliminated).count();
        if survivors <= 1 {
            self.status = GameStatus::Finished;
        }
    }
}

/// Errors raised by direct state mutation helpers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameError {
    OutOfBounds(OffsetCoord),
    TileOccupied(OffsetCoord),
    UnknownParticipant(ParticipantId),
    UnknownUnit(UnitId),
}

impl std::fmt::Display for GameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameError::OutOfBounds(c) => write!(f, "Coordinate {} is outside the map", c),
            GameError::TileOccupied(c) => write!(f, "Tile {} is already occupied", c),
            GameError::UnknownParticipant(id) => write!(f, "No participant with id {}", id),
            GameError::UnknownUnit(id) => write!(f, "No unit with id {}", id),
        }
    }
}

impl std::error::Error for GameError {}
