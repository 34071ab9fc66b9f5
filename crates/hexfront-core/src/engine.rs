//! Turn engine - the per-game action state machine.
//!
//! All mutating actions flow through [`TurnEngine::execute`], which enforces
//! turn order, the single-action-in-flight guard, the one-action-per-unit
//! rule, and idempotent replay of committed actions. Geometry questions go
//! to the pathfinding module and damage questions to the combat module; this
//! module owns validation and state mutation.

use crate::combat::{resolve_city_combat, resolve_unit_combat};
use crate::game_state::GameState;
use crate::hex::OffsetCoord;
use crate::idempotency::{action_key, IdempotencyStore};
use crate::map::Terrain;
use crate::pathfinding::{find_path, reachable_within, PathQuery};
use crate::projection::GameView;
use crate::types::{CityId, ParticipantId, UnitId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A mutating action submitted by a participant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum GameAction {
    /// Move a unit along the cheapest path to a destination tile.
    Move {
        unit_id: UnitId,
        destination: OffsetCoord,
    },
    /// Attack an enemy unit.
    AttackUnit {
        unit_id: UnitId,
        target_unit_id: UnitId,
    },
    /// Attack an enemy city.
    AttackCity {
        unit_id: UnitId,
        target_city_id: CityId,
    },
    /// End the active participant's turn.
    EndTurn,
}

impl GameAction {
    /// Stable action-kind label, used in idempotency keys.
    pub const fn kind(&self) -> &'static str {
        match self {
            GameAction::Move { .. } => "move",
            GameAction::AttackUnit { .. } => "attack-unit",
            GameAction::AttackCity { .. } => "attack-city",
            GameAction::EndTurn => "end-turn",
        }
    }
}

/// An action request as received from the surrounding service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Participant submitting the action.
    pub actor: ParticipantId,
    /// The action itself.
    pub action: GameAction,
    /// Client-supplied token making the request safely retryable.
    pub idempotency_token: String,
}

/// Why an action was rejected.
///
/// Validation failures never mutate state, never consume the unit's action,
/// and are never recorded in the idempotency store.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ActionError {
    /// Actor is not the active participant, or the game is over.
    #[error("not this participant's turn")]
    NotPlayerTurn,
    /// Another action is in flight for this game; retry with backoff.
    #[error("another action is in progress for this game")]
    TurnBusy,
    /// The unit has already acted this turn.
    #[error("unit has no actions left this turn")]
    NoActionsLeft,
    /// Target beyond attack range, or destination beyond movement budget.
    #[error("target is out of range")]
    OutOfRange,
    /// Target missing, friendly, or otherwise illegal.
    #[error("invalid target: {0}")]
    InvalidTarget(String),
    /// Unexpected fault; fatal for this action only.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ActionError {
    /// Stable error-kind label for the transport layer.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionError::NotPlayerTurn => "not-player-turn",
            ActionError::TurnBusy => "turn-busy",
            ActionError::NoActionsLeft => "no-actions-left",
            ActionError::OutOfRange => "out-of-range",
            ActionError::InvalidTarget(_) => "invalid-target",
            ActionError::Internal(_) => "internal",
        }
    }

    /// Whether the caller should retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ActionError::TurnBusy)
    }
}

/// One observable consequence of an applied action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ActionEffect {
    UnitMoved {
        unit_id: UnitId,
        path: Vec<OffsetCoord>,
    },
    UnitDamaged {
        unit_id: UnitId,
        damage: u32,
        remaining: u32,
    },
    UnitDestroyed {
        unit_id: UnitId,
    },
    CityDamaged {
        city_id: CityId,
        damage: u32,
        remaining: u32,
    },
    CityFallen {
        city_id: CityId,
    },
    ParticipantEliminated {
        participant_id: ParticipantId,
    },
    TurnEnded {
        turn: u32,
        active_participant: ParticipantId,
    },
}

/// Result of a successfully applied action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    /// What happened, in application order.
    pub effects: Vec<ActionEffect>,
    /// Updated client-facing state projection.
    pub state: GameView,
}

/// Per-game action state machine.
///
/// Owns the game state plus the idempotency store collaborator. One engine
/// instance serves one game; the surrounding service serializes access so
/// `execute` always sees exclusive ownership of the state.
pub struct TurnEngine<S: IdempotencyStore> {
    /// The game being simulated.
    pub state: GameState,
    store: S,
}

impl<S: IdempotencyStore> TurnEngine<S> {
    /// Create an engine around existing state.
    pub fn new(state: GameState, store: S) -> Self {
        Self { state, store }
    }

    /// Execute one action request.
    ///
    /// A request whose idempotency key is already recorded replays the
    /// stored result without touching the game - this check runs before
    /// turn validation, because a retry of a committed EndTurn arrives when
    /// the actor is no longer active and must still succeed.
    pub fn execute(&mut self, req: &ActionRequest) -> Result<ActionResult, ActionError> {
        let key = action_key(req.action.kind(), &self.state.id, &req.idempotency_token);
        if let Some(prior) = self.store.try_get(&key) {
            return Ok(prior);
        }

        if !self.state.is_participant_turn(req.actor) {
            return Err(ActionError::NotPlayerTurn);
        }
        if self.state.turn_in_progress {
            return Err(ActionError::TurnBusy);
        }

        // Guard scope: held for the duration of this one action's
        // computation, cleared on success and failure alike. The
        // persistence transaction boundary covers abandonment.
        self.state.turn_in_progress = true;
        let outcome = self.apply(req);
        self.state.turn_in_progress = false;

        // Only committed mutations are recorded; a corrected retry after a
        // validation failure must be allowed to succeed with the same token
        if let Ok(result) = &outcome {
            self.store.put(&key, result);
        }
        outcome
    }

    /// All tiles the unit could reach this turn. Read-only query.
    pub fn reachable_tiles(&self, unit_id: UnitId) -> Result<Vec<(OffsetCoord, u32)>, ActionError> {
        let unit = self
            .state
            .units
            .get(&unit_id)
            .ok_or_else(|| ActionError::InvalidTarget(format!("no unit {}", unit_id)))?;
        let query = PathQuery {
            width: self.state.map.width,
            height: self.state.map.height,
            budget: unit.stats().movement,
        };
        let state = &self.state;
        Ok(reachable_within(&query, unit.position, |c| {
            Self::tile_blocked(state, &c)
        }))
    }

    /// Dispatch to the action-specific handler. Caller holds the guard.
    fn apply(&mut self, req: &ActionRequest) -> Result<ActionResult, ActionError> {
        let effects = match req.action {
            GameAction::Move {
                unit_id,
                destination,
            } => self.apply_move(req.actor, unit_id, destination)?,
            GameAction::AttackUnit {
                unit_id,
                target_unit_id,
            } => self.apply_attack_unit(req.actor, unit_id, target_unit_id)?,
            GameAction::AttackCity {
                unit_id,
                target_city_id,
            } => self.apply_attack_city(req.actor, unit_id, target_city_id)?,
            GameAction::EndTurn => self.apply_end_turn(),
        };

        Ok(ActionResult {
            effects,
            state: GameView::from_state(&self.state),
        })
    }

    /// Can a unit not transit this tile? Out-of-bounds, water, and occupied
    /// tiles all block.
    fn tile_blocked(state: &GameState, coord: &OffsetCoord) -> bool {
        match state.map.tile_id(coord) {
            Some(tile_id) => {
                state.occupancy.contains_key(&tile_id)
                    || state
                        .map
                        .get_by_id(tile_id)
                        .is_some_and(|t| t.terrain == Terrain::Water)
            }
            None => true,
        }
    }

    /// Look up the acting unit and run the per-unit legality checks.
    fn acting_unit(&self, actor: ParticipantId, unit_id: UnitId) -> Result<&crate::unit::Unit, ActionError> {
        let unit = self
            .state
            .units
            .get(&unit_id)
            .ok_or_else(|| ActionError::InvalidTarget(format!("no unit {}", unit_id)))?;
        if unit.owner != actor {
            return Err(ActionError::InvalidTarget(format!(
                "unit {} does not belong to participant {}",
                unit_id, actor
            )));
        }
        if !unit.can_act() {
            return Err(ActionError::NoActionsLeft);
        }
        Ok(unit)
    }

    fn apply_move(
        &mut self,
        actor: ParticipantId,
        unit_id: UnitId,
        destination: OffsetCoord,
    ) -> Result<Vec<ActionEffect>, ActionError> {
        let unit = self.acting_unit(actor, unit_id)?;
        let start = unit.position;
        let budget = unit.stats().movement;

        let dest_tile = self
            .state
            .map
            .tile_id(&destination)
            .ok_or_else(|| ActionError::InvalidTarget(format!("{} is outside the map", destination)))?;
        if self
            .state
            .map
            .get_by_id(dest_tile)
            .is_some_and(|t| t.terrain == Terrain::Water)
        {
            return Err(ActionError::InvalidTarget(format!(
                "{} is impassable water",
                destination
            )));
        }
        // The pathfinder exempts the destination from blocking, so occupancy
        // there is re-validated here before anything commits
        if self.state.occupancy.get(&dest_tile).is_some_and(|&u| u != unit_id) {
            return Err(ActionError::InvalidTarget(format!(
                "{} is already occupied",
                destination
            )));
        }

        let query = PathQuery {
            width: self.state.map.width,
            height: self.state.map.height,
            budget,
        };
        let state = &self.state;
        let path = find_path(&query, start, destination, |c| Self::tile_blocked(state, &c))
            .ok_or(ActionError::OutOfRange)?;

        self.state
            .relocate_unit(unit_id, destination)
            .map_err(|e| ActionError::Internal(e.to_string()))?;
        if let Some(unit) = self.state.units.get_mut(&unit_id) {
            unit.mark_acted();
        }

        Ok(vec![ActionEffect::UnitMoved { unit_id, path }])
    }

    fn apply_attack_unit(
        &mut self,
        actor: ParticipantId,
        unit_id: UnitId,
        target_unit_id: UnitId,
    ) -> Result<Vec<ActionEffect>, ActionError> {
        let attacker = self.acting_unit(actor, unit_id)?;
        let defender = self
            .state
            .units
            .get(&target_unit_id)
            .ok_or_else(|| ActionError::InvalidTarget(format!("no unit {}", target_unit_id)))?;
        if defender.owner == actor {
            return Err(ActionError::InvalidTarget(format!(
                "unit {} is friendly",
                target_unit_id
            )));
        }

        let distance = attacker.position.distance(&defender.position);
        if !attacker.in_attack_range(distance) {
            return Err(ActionError::OutOfRange);
        }

        let result = resolve_unit_combat(attacker, defender);
        let defender_owner = defender.owner;
        let mut effects = Vec::new();

        if let Some(unit) = self.state.units.get_mut(&target_unit_id) {
            unit.take_damage(result.defender_damage);
        }
        effects.push(ActionEffect::UnitDamaged {
            unit_id: target_unit_id,
            damage: result.defender_damage,
            remaining: result.defender_health,
        });
        if result.defender_destroyed {
            self.state.remove_unit(target_unit_id);
            effects.push(ActionEffect::UnitDestroyed {
                unit_id: target_unit_id,
            });
        }

        if result.attacker_damage > 0 {
            if let Some(unit) = self.state.units.get_mut(&unit_id) {
                unit.take_damage(result.attacker_damage);
            }
            effects.push(ActionEffect::UnitDamaged {
                unit_id,
                damage: result.attacker_damage,
                remaining: result.attacker_health,
            });
            if result.attacker_destroyed {
                self.state.remove_unit(unit_id);
                effects.push(ActionEffect::UnitDestroyed { unit_id });
            }
        }

        if let Some(unit) = self.state.units.get_mut(&unit_id) {
            unit.mark_acted();
        }

        if result.defender_destroyed {
            self.note_elimination(defender_owner, &mut effects);
        }
        if result.attacker_destroyed {
            self.note_elimination(actor, &mut effects);
        }

        Ok(effects)
    }

    fn apply_attack_city(
        &mut self,
        actor: ParticipantId,
        unit_id: UnitId,
        target_city_id: CityId,
    ) -> Result<Vec<ActionEffect>, ActionError> {
        let attacker = self.acting_unit(actor, unit_id)?;
        let city = self
            .state
            .cities
            .get(&target_city_id)
            .ok_or_else(|| ActionError::InvalidTarget(format!("no city {}", target_city_id)))?;
        if city.owner == actor {
            return Err(ActionError::InvalidTarget(format!(
                "city {} is friendly",
                target_city_id
            )));
        }

        let distance = attacker.position.distance(&city.position);
        if !attacker.in_attack_range(distance) {
            return Err(ActionError::OutOfRange);
        }

        let result = resolve_city_combat(attacker, city);
        let city_owner = city.owner;
        let mut effects = Vec::new();

        if let Some(city) = self.state.cities.get_mut(&target_city_id) {
            city.take_damage(result.city_damage);
        }
        effects.push(ActionEffect::CityDamaged {
            city_id: target_city_id,
            damage: result.city_damage,
            remaining: result.city_health,
        });
        if result.city_fallen {
            self.state.remove_city(target_city_id);
            effects.push(ActionEffect::CityFallen {
                city_id: target_city_id,
            });
        }

        if let Some(unit) = self.state.units.get_mut(&unit_id) {
            unit.mark_acted();
        }

        if result.city_fallen {
            self.note_elimination(city_owner, &mut effects);
        }

        Ok(effects)
    }

    fn apply_end_turn(&mut self) -> Vec<ActionEffect> {
        self.state.advance_turn();
        vec![ActionEffect::TurnEnded {
            turn: self.state.turn,
            active_participant: self.state.active_participant,
        }]
    }

    /// Record elimination of a participant who just lost their last asset.
    fn note_elimination(&mut self, id: ParticipantId, effects: &mut Vec<ActionEffect>) {
        let was_eliminated = self
            .state
            .participant(id)
            .map(|p| p.eliminated)
            .unwrap_or(true);
        self.state.update_elimination(id);
        let now_eliminated = self
            .state
            .participant(id)
            .map(|p| p.eliminated)
            .unwrap_or(false);
        if !was_eliminated && now_eliminated {
            effects.push(ActionEffect::ParticipantEliminated { participant_id: id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idempotency::MemoryIdempotencyStore;
    use crate::map::Map;
    use crate::player::Participant;
    use crate::unit::UnitType;

    fn engine_with_two_players() -> TurnEngine<MemoryIdempotencyStore> {
        let state = GameState::new(
            "game1".to_string(),
            Map::filled(12, 12, Terrain::Plains),
            vec![Participant::human(0, "Aino"), Participant::ai(1, "Legion")],
        );
        TurnEngine::new(state, MemoryIdempotencyStore::new())
    }

    fn request(actor: ParticipantId, action: GameAction, token: &str) -> ActionRequest {
        ActionRequest {
            actor,
            action,
            idempotency_token: token.to_string(),
        }
    }

    #[test]
    fn test_not_player_turn() {
        let mut engine = engine_with_two_players();
        let err = engine
            .execute(&request(1, GameAction::EndTurn, "t1"))
            .unwrap_err();
        assert_eq!(err, ActionError::NotPlayerTurn);
    }

    #[test]
    fn test_turn_busy_is_retryable() {
        let mut engine = engine_with_two_players();
        engine.state.turn_in_progress = true;
        let err = engine
            .execute(&request(0, GameAction::EndTurn, "t1"))
            .unwrap_err();
        assert_eq!(err, ActionError::TurnBusy);
        assert!(err.is_retryable());
        assert!(!ActionError::NotPlayerTurn.is_retryable());
    }

    #[test]
    fn test_guard_cleared_after_success_and_failure() {
        let mut engine = engine_with_two_players();
        engine
            .execute(&request(0, GameAction::EndTurn, "t1"))
            .unwrap();
        assert!(!engine.state.turn_in_progress);

        // Validation failure also releases the guard
        engine.state.active_participant = 0;
        let err = engine
            .execute(&request(
                0,
                GameAction::Move {
                    unit_id: 42,
                    destination: OffsetCoord::new(1, 1),
                },
                "t2",
            ))
            .unwrap_err();
        assert!(matches!(err, ActionError::InvalidTarget(_)));
        assert!(!engine.state.turn_in_progress);
    }

    #[test]
    fn test_move_within_budget() {
        let mut engine = engine_with_two_players();
        let unit_id = engine
            .state
            .spawn_unit(0, UnitType::Warrior, OffsetCoord::new(2, 2))
            .unwrap();

        let destination = OffsetCoord::new(4, 2);
        let result = engine
            .execute(&request(0, GameAction::Move { unit_id, destination }, "t1"))
            .unwrap();

        assert_eq!(engine.state.units[&unit_id].position, destination);
        assert!(engine.state.units[&unit_id].has_acted);
        match &result.effects[0] {
            ActionEffect::UnitMoved { path, .. } => assert_eq!(path.len(), 3),
            other => panic!("unexpected effect {:?}", other),
        }
    }

    #[test]
    fn test_move_beyond_budget() {
        let mut engine = engine_with_two_players();
        let unit_id = engine
            .state
            .spawn_unit(0, UnitType::Warrior, OffsetCoord::new(0, 0))
            .unwrap();

        // Warrior movement is 2; ask for a 5-step march
        let err = engine
            .execute(&request(
                0,
                GameAction::Move {
                    unit_id,
                    destination: OffsetCoord::new(5, 0),
                },
                "t1",
            ))
            .unwrap_err();
        assert_eq!(err, ActionError::OutOfRange);
        assert_eq!(engine.state.units[&unit_id].position, OffsetCoord::new(0, 0));
        assert!(!engine.state.units[&unit_id].has_acted);
    }

    #[test]
    fn test_move_onto_occupied_tile() {
        let mut engine = engine_with_two_players();
        let mover = engine
            .state
            .spawn_unit(0, UnitType::Warrior, OffsetCoord::new(2, 2))
            .unwrap();
        engine
            .state
            .spawn_unit(1, UnitType::Warrior, OffsetCoord::new(3, 2))
            .unwrap();

        let err = engine
            .execute(&request(
                0,
                GameAction::Move {
                    unit_id: mover,
                    destination: OffsetCoord::new(3, 2),
                },
                "t1",
            ))
            .unwrap_err();
        assert!(matches!(err, ActionError::InvalidTarget(_)));
    }

    #[test]
    fn test_second_action_rejected() {
        let mut engine = engine_with_two_players();
        let unit_id = engine
            .state
            .spawn_unit(0, UnitType::Warrior, OffsetCoord::new(2, 2))
            .unwrap();

        engine
            .execute(&request(
                0,
                GameAction::Move {
                    unit_id,
                    destination: OffsetCoord::new(3, 2),
                },
                "t1",
            ))
            .unwrap();

        let err = engine
            .execute(&request(
                0,
                GameAction::Move {
                    unit_id,
                    destination: OffsetCoord::new(4, 2),
                },
                "t2",
            ))
            .unwrap_err();
        assert_eq!(err, ActionError::NoActionsLeft);
        assert_eq!(engine.state.units[&unit_id].position, OffsetCoord::new(3, 2));
    }

    #[test]
    fn test_idempotent_replay() {
        let mut engine = engine_with_two_players();
        let unit_id = engine
            .state
            .spawn_unit(0, UnitType::Warrior, OffsetCoord::new(2, 2))
            .unwrap();

        let req = request(
            0,
            GameAction::Move {
                unit_id,
                destination: OffsetCoord::new(3, 2),
            },
            "retry-me",
        );
        let first = engine.execute(&req).unwrap();
        // The retry would now fail NoActionsLeft if re-executed; instead it
        // must replay the committed result unchanged
        let second = engine.execute(&req).unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.state.units[&unit_id].position, OffsetCoord::new(3, 2));
    }

    #[test]
    fn test_validation_failure_not_cached() {
        let mut engine = engine_with_two_players();
        let unit_id = engine
            .state
            .spawn_unit(0, UnitType::Warrior, OffsetCoord::new(0, 0))
            .unwrap();

        // Too far: fails, and must not burn the token
        let bad = request(
            0,
            GameAction::Move {
                unit_id,
                destination: OffsetCoord::new(9, 0),
            },
            "tok",
        );
        assert_eq!(engine.execute(&bad).unwrap_err(), ActionError::OutOfRange);

        // Corrected retry with the same token succeeds
        let good = request(
            0,
            GameAction::Move {
                unit_id,
                destination: OffsetCoord::new(2, 0),
            },
            "tok",
        );
        engine.execute(&good).unwrap();
        assert_eq!(engine.state.units[&unit_id].position, OffsetCoord::new(2, 0));
    }

    #[test]
    fn test_attack_own_unit_rejected() {
        let mut engine = engine_with_two_players();
        let a = engine
            .state
            .spawn_unit(0, UnitType::Warrior, OffsetCoord::new(2, 2))
            .unwrap();
        let b = engine
            .state
            .spawn_unit(0, UnitType::Warrior, OffsetCoord::new(3, 2))
            .unwrap();

        let err = engine
            .execute(&request(
                0,
                GameAction::AttackUnit {
                    unit_id: a,
                    target_unit_id: b,
                },
                "t1",
            ))
            .unwrap_err();
        assert!(matches!(err, ActionError::InvalidTarget(_)));
    }

    #[test]
    fn test_melee_attack_out_of_range() {
        let mut engine = engine_with_two_players();
        let a = engine
            .state
            .spawn_unit(0, UnitType::Warrior, OffsetCoord::new(2, 2))
            .unwrap();
        let b = engine
            .state
            .spawn_unit(1, UnitType::Warrior, OffsetCoord::new(5, 2))
            .unwrap();

        let err = engine
            .execute(&request(
                0,
                GameAction::AttackUnit {
                    unit_id: a,
                    target_unit_id: b,
                },
                "t1",
            ))
            .unwrap_err();
        assert_eq!(err, ActionError::OutOfRange);
    }

    #[test]
    fn test_water_destination_rejected() {
        let mut engine = engine_with_two_players();
        let unit_id = engine
            .state
            .spawn_unit(0, UnitType::Warrior, OffsetCoord::new(2, 2))
            .unwrap();

        let lake = OffsetCoord::new(3, 2);
        let idx = engine.state.map.tile_id(&lake).unwrap() as usize;
        engine.state.map.tiles[idx].terrain = Terrain::Water;

        let err = engine
            .execute(&request(
                0,
                GameAction::Move {
                    unit_id,
                    destination: lake,
                },
                "t1",
            ))
            .unwrap_err();
        assert!(matches!(err, ActionError::InvalidTarget(_)));
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(GameAction::EndTurn.kind(), "end-turn");
        assert_eq!(
            GameAction::Move {
                unit_id: 1,
                destination: OffsetCoord::new(0, 0),
            }
            .kind(),
            "move"
        );
        assert_eq!(ActionError::NotPlayerTurn.kind(), "not-player-turn");
        assert_eq!(ActionError::OutOfRange.kind(), "out-of-range");
        assert_eq!(
            ActionError::InvalidTarget("x".to_string()).kind(),
            "invalid-target"
        );
    }

    #[test]
    fn test_reachable_tiles_query() {
        let mut engine = engine_with_two_players();
        let unit_id = engine
            .state
            .spawn_unit(0, UnitType::Warrior, OffsetCoord::new(5, 5))
            .unwrap();
        let reachable = engine.reachable_tiles(unit_id).unwrap();
        // Movement 2 on an open map: start + 6 + 12
        assert_eq!(reachable.len(), 19);
    }
}
