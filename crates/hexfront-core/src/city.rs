//! City system - fixed settlements that can be besieged.

use crate::hex::OffsetCoord;
use crate::types::{CityId, ParticipantId};
use serde::{Deserialize, Serialize};

/// Hit points a newly founded city starts with.
pub const CITY_MAX_HEALTH: u32 = 100;

/// Inherent defence strength of a city.
pub const CITY_DEFENCE: u32 = 12;

/// A city on the game map. Cities never move.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct City {
    /// Unique identifier.
    pub id: CityId,
    /// Owning participant.
    pub owner: ParticipantId,
    /// City name.
    pub name: String,
    /// Location on the map.
    pub position: OffsetCoord,
    /// Current hit points.
    pub health: u32,
    /// Maximum hit points.
    pub max_health: u32,
    /// Defence strength used in combat.
    pub defence: u32,
}

impl City {
    /// Create a new city at full health.
    pub fn new(id: CityId, owner: ParticipantId, name: String, position: OffsetCoord) -> Self {
        Self {
            id,
            owner,
            name,
            position,
            health: CITY_MAX_HEALTH,
            max_health: CITY_MAX_HEALTH,
            defence: CITY_DEFENCE,
        }
    }

    /// Apply damage, clamping hit points at zero.
    pub fn take_damage(&mut self, damage: u32) {
        self.health = self.health.saturating_sub(damage);
    }

    /// Check if the city has been reduced to zero hit points.
    pub fn is_fallen(&self) -> bool {
        self.health == 0
    }
}
