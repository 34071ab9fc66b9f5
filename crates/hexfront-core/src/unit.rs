//! Unit system - stat templates and units on the map.

use crate::hex::OffsetCoord;
use crate::types::{ParticipantId, UnitId};
use serde::{Deserialize, Serialize};

/// A unit on the game map.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Unit {
    /// Unique identifier.
    pub id: UnitId,
    /// Owning participant.
    pub owner: ParticipantId,
    /// Type of unit.
    pub unit_type: UnitType,
    /// Current position on the map.
    pub position: OffsetCoord,
    /// Current hit points.
    pub health: u32,
    /// Has the unit used its action this turn?
    pub has_acted: bool,
}

impl Unit {
    /// Create a new unit at full health.
    pub fn new(id: UnitId, owner: ParticipantId, unit_type: UnitType, position: OffsetCoord) -> Self {
        Self {
            id,
            owner,
            unit_type,
            position,
            health: unit_type.stats().max_health,
            has_acted: false,
        }
    }

    /// Get the stat template for this unit's type.
    pub fn stats(&self) -> UnitStats {
        self.unit_type.stats()
    }

    /// Check if the unit attacks at range.
    pub fn is_ranged(&self) -> bool {
        self.stats().ranged
    }

    /// Check whether a target at the given distance is attackable.
    pub fn in_attack_range(&self, distance: u32) -> bool {
        let stats = self.stats();
        distance >= stats.range_min && distance <= stats.range_max
    }

    /// Check if the unit may still act this turn.
    pub fn can_act(&self) -> bool {
        !self.has_acted
    }

    /// Mark the unit as having acted this turn.
    pub fn mark_acted(&mut self) {
        self.has_acted = true;
    }

    /// Apply damage, clamping hit points at zero.
    pub fn take_damage(&mut self, damage: u32) {
        self.health = self.health.saturating_sub(damage);
    }

    /// Check if the unit has been destroyed.
    pub fn is_dead(&self) -> bool {
        self.health == 0
    }

    /// Reset the per-turn action flag.
    pub fn reset_for_turn(&mut self) {
        self.has_acted = false;
    }
}

/// Types of units available.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitType {
    Warrior,
    Spearman,
    Horseman,
    Slinger,
    Archer,
    Catapult,
}

impl UnitType {
    /// Get the immutable stat template for this unit type.
    pub const fn stats(&self) -> UnitStats {
        match self {
            UnitType::Warrior => UnitStats::melee(20, 10, 100, 2),
            UnitType::Spearman => UnitStats::melee(24, 14, 110, 2),
            UnitType::Horseman => UnitStats::melee(25, 10, 90, 4),
            UnitType::Slinger => UnitStats::ranged(15, 8, 60, 2, 1, 2),
            UnitType::Archer => UnitStats::ranged(18, 10, 70, 2, 1, 2),
            // Minimum range 2: catapults cannot fire at adjacent targets
            UnitType::Catapult => UnitStats::ranged(30, 6, 70, 2, 2, 3),
        }
    }

    /// All unit types, in production order.
    pub const fn all() -> &'static [UnitType] {
        &[
            UnitType::Warrior,
            UnitType::Spearman,
            UnitType::Horseman,
            UnitType::Slinger,
            UnitType::Archer,
            UnitType::Catapult,
        ]
    }
}

impl std::fmt::Display for UnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Immutable stat template shared by all units of a type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    /// Attack strength.
    pub attack: u32,
    /// Defence strength.
    pub defence: u32,
    /// Hit points at full health.
    pub max_health: u32,
    /// Movement points per turn (hex steps).
    pub movement: u32,
    /// Does the unit attack at range?
    pub ranged: bool,
    /// Minimum attack distance.
    pub range_min: u32,
    /// Maximum attack distance.
    pub range_max: u32,
}

impl UnitStats {
    /// Create melee unit stats (attacks adjacent tiles only).
    pub const fn melee(attack: u32, defence: u32, max_health: u32, movement: u32) -> Self {
        Self {
            attack,
            defence,
            max_health,
            movement,
            ranged: false,
            range_min: 1,
            range_max: 1,
        }
    }

    /// Create ranged unit stats.
    pub const fn ranged(
        attack: u32,
        defence: u32,
        max_health: u32,
        movement: u32,
        range_min: u32,
        range_max: u32,
    ) -> Self {
        Self {
            attack,
            defence,
            max_health,
            movement,
            ranged: true,
            range_min,
            range_max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_creation() {
        let unit = Unit::new(1, 0, UnitType::Warrior, OffsetCoord::new(5, 5));
        assert_eq!(unit.id, 1);
        assert_eq!(unit.owner, 0);
        assert_eq!(unit.health, 100);
        assert!(!unit.has_acted);
    }

    #[test]
    fn test_unit_stats() {
        let warrior = UnitType::Warrior.stats();
        assert_eq!(warrior.attack, 20);
        assert_eq!(warrior.defence, 10);
        assert!(!warrior.ranged);
        assert_eq!(warrior.range_max, 1);

        let slinger = UnitType::Slinger.stats();
        assert_eq!(slinger.attack, 15);
        assert!(slinger.ranged);
        assert_eq!(slinger.range_max, 2);
    }

    #[test]
    fn test_all_types_have_sane_stats() {
        for unit_type in UnitType::all() {
            let stats = unit_type.stats();
            assert!(stats.attack > 0, "{unit_type} has no attack");
            assert!(stats.max_health > 0, "{unit_type} has no health");
            assert!(stats.movement > 0, "{unit_type} cannot move");
            assert!(stats.range_min <= stats.range_max);
            if !stats.ranged {
                assert_eq!((stats.range_min, stats.range_max), (1, 1));
            }
        }
    }

    #[test]
    fn test_attack_range() {
        let archer = Unit::new(1, 0, UnitType::Archer, OffsetCoord::new(0, 0));
        assert!(archer.in_attack_range(1));
        assert!(archer.in_attack_range(2));
        assert!(!archer.in_attack_range(3));

        let catapult = Unit::new(2, 0, UnitType::Catapult, OffsetCoord::new(0, 0));
        assert!(!catapult.in_attack_range(1)); // below minimum range
        assert!(catapult.in_attack_range(2));
    }

    #[test]
    fn test_damage_clamps_at_zero() {
        let mut unit = Unit::new(1, 0, UnitType::Slinger, OffsetCoord::new(0, 0));
        unit.take_damage(30);
        assert_eq!(unit.health, 30);
        unit.take_damage(45);
        assert_eq!(unit.health, 0);
        assert!(unit.is_dead());
    }

    #[test]
    fn test_acted_flag() {
        let mut unit = Unit::new(1, 0, UnitType::Warrior, OffsetCoord::new(0, 0));
        assert!(unit.can_act());
        unit.mark_acted();
        assert!(!unit.can_act());
        unit.reset_for_turn();
        assert!(unit.can_act());
    }

    #[test]
    fn test_unit_serialization() {
        let unit = Unit::new(1, 0, UnitType::Catapult, OffsetCoord::new(3, 7));
        let json = serde_json::to_string(&unit).unwrap();
        let restored: Unit = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.id, unit.id);
        assert_eq!(restored.unit_type, unit.unit_type);
        assert_eq!(restored.position, unit.position);
    }
}
