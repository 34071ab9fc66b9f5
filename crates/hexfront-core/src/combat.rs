//! Combat resolution for unit-vs-unit and unit-vs-city attacks.
//!
//! Combat is a pure calculation with no randomness: the same attacker and
//! defender always produce the same damage. Legality of the attack (turn
//! order, ownership, range) is validated by the engine before resolution;
//! this module only computes and reports the outcome. Removing destroyed
//! units from the board is likewise the engine's job.

use crate::city::City;
use crate::unit::Unit;
use serde::{Deserialize, Serialize};

/// Result of a unit-vs-unit engagement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatResult {
    /// Damage dealt to the defender.
    pub defender_damage: u32,
    /// Damage dealt to the attacker by the counterattack (0 if none).
    pub attacker_damage: u32,
    /// Defender hit points after the engagement.
    pub defender_health: u32,
    /// Attacker hit points after the engagement.
    pub attacker_health: u32,
    /// Whether the defender was destroyed.
    pub defender_destroyed: bool,
    /// Whether the attacker was destroyed by the counterattack.
    pub attacker_destroyed: bool,
}

/// Result of a unit-vs-city attack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityCombatResult {
    /// Damage dealt to the city.
    pub city_damage: u32,
    /// City hit points after the attack.
    pub city_health: u32,
    /// Whether the city was reduced to zero hit points.
    pub city_fallen: bool,
}

/// Damage dealt by one strike.
///
/// `max(1, round(attack^2 / (attack + defence)))` - an attack on a legal
/// target never deals zero damage.
pub fn strike_damage(attack: u32, defence: u32) -> u32 {
    let attack = attack as f64;
    let defence = defence as f64;
    let raw = attack * attack / (attack + defence);
    (raw.round() as u32).max(1)
}

/// Resolve a unit-vs-unit attack.
///
/// The attacker strikes first. A counterattack occurs only when the defender
/// survives and both combatants are melee: ranged attackers are never
/// countered, and a ranged defender does not counter a melee attacker
/// either.
pub fn resolve_unit_combat(attacker: &Unit, defender: &Unit) -> CombatResult {
    let defender_damage = strike_damage(attacker.stats().attack, defender.stats().defence);
    let defender_health = defender.health.saturating_sub(defender_damage);
    let defender_destroyed = defender_health == 0;

    let counters = !defender_destroyed && !attacker.is_ranged() && !defender.is_ranged();
    let attacker_damage = if counters {
        strike_damage(defender.stats().attack, attacker.stats().defence)
    } else {
        0
    };
    let attacker_health = attacker.health.saturating_sub(attacker_damage);

    CombatResult {
        defender_damage,
        attacker_damage,
        defender_health,
        attacker_health,
        defender_destroyed,
        attacker_destroyed: attacker_health == 0,
    }
}

/// Resolve a unit-vs-city attack.
///
/// Cities never counterattack, regardless of the attacking unit's type.
/// Ownership and elimination consequences of a fallen city are handled by
/// the caller.
pub fn resolve_city_combat(attacker: &Unit, city: &City) -> CityCombatResult {
    let city_damage = strike_damage(attacker.stats().attack, city.defence);
    let city_health = city.health.saturating_sub(city_damage);

    CityCombatResult {
        city_damage,
        city_health,
        city_fallen: city_health == 0,
    }
}
