//! `GetHit`: the defender-side entry point for every hit.
//!
//! Атакующий никогда не трогает Health цели напрямую: melee и projectile
//! системы формируют `IncomingHit` и передают его сюда, а решение
//! (parry / block / damage / stagger / death) принимает сама цель.
//!
//! # Decision table
//!
//! | Defender                         | Powerful | Big / mid-powerful | Outcome                 |
//! |----------------------------------|----------|--------------------|-------------------------|
//! | Dead or dodging                  | -        | -                  | Ignored                 |
//! | Blocking, inside parry window    | no       | -                  | Parried (attacker hit)  |
//! | Blocking, outside parry window   | no       | -                  | Blocked (no damage)     |
//! | Blocking                         | yes      | -                  | Damage, block ignored   |
//! | Not blocking                     | no       | no                 | Damage + stagger        |
//! | Not blocking                     | no       | yes                | Damage, no stagger      |
//! | Any                              | yes      | -                  | Damage + big stagger    |
//! | Health reaches 0                 | -        | -                  | Killed (no stagger)     |

use bevy::prelude::*;

use crate::combat::attack::AttackDefinition;
use crate::combat::state::{CombatState, CombatStateMachine};
use crate::components::{Combatant, Health, Pose};
use crate::config::CombatTuning;

/// Who delivered the hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitSource {
    /// Melee swing of a stateful combatant (can be parried into stagger)
    Combatant(Entity),
    /// Projectile entity (a parry deflects it) + combatant credited with it
    Projectile { projectile: Entity, owner: Entity },
}

impl HitSource {
    /// Combatant credited with the hit (damage / kill attribution).
    pub fn attacker(&self) -> Entity {
        match self {
            HitSource::Combatant(entity) => *entity,
            HitSource::Projectile { owner, .. } => *owner,
        }
    }
}

/// Hit payload delivered to `resolve_hit`.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingHit {
    pub source: HitSource,
    /// World position the hit came from (attacker / projectile)
    pub origin: Vec3,
    pub damage: f32,
    pub is_powerful: bool,
    pub hit_effect: Option<String>,
}

impl IncomingHit {
    pub fn from_attack(source: HitSource, origin: Vec3, attack: &AttackDefinition) -> Self {
        Self {
            source,
            origin,
            damage: attack.damage,
            is_powerful: attack.is_powerful,
            hit_effect: attack.hit_effect.clone(),
        }
    }
}

/// What `resolve_hit` did to the defender.
#[derive(Debug, Clone, PartialEq)]
pub enum HitOutcome {
    /// Dead or dodging: nothing happened
    Ignored,
    /// Parry: defender untouched, the source must be punished
    Parried,
    /// Absorbed by block: no damage
    Blocked,
    /// Damage applied; `staggered` if the defender was interrupted
    Damaged {
        amount: f32,
        staggered: bool,
        interrupted: Option<AttackDefinition>,
    },
    /// Damage applied and the defender died
    Killed {
        amount: f32,
        interrupted: Option<AttackDefinition>,
    },
}

impl HitOutcome {
    /// `GetHit(..) -> applied`: true when damage went through.
    pub fn applied(&self) -> bool {
        matches!(self, HitOutcome::Damaged { .. } | HitOutcome::Killed { .. })
    }

    pub fn interrupted(&self) -> Option<&AttackDefinition> {
        match self {
            HitOutcome::Damaged { interrupted, .. } | HitOutcome::Killed { interrupted, .. } => {
                interrupted.as_ref()
            }
            _ => None,
        }
    }
}

/// Mutable view of the defender.
pub struct Defender<'a> {
    pub combatant: &'a Combatant,
    pub machine: &'a mut CombatStateMachine,
    pub health: &'a mut Health,
    pub pose: &'a mut Pose,
}

/// Resolve one incoming hit on the defender.
pub fn resolve_hit(
    defender: Defender<'_>,
    hit: &IncomingHit,
    now: f32,
    tuning: &CombatTuning,
) -> HitOutcome {
    let Defender {
        combatant,
        machine,
        health,
        pose,
    } = defender;

    if health.is_dead() || matches!(machine.state(), CombatState::Dodge | CombatState::Dead) {
        return HitOutcome::Ignored;
    }

    let hit_direction = pose.flat_direction_to(hit.origin);

    if machine.state() == CombatState::Block && !hit.is_powerful {
        let facing = pose.facing;
        machine
            .motion
            .start_turn(facing, hit_direction, tuning.attack_turn_time);

        return if machine.in_parry_window(now, tuning.parry_time) {
            HitOutcome::Parried
        } else {
            HitOutcome::Blocked
        };
    }

    // Toughness rule: big bodies and powerful swings shrug off light hits
    let stagger_immune =
        !hit.is_powerful && (combatant.is_big || machine.is_mid_powerful_attack());

    let report = health.take_damage(hit.damage);

    if report.died {
        let interrupted = machine.current_attack().cloned();
        machine.die();
        return HitOutcome::Killed {
            amount: report.applied,
            interrupted,
        };
    }

    if stagger_immune {
        return HitOutcome::Damaged {
            amount: report.applied,
            staggered: false,
            interrupted: None,
        };
    }

    match machine.stagger(hit.is_powerful) {
        Ok(interrupted) => {
            // Snap facing towards the hit origin
            if let Some(rotation) = crate::components::look_rotation(hit_direction) {
                pose.facing = rotation;
            }
            HitOutcome::Damaged {
                amount: report.applied,
                staggered: true,
                interrupted,
            }
        }
        Err(_) => HitOutcome::Damaged {
            amount: report.applied,
            staggered: false,
            interrupted: None,
        },
    }
}

/// `GetParried`: the attacker's swing was parried → forced big stagger.
///
/// Returns the interrupted attack, or None when the attacker could not be
/// staggered (dead or dodging).
pub fn apply_parried(machine: &mut CombatStateMachine) -> Option<Option<AttackDefinition>> {
    machine.stagger(true).ok()
}
