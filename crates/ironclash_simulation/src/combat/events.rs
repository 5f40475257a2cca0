//! Combat events: inbound animation callbacks, outbound commands and cues.
//!
//! Движок (или headless ClipTimeline) шлёт `AnimationEvent`, ECS отвечает
//! `AnimationCommand` (что проиграть) и `CombatCue` (эффекты/звуки).

use std::str::FromStr;

use bevy::prelude::*;
use thiserror::Error;

use crate::combat::state::AttackPhase;

/// Which weapon-side hit region an animation activates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitSide {
    Left,
    Right,
    Front,
}

/// Typed attack-clip callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackPhaseEvent {
    /// `start`: new swing begins (hit registry reset)
    Start,
    /// `swing` / `continue` / `end`
    Phase(AttackPhase),
    /// `collide.*`: weapon hit region is live for this frame
    HitRegionActivated(HitSide),
    /// `projectile`: ranged attack releases its projectile
    ProjectileRelease,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown animation event: {0:?}")]
pub struct AnimationEventParseError(pub String);

impl FromStr for AttackPhaseEvent {
    type Err = AnimationEventParseError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let event = match name.trim() {
            "start" => AttackPhaseEvent::Start,
            "swing" => AttackPhaseEvent::Phase(AttackPhase::Swing),
            "continue" => AttackPhaseEvent::Phase(AttackPhase::Continue),
            "end" => AttackPhaseEvent::Phase(AttackPhase::End),
            // Bare "collide" is the front region (single-weapon clips)
            "collide" | "collide.front" => AttackPhaseEvent::HitRegionActivated(HitSide::Front),
            "collide.left" => AttackPhaseEvent::HitRegionActivated(HitSide::Left),
            "collide.right" => AttackPhaseEvent::HitRegionActivated(HitSide::Right),
            "projectile" => AttackPhaseEvent::ProjectileRelease,
            other => return Err(AnimationEventParseError(other.to_string())),
        };
        Ok(event)
    }
}

/// Animation callback kinds delivered to a combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationEventKind {
    Attack(AttackPhaseEvent),
    StaggerFinished,
    DodgeStarted,
    DodgeFinished,
}

/// Animation driver → ECS.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationEvent {
    pub entity: Entity,
    pub kind: AnimationEventKind,
}

impl AnimationEvent {
    pub fn attack(entity: Entity, event: AttackPhaseEvent) -> Self {
        Self {
            entity,
            kind: AnimationEventKind::Attack(event),
        }
    }

    /// Parse an authored attack-clip event name for `entity`.
    pub fn parse_attack(entity: Entity, name: &str) -> Result<Self, AnimationEventParseError> {
        Ok(Self::attack(entity, name.parse()?))
    }
}

/// ECS → animation driver ("play animation clip").
#[derive(Event, Debug, Clone, PartialEq)]
pub enum AnimationCommand {
    PlayAttack {
        entity: Entity,
        animation_id: u32,
        /// Ranged clips release a projectile instead of hit regions
        ranged: bool,
    },
    /// `local_direction`: hit direction in the defender's local XZ frame,
    /// doubled for powerful hits (blend tree picks the heavy clip)
    PlayStagger {
        entity: Entity,
        local_direction: Vec2,
        big_hit: bool,
    },
    PlayDodge {
        entity: Entity,
    },
    SetBlocking {
        entity: Entity,
        blocking: bool,
    },
    BlockImpact {
        entity: Entity,
    },
    SetCharging {
        entity: Entity,
        charging: bool,
    },
    PlayDeath {
        entity: Entity,
    },
}

impl AnimationCommand {
    pub fn entity(&self) -> Entity {
        match self {
            AnimationCommand::PlayAttack { entity, .. }
            | AnimationCommand::PlayStagger { entity, .. }
            | AnimationCommand::PlayDodge { entity }
            | AnimationCommand::SetBlocking { entity, .. }
            | AnimationCommand::BlockImpact { entity }
            | AnimationCommand::SetCharging { entity, .. }
            | AnimationCommand::PlayDeath { entity } => *entity,
        }
    }
}

/// Fire-and-forget feedback (effects spawn with a fixed lifetime).
#[derive(Event, Debug, Clone, PartialEq)]
pub enum CombatCue {
    Effect {
        effect: String,
        position: Vec3,
        lifetime: f32,
    },
    Sound {
        sound: String,
        position: Vec3,
    },
}

pub const BLOCK_EFFECT: &str = "block";
pub const PARRY_EFFECT: &str = "parry";

/// Damage went through `resolve_hit`.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct DamageDealt {
    pub attacker: Entity,
    pub target: Entity,
    pub damage: f32,
    pub is_powerful: bool,
}

/// Combatant died this tick (emitted once per combatant).
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Attack left the Attack state: `completed` on End, false when interrupted.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackEnded {
    pub entity: Entity,
    pub completed: bool,
}

/// A block inside the parry window punished the attacker.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parried {
    pub defender: Entity,
    pub attacker: Entity,
}
