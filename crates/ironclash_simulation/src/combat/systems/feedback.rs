//! Outbound effects of a resolved hit (events, cues, animation commands).

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::combat::attack::AttackDefinition;
use crate::combat::events::{
    AnimationCommand, AttackEnded, CombatCue, DamageDealt, EntityDied, Parried, BLOCK_EFFECT,
    PARRY_EFFECT,
};
use crate::combat::hit::{HitOutcome, IncomingHit};
use crate::components::Pose;

/// Effects spawn at chest height above the combatant.
pub const EFFECT_HEIGHT: f32 = 1.5;

/// Hit direction in the defender's local XZ frame (x = right, y = forward).
pub fn local_hit_direction(facing: Quat, position: Vec3, origin: Vec3, powerful: bool) -> Vec2 {
    let mut direction = origin - position;
    direction.y = 0.0;
    let local = facing.inverse() * direction.normalize_or_zero();
    let local = Vec2::new(local.x, local.z);
    if powerful {
        local * 2.0
    } else {
        local
    }
}

/// Все writer'ы, которые нужны melee и projectile системам.
#[derive(SystemParam)]
pub struct HitFeedback<'w> {
    animation: EventWriter<'w, AnimationCommand>,
    cues: EventWriter<'w, CombatCue>,
    damage: EventWriter<'w, DamageDealt>,
    deaths: EventWriter<'w, EntityDied>,
    attack_ended: EventWriter<'w, AttackEnded>,
    parried: EventWriter<'w, Parried>,
}

impl HitFeedback<'_> {
    /// Report what `resolve_hit` did to `defender`.
    ///
    /// `facing_before` is the defender's facing before the stagger snap.
    pub fn report(
        &mut self,
        defender: Entity,
        pose: &Pose,
        facing_before: Quat,
        hit: &IncomingHit,
        outcome: &HitOutcome,
        effect_lifetime: f32,
    ) {
        let effect_position = pose.position + Vec3::Y * EFFECT_HEIGHT;
        let attacker = hit.source.attacker();

        match outcome {
            HitOutcome::Ignored => {}
            HitOutcome::Parried => {
                self.effect(PARRY_EFFECT, effect_position, effect_lifetime);
            }
            HitOutcome::Blocked => {
                self.animation
                    .write(AnimationCommand::BlockImpact { entity: defender });
                self.effect(BLOCK_EFFECT, effect_position, effect_lifetime);
                crate::logger::log(&format!(
                    "🛡️ ECS: {:?} blocked hit from {:?}",
                    defender, attacker
                ));
            }
            HitOutcome::Damaged {
                amount,
                staggered,
                interrupted,
            } => {
                self.damage_dealt(attacker, defender, *amount, hit);
                if let Some(effect) = &hit.hit_effect {
                    self.effect(effect, effect_position, effect_lifetime);
                }
                if *staggered {
                    self.animation.write(AnimationCommand::PlayStagger {
                        entity: defender,
                        local_direction: local_hit_direction(
                            facing_before,
                            pose.position,
                            hit.origin,
                            hit.is_powerful,
                        ),
                        big_hit: hit.is_powerful,
                    });
                }
                self.interrupted(defender, interrupted.as_ref());
            }
            HitOutcome::Killed {
                amount,
                interrupted,
            } => {
                self.damage_dealt(attacker, defender, *amount, hit);
                if let Some(effect) = &hit.hit_effect {
                    self.effect(effect, effect_position, effect_lifetime);
                }
                self.interrupted(defender, interrupted.as_ref());
                self.deaths.write(EntityDied {
                    entity: defender,
                    killer: Some(attacker),
                });
                crate::logger::log_info(&format!(
                    "💀 ECS: {:?} killed by {:?}",
                    defender, attacker
                ));
            }
        }
    }

    /// Attacker was parried into a big stagger.
    pub fn attacker_parried(
        &mut self,
        attacker: Entity,
        attacker_pose: &Pose,
        defender: Entity,
        defender_position: Vec3,
        interrupted: Option<&AttackDefinition>,
    ) {
        self.animation.write(AnimationCommand::PlayStagger {
            entity: attacker,
            local_direction: local_hit_direction(
                attacker_pose.facing,
                attacker_pose.position,
                defender_position,
                true,
            ),
            big_hit: true,
        });
        self.interrupted(attacker, interrupted);
        self.parried.write(Parried { defender, attacker });
        crate::logger::log(&format!(
            "⚔️ ECS: {:?} parried {:?} → attacker staggered",
            defender, attacker
        ));
    }

    /// Projectile parried: no stagger, the projectile flies back instead.
    pub fn projectile_parried(&mut self, defender: Entity, owner: Entity) {
        self.parried.write(Parried {
            defender,
            attacker: owner,
        });
    }

    /// Cue for a swing sound / effect.
    pub fn cue(&mut self, cue: CombatCue) {
        self.cues.write(cue);
    }

    /// Attack left the Attack state (`completed` on End).
    pub fn attack_ended(&mut self, entity: Entity, completed: bool) {
        self.attack_ended.write(AttackEnded { entity, completed });
    }

    fn interrupted(&mut self, entity: Entity, interrupted: Option<&AttackDefinition>) {
        if let Some(attack) = interrupted {
            crate::logger::log(&format!(
                "💢 ECS: {:?} attack {} interrupted",
                entity, attack.id
            ));
            self.attack_ended(entity, false);
        }
    }

    fn damage_dealt(&mut self, attacker: Entity, target: Entity, damage: f32, hit: &IncomingHit) {
        self.damage.write(DamageDealt {
            attacker,
            target,
            damage,
            is_powerful: hit.is_powerful,
        });
        crate::logger::log(&format!(
            "💥 ECS: {:?} → {:?} ({:.1} damage{})",
            attacker,
            target,
            damage,
            if hit.is_powerful { ", powerful" } else { "" }
        ));
    }

    fn effect(&mut self, effect: &str, position: Vec3, lifetime: f32) {
        self.cues.write(CombatCue::Effect {
            effect: effect.to_string(),
            position,
            lifetime,
        });
    }
}
