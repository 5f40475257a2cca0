//! Animation callbacks → state machine transitions.
//!
//! Все события обрабатываются строго по порядку в одной системе: фаза,
//! hit-region и release снаряда видят состояние, оставленное предыдущим
//! событием этого же тика.

use bevy::prelude::*;

use crate::combat::events::{AnimationEvent, AnimationEventKind, AttackPhaseEvent, CombatCue};
use crate::combat::state::AttackPhase;
use crate::config::CombatTuning;
use crate::physics::CombatPhysics;

use super::melee::{strike_hit_region, CombatantQuery};
use super::projectile::spawn_projectile;
use super::HitFeedback;

/// System: apply animation events to combatants (FixedUpdate, CombatSet::Animation).
pub fn process_animation_events(
    mut events: EventReader<AnimationEvent>,
    mut combatants: CombatantQuery,
    physics: Res<CombatPhysics>,
    tuning: Res<CombatTuning>,
    time: Res<Time<Fixed>>,
    mut feedback: HitFeedback,
    mut commands: Commands,
) {
    let now = time.elapsed_secs();

    for event in events.read() {
        let entity = event.entity;

        match event.kind {
            AnimationEventKind::Attack(AttackPhaseEvent::HitRegionActivated(side)) => {
                strike_hit_region(
                    entity,
                    side,
                    &mut combatants,
                    &physics,
                    &tuning,
                    now,
                    &mut feedback,
                );
            }
            AnimationEventKind::Attack(AttackPhaseEvent::ProjectileRelease) => {
                let Ok((_, combatant, machine, _, pose, _)) = combatants.get(entity) else {
                    continue;
                };
                let Some(attack) = machine.current_attack().filter(|_| machine.is_attacking())
                else {
                    continue;
                };
                spawn_projectile(&mut commands, entity, combatant, pose, attack, now, &tuning);
            }
            AnimationEventKind::Attack(phase_event) => {
                let Ok((_, _, mut machine, _, pose, _)) = combatants.get_mut(entity) else {
                    continue;
                };

                match phase_event {
                    AttackPhaseEvent::Start => {
                        machine.on_attack_start();
                    }
                    AttackPhaseEvent::Phase(AttackPhase::End) => {
                        if let Some(finished) = machine.on_attack_phase(AttackPhase::End) {
                            crate::logger::log(&format!(
                                "✅ ECS: {:?} attack {} finished",
                                entity, finished.id
                            ));
                            feedback.attack_ended(entity, true);
                        }
                    }
                    AttackPhaseEvent::Phase(phase) => {
                        let was_attacking = machine.is_attacking();
                        machine.on_attack_phase(phase);

                        if was_attacking && phase == AttackPhase::Swing {
                            if let Some(sound) = machine.current_attack().and_then(|a| a.sound.clone()) {
                                feedback.cue(CombatCue::Sound {
                                    sound,
                                    position: pose.position,
                                });
                            }
                        }
                    }
                    AttackPhaseEvent::HitRegionActivated(_) | AttackPhaseEvent::ProjectileRelease => {}
                }
            }
            AnimationEventKind::StaggerFinished => {
                if let Ok((_, _, mut machine, _, _, _)) = combatants.get_mut(entity) {
                    machine.finish_stagger();
                }
            }
            AnimationEventKind::DodgeStarted => {
                if let Ok((_, _, mut machine, _, pose, _)) = combatants.get_mut(entity) {
                    if machine.state() == crate::combat::CombatState::Dodge {
                        machine.motion.start_roll(pose.forward() * tuning.roll_speed);
                    }
                }
            }
            AnimationEventKind::DodgeFinished => {
                if let Ok((_, _, mut machine, _, _, _)) = combatants.get_mut(entity) {
                    machine.finish_dodge();
                }
            }
        }
    }
}
