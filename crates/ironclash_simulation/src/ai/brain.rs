//! Enemy brain: target → queue → attempt → attack → rest.
//!
//! ```text
//! Idle ──enter_queue──▶ Queued ──AttemptAttack──▶ Attempting ──in reach──▶ Attacking
//!  ▲                                 │ GiveUpAttack                          │ AttackEnded
//!  └────────────── Resting ◀─────────┴───────────────────────────────────────┘
//! ```
//!
//! Мозг не атакует сам по себе: только scheduler выдаёт право на попытку.

use bevy::prelude::*;
use rand::Rng;

use crate::ai::scheduler::{AttackScheduler, SchedulerNotice};
use crate::combat::{
    AnimationCommand, AttackClass, AttackEnded, AttackSet, CombatStateMachine, EntityDied,
};
use crate::components::{Combatant, Health, MoveIntent, Pose};
use crate::config::CombatTuning;
use crate::DeterministicRng;

/// Where the brain is in the attack cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum BrainIntent {
    #[default]
    Idle,
    /// Waiting in the scheduler queue
    Queued,
    /// Granted: walk into reach and commit
    Attempting,
    Attacking,
    /// Attack over; waiting for `next_attack_allowed_at`
    Resting,
}

/// AI control policy of an enemy combatant.
#[derive(Component, Debug, Clone)]
pub struct EnemyBrain {
    pub class: AttackClass,
    pub attacks: AttackSet,
    /// Радиус обнаружения цели (метры)
    pub aggro_range: f32,
    /// Distance at which a granted attempt commits
    pub reach: f32,
    /// Per-combatant pause after each attack (seconds)
    pub rest_time: f32,
    pub target: Option<Entity>,
    pub intent: BrainIntent,
}

impl EnemyBrain {
    pub fn new(class: AttackClass, attacks: AttackSet) -> Self {
        let reach = match class {
            AttackClass::Melee => 1.8,
            AttackClass::Ranged => 8.0,
        };
        Self {
            class,
            attacks,
            aggro_range: 15.0,
            reach,
            rest_time: 1.5,
            target: None,
            intent: BrainIntent::Idle,
        }
    }

    /// Distance the brain keeps while it has no grant.
    pub fn standoff(&self) -> f32 {
        self.reach + 1.0
    }
}

/// System: AttackEnded → scheduler complete / release, start rest.
pub fn handle_attack_endings(
    mut endings: EventReader<AttackEnded>,
    mut brains: Query<(&mut EnemyBrain, &mut CombatStateMachine)>,
    mut scheduler: ResMut<AttackScheduler>,
    time: Res<Time<Fixed>>,
) {
    let now = time.elapsed_secs();

    for ending in endings.read() {
        let Ok((mut brain, mut machine)) = brains.get_mut(ending.entity) else {
            continue;
        };
        if brain.intent != BrainIntent::Attacking {
            continue;
        }

        if ending.completed {
            scheduler.complete(ending.entity, now);
        } else {
            scheduler.release(ending.entity);
        }
        machine.next_attack_allowed_at = now + brain.rest_time;
        brain.intent = BrainIntent::Resting;

        crate::logger::log(&format!(
            "🤖 AI: {:?} attack {} → resting {:.1}s",
            ending.entity,
            if ending.completed { "completed" } else { "interrupted" },
            brain.rest_time
        ));
    }
}

/// System: pick / drop the nearest living hostile within aggro range.
pub fn acquire_targets(
    mut brains: Query<(Entity, &Combatant, &Pose, &Health, &mut EnemyBrain)>,
    candidates: Query<(Entity, &Combatant, &Pose, &Health)>,
    mut scheduler: ResMut<AttackScheduler>,
) {
    for (entity, combatant, pose, health, mut brain) in brains.iter_mut() {
        if health.is_dead() {
            continue;
        }

        let still_valid = brain.target.is_some_and(|target| {
            candidates
                .get(target)
                .is_ok_and(|(_, _, target_pose, target_health)| {
                    target_health.is_alive()
                        && target_pose.position.distance(pose.position) <= brain.aggro_range
                })
        });
        if still_valid {
            continue;
        }

        let nearest = candidates
            .iter()
            .filter(|(other, other_combatant, _, other_health)| {
                *other != entity
                    && other_combatant.faction != combatant.faction
                    && other_health.is_alive()
            })
            .map(|(other, _, other_pose, _)| (other, other_pose.position.distance(pose.position)))
            .filter(|(_, distance)| *distance <= brain.aggro_range)
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.index().cmp(&b.0.index())))
            .map(|(other, _)| other);

        if nearest != brain.target {
            if brain.target.is_some() && nearest.is_none() {
                // Цель потеряна: отказываемся от очереди/попытки. Идущая атака
                // доигрывается и закрывается через AttackEnded (complete/release).
                if brain.intent != BrainIntent::Attacking {
                    scheduler.remove(entity);
                    brain.intent = BrainIntent::Idle;
                }
                crate::logger::log(&format!("🤖 AI: {:?} lost target", entity));
            } else if let Some(target) = nearest {
                crate::logger::log(&format!("🤖 AI: {:?} targets {:?}", entity, target));
            }
            brain.target = nearest;
        }
    }
}

/// System: ready brains ask the scheduler for an attack slot.
pub fn request_attack_slots(
    mut brains: Query<(Entity, &mut EnemyBrain, &CombatStateMachine)>,
    mut scheduler: ResMut<AttackScheduler>,
    time: Res<Time<Fixed>>,
) {
    let now = time.elapsed_secs();

    for (entity, mut brain, machine) in brains.iter_mut() {
        if machine.is_dead() || brain.target.is_none() {
            continue;
        }
        if brain.intent == BrainIntent::Resting && now >= machine.next_attack_allowed_at {
            brain.intent = BrainIntent::Idle;
        }
        if brain.intent != BrainIntent::Idle || !machine.is_free() {
            continue;
        }

        if scheduler.enter_queue(entity, brain.class, now) {
            brain.intent = BrainIntent::Queued;
            crate::logger::log(&format!("🤖 AI: {:?} queued ({:?})", entity, brain.class));
        }
    }
}

/// System: scheduler pass → AttemptAttack / GiveUpAttack.
pub fn run_attack_scheduler(
    mut scheduler: ResMut<AttackScheduler>,
    mut brains: Query<&mut EnemyBrain>,
    time: Res<Time<Fixed>>,
) {
    let now = time.elapsed_secs();

    for notice in scheduler.tick(now) {
        let Ok(mut brain) = brains.get_mut(notice.combatant()) else {
            continue;
        };
        match notice {
            SchedulerNotice::AttemptAttack { combatant, class } => {
                brain.intent = BrainIntent::Attempting;
                crate::logger::log(&format!(
                    "🎟️ AI: {:?} granted {:?} attack attempt",
                    combatant, class
                ));
            }
            SchedulerNotice::GiveUpAttack { combatant, .. } => {
                if brain.intent == BrainIntent::Attempting {
                    brain.intent = BrainIntent::Idle;
                }
                crate::logger::log(&format!("🎟️ AI: {:?} gave up attack attempt", combatant));
            }
        }
    }
}

/// System: movement + commit for every brain.
///
/// Attempting brains walk into reach and commit a weighted-random attack;
/// the others keep their standoff distance.
pub fn drive_enemy_brains(
    mut brains: Query<(
        Entity,
        &mut EnemyBrain,
        &mut CombatStateMachine,
        &Pose,
        &mut MoveIntent,
    )>,
    targets: Query<&Pose, With<Combatant>>,
    mut scheduler: ResMut<AttackScheduler>,
    mut rng: ResMut<DeterministicRng>,
    mut animation: EventWriter<AnimationCommand>,
    tuning: Res<CombatTuning>,
) {
    for (entity, mut brain, mut machine, pose, mut intent) in brains.iter_mut() {
        intent.direction = Vec3::ZERO;

        if machine.is_dead() {
            continue;
        }
        let Some(target_pose) = brain.target.and_then(|target| targets.get(target).ok()) else {
            continue;
        };

        let to_target = pose.flat_direction_to(target_pose.position);
        let distance = to_target.length();

        match brain.intent {
            BrainIntent::Attacking => {}
            BrainIntent::Attempting if distance <= brain.reach => {
                if !machine.is_free() {
                    continue;
                }

                let seed = rng.rng.gen::<f32>();
                let attack = match brain.attacks.get_by_random_seed(seed) {
                    Ok(attack) => attack.clone(),
                    Err(err) => {
                        crate::logger::log_error(&format!("🤖 AI: {:?} has no attack: {}", entity, err));
                        continue;
                    }
                };

                let attack_id = attack.id;
                let animation_id = attack.animation_id;
                let ranged = attack.is_ranged();
                if machine.start_attack(attack).is_err() {
                    continue;
                }

                let facing = pose.facing;
                machine
                    .motion
                    .start_turn(facing, to_target, tuning.attack_turn_time);
                scheduler.commit(entity);
                brain.intent = BrainIntent::Attacking;

                animation.write(AnimationCommand::PlayAttack {
                    entity,
                    animation_id,
                    ranged,
                });
                crate::logger::log(&format!(
                    "⚔️ AI: {:?} commits attack {} (seed {:.3})",
                    entity, attack_id, seed
                ));
            }
            BrainIntent::Attempting => {
                intent.direction = to_target.normalize_or_zero();
            }
            _ => {
                if distance > brain.standoff() {
                    intent.direction = to_target.normalize_or_zero();
                }
            }
        }
    }
}

/// System: dead combatants leave the scheduler (Cleanup).
pub fn forget_dead_combatants(
    mut deaths: EventReader<EntityDied>,
    mut scheduler: ResMut<AttackScheduler>,
    mut brains: Query<&mut EnemyBrain>,
) {
    for death in deaths.read() {
        scheduler.remove(death.entity);
        if let Ok(mut brain) = brains.get_mut(death.entity) {
            brain.intent = BrainIntent::Idle;
            brain.target = None;
        }
    }
}
