//! Projectile lifecycle: release, flight, hit, deflect, expiry.

use bevy::prelude::*;

use crate::combat::attack::AttackDefinition;
use crate::combat::hit::{resolve_hit, Defender, HitOutcome, HitSource, IncomingHit};
use crate::combat::projectile::Projectile;
use crate::combat::state::CombatState;
use crate::components::{Combatant, Pose};
use crate::config::CombatTuning;
use crate::physics::{CombatLayers, CombatPhysics, BODY_CENTER_HEIGHT};

use super::melee::CombatantQuery;
use super::HitFeedback;

/// Spawn the projectile of a ranged attack in front of the shooter.
pub fn spawn_projectile(
    commands: &mut Commands,
    shooter: Entity,
    combatant: &Combatant,
    pose: &Pose,
    attack: &AttackDefinition,
    now: f32,
    tuning: &CombatTuning,
) -> Option<Entity> {
    let forward = pose.forward();
    let Some(projectile) = Projectile::fire(
        shooter,
        combatant.faction,
        forward,
        attack,
        now,
        tuning.projectile_lifetime,
    ) else {
        crate::logger::log_warning(&format!(
            "⚠️ ECS: {:?} released attack {} without projectile speed",
            shooter, attack.id
        ));
        return None;
    };

    let position = pose.position + Vec3::Y * BODY_CENTER_HEIGHT + forward * combatant.body_radius;
    let facing = projectile.facing();
    let entity = commands.spawn((projectile, Pose { position, facing })).id();

    crate::logger::log(&format!(
        "🏹 ECS: {:?} fired projectile {:?} (attack {})",
        shooter, entity, attack.id
    ));
    Some(entity)
}

/// System: move projectiles along their velocity.
pub fn advance_projectiles(
    mut projectiles: Query<(&Projectile, &mut Pose)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();
    for (projectile, mut pose) in projectiles.iter_mut() {
        if !projectile.spent {
            pose.position += projectile.velocity * delta;
        }
    }
}

/// System: trigger-overlap → GetHit. Each projectile hits at most one target.
///
/// Dodging combatants are not targets: the projectile flies through them.
/// A parry deflects the projectile back (new entity, reversed, damage × multiplier).
pub fn resolve_projectile_hits(
    mut projectiles: Query<(Entity, &mut Projectile, &Pose)>,
    mut combatants: CombatantQuery,
    physics: Res<CombatPhysics>,
    tuning: Res<CombatTuning>,
    time: Res<Time<Fixed>>,
    mut feedback: HitFeedback,
    mut commands: Commands,
) {
    let now = time.elapsed_secs();

    // Детерминированный порядок обхода снарядов
    let mut order: Vec<Entity> = projectiles.iter().map(|(entity, _, _)| entity).collect();
    order.sort_by_key(|entity| entity.index());

    for projectile_entity in order {
        let Ok((_, mut projectile, projectile_pose)) = projectiles.get_mut(projectile_entity) else {
            continue;
        };
        if projectile.spent {
            continue;
        }

        let position = projectile_pose.position;
        let candidates =
            physics.overlap_sphere(position, tuning.projectile_radius, CombatLayers::ALL);

        // Nearest eligible target
        let target = candidates
            .into_iter()
            .filter_map(|candidate| {
                let (_, combatant, machine, health, pose, _) = combatants.get(candidate).ok()?;
                let eligible = health.is_alive()
                    && machine.state() != CombatState::Dodge
                    && projectile.can_hit(candidate, combatant.faction);
                eligible.then(|| (candidate, pose.position.distance_squared(position)))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(candidate, _)| candidate);

        let Some(target) = target else {
            continue;
        };
        let Ok((_, target_combatant, mut target_machine, mut target_health, mut target_pose, _)) =
            combatants.get_mut(target)
        else {
            continue;
        };

        let hit = IncomingHit {
            source: HitSource::Projectile {
                projectile: projectile_entity,
                owner: projectile.owner(),
            },
            origin: position,
            damage: projectile.damage,
            is_powerful: projectile.attack.is_powerful,
            hit_effect: projectile.attack.hit_effect.clone(),
        };
        let facing_before = target_pose.facing;
        let outcome = resolve_hit(
            Defender {
                combatant: target_combatant,
                machine: &mut *target_machine,
                health: &mut *target_health,
                pose: &mut *target_pose,
            },
            &hit,
            now,
            &tuning,
        );

        if matches!(outcome, HitOutcome::Ignored) {
            continue;
        }
        projectile.spent = true;

        if matches!(outcome, HitOutcome::Parried) {
            let deflected = projectile.deflected(
                target,
                tuning.deflected_projectile_damage_multiplier,
                now,
            );
            let facing = deflected.facing();
            let deflected_entity = commands.spawn((deflected, Pose { position, facing })).id();
            feedback.projectile_parried(target, hit.source.attacker());
            crate::logger::log(&format!(
                "↩️ ECS: {:?} deflected projectile {:?} → {:?}",
                target, projectile_entity, deflected_entity
            ));
        } else {
            crate::logger::log(&format!(
                "🎯 ECS: projectile {:?} hit {:?} → {:?}",
                projectile_entity, target, outcome
            ));
        }

        feedback.report(
            target,
            &target_pose,
            facing_before,
            &hit,
            &outcome,
            tuning.effect_lifetime,
        );
    }
}

/// System: despawn spent projectiles and those past their TTL.
pub fn expire_projectiles(
    projectiles: Query<(Entity, &Projectile)>,
    time: Res<Time<Fixed>>,
    mut commands: Commands,
) {
    let now = time.elapsed_secs();
    for (entity, projectile) in projectiles.iter() {
        if projectile.spent || projectile.is_expired(now) {
            if !projectile.spent {
                crate::logger::log(&format!("⌛ ECS: projectile {:?} expired", entity));
            }
            commands.entity(entity).despawn();
        }
    }
}
