//! Melee hit detection: hit-region activation → overlap → GetHit.

use bevy::prelude::*;

use crate::combat::events::HitSide;
use crate::combat::hit::{apply_parried, resolve_hit, Defender, HitOutcome, HitSource, IncomingHit};
use crate::combat::projectile::Projectile;
use crate::combat::state::CombatStateMachine;
use crate::components::{Combatant, Health, Pose, WeaponColliders};
use crate::config::CombatTuning;
use crate::physics::{CombatLayers, CombatPhysics};

use super::HitFeedback;

/// Query data shared by the systems that resolve hits on combatants.
pub type CombatantData = (
    Entity,
    &'static Combatant,
    &'static mut CombatStateMachine,
    &'static mut Health,
    &'static mut Pose,
    Option<&'static WeaponColliders>,
);

pub type CombatantQuery<'w, 's> = Query<'w, 's, CombatantData, Without<Projectile>>;

/// `collide.<side>` for `attacker`: overlap the hit region and hit every new target.
///
/// Targets are resolved one by one; a parry staggers the attacker and
/// stops the loop, so a parried swing never lands a later hit.
pub fn strike_hit_region(
    attacker: Entity,
    side: HitSide,
    combatants: &mut CombatantQuery,
    physics: &CombatPhysics,
    tuning: &CombatTuning,
    now: f32,
    feedback: &mut HitFeedback,
) {
    let Ok((_, combatant, machine, _, pose, colliders)) = combatants.get(attacker) else {
        return;
    };

    // Stale callback: attack cancelled or swing window already closed
    if !machine.is_swinging() {
        return;
    }
    let Some(region) = colliders.filter(|c| c.enabled).map(|c| *c.region(side)) else {
        return;
    };
    let Some(attack) = machine.current_attack().cloned() else {
        return;
    };

    let faction = combatant.faction;
    let center = region.world_center(pose.position, pose.facing);
    let layers = if attack.can_hit_allies {
        CombatLayers::ALL
    } else {
        faction.hostile_layers()
    };

    for target in physics.overlap_sphere(center, region.radius, layers) {
        if target == attacker {
            continue;
        }

        let Ok(
            [(_, _, mut attacker_machine, _, attacker_pose, _), (_, target_combatant, mut target_machine, mut target_health, mut target_pose, _)],
        ) = combatants.get_many_mut([attacker, target])
        else {
            continue;
        };

        if !attacker_machine.is_swinging() {
            break;
        }
        if target_combatant.faction == faction && !attack.can_hit_allies {
            continue;
        }
        if !attacker_machine.register_hit(target) {
            continue;
        }

        let hit = IncomingHit::from_attack(
            HitSource::Combatant(attacker),
            attacker_pose.position,
            &attack,
        );
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
            tuning,
        );

        crate::logger::log(&format!(
            "⚔️ ECS: {:?} {:?} hit {:?} → {:?}",
            attacker, side, target, outcome
        ));

        if matches!(outcome, HitOutcome::Parried) {
            if let Some(interrupted) = apply_parried(&mut attacker_machine) {
                feedback.attacker_parried(
                    attacker,
                    &attacker_pose,
                    target,
                    target_pose.position,
                    interrupted.as_ref(),
                );
            }
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
