//! Death handling: disable hit detection and motion of dead combatants.

use bevy::prelude::*;

use crate::combat::events::{AnimationCommand, EntityDied};
use crate::components::{MoveIntent, WeaponColliders};

/// System: react to `EntityDied` (FixedUpdate, CombatSet::Cleanup).
///
/// - Hit regions disabled (no further hit detection)
/// - MoveIntent cleared (no navigation/driven motion)
/// - Death clip requested
pub fn handle_deaths(
    mut deaths: EventReader<EntityDied>,
    mut combatants: Query<(Option<&mut WeaponColliders>, &mut MoveIntent)>,
    mut animation: EventWriter<AnimationCommand>,
) {
    for death in deaths.read() {
        let Ok((colliders, mut intent)) = combatants.get_mut(death.entity) else {
            continue;
        };

        if let Some(mut colliders) = colliders {
            colliders.enabled = false;
        }
        intent.direction = Vec3::ZERO;

        animation.write(AnimationCommand::PlayDeath {
            entity: death.entity,
        });

        crate::logger::log(&format!(
            "☠️ ECS: {:?} disabled (hit regions off, motion stopped)",
            death.entity
        ));
    }
}
