//! Motion systems: motion tasks (turn / gap-close / roll) and free locomotion.

use bevy::prelude::*;

use crate::combat::state::{CombatState, CombatStateMachine};
use crate::components::{look_rotation, MoveIntent, MovementSpeed, Pose};
use crate::config::CombatTuning;

/// System: advance every combatant's motion tasks by one tick.
///
/// Cancelled tasks (generation mismatch) are dropped without writing.
pub fn advance_motion_tasks(
    mut combatants: Query<(&mut CombatStateMachine, &mut Pose)>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();
    for (mut machine, mut pose) in combatants.iter_mut() {
        if machine.motion.is_idle() {
            continue;
        }
        machine.motion.advance(delta, &mut pose);
    }
}

/// System: walk along `MoveIntent` in free states.
///
/// - Idle/Locomotion: full input, damped turn towards movement
/// - Block: input clamped to `block_max_move_input`
/// - Attack/Stagger/Dodge/Dead: no free movement
pub fn apply_locomotion(
    mut combatants: Query<(&MoveIntent, &MovementSpeed, &mut CombatStateMachine, &mut Pose)>,
    tuning: Res<CombatTuning>,
    time: Res<Time<Fixed>>,
) {
    let delta = time.delta_secs();

    for (intent, speed, mut machine, mut pose) in combatants.iter_mut() {
        let mut direction = Vec3::new(intent.direction.x, 0.0, intent.direction.z).clamp_length_max(1.0);

        match machine.state() {
            CombatState::Idle | CombatState::Locomotion => {}
            CombatState::Block => {
                direction = direction.clamp_length_max(tuning.block_max_move_input);
            }
            _ => continue,
        }

        let moving = direction.length_squared() > 1e-4;
        machine.set_moving(moving);
        if !moving {
            continue;
        }

        pose.position += direction * speed.resolve(&tuning) * delta;

        // Поворот по движению, если нет активного turn-task
        if machine.motion.rotation().is_none() {
            if let Some(target) = look_rotation(direction) {
                let t = (tuning.turn_damping * delta).min(1.0);
                pose.facing = pose.facing.slerp(target, t);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn app() -> App {
        let mut app = App::new();
        app.init_resource::<Time<Fixed>>()
            .insert_resource(CombatTuning::default())
            .add_systems(FixedUpdate, (advance_motion_tasks, apply_locomotion).chain());
        app
    }

    fn tick(app: &mut App) {
        app.world_mut()
            .resource_mut::<Time<Fixed>>()
            .advance_by(Duration::from_millis(100));
        app.world_mut().run_schedule(FixedUpdate);
    }

    #[test]
    fn test_locomotion_moves_and_sets_state() {
        let mut app = app();
        let entity = app
            .world_mut()
            .spawn((
                CombatStateMachine::new(),
                Pose::default(),
                MoveIntent { direction: Vec3::Z },
                MovementSpeed::fixed(5.0),
            ))
            .id();

        tick(&mut app);

        let pose = app.world().get::<Pose>(entity).unwrap();
        assert!((pose.position.z - 0.5).abs() < 1e-4);
        let machine = app.world().get::<CombatStateMachine>(entity).unwrap();
        assert_eq!(machine.state(), CombatState::Locomotion);
    }

    #[test]
    fn test_block_clamps_movement() {
        let mut app = app();
        let mut machine = CombatStateMachine::new();
        machine.begin_block(0.0).unwrap();
        let entity = app
            .world_mut()
            .spawn((
                machine,
                Pose::default(),
                MoveIntent { direction: Vec3::Z },
                MovementSpeed::fixed(5.0),
            ))
            .id();

        tick(&mut app);

        // 0.4 × 5 m/s × 0.1 s
        let pose = app.world().get::<Pose>(entity).unwrap();
        assert!((pose.position.z - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_default_speed_comes_from_tuning() {
        let mut app = app();
        app.insert_resource(CombatTuning {
            move_speed: 2.0,
            ..Default::default()
        });
        let entity = app
            .world_mut()
            .spawn((
                CombatStateMachine::new(),
                Pose::default(),
                MoveIntent { direction: Vec3::Z },
                MovementSpeed::default(),
            ))
            .id();

        tick(&mut app);

        // 2 m/s × 0.1 s
        let pose = app.world().get::<Pose>(entity).unwrap();
        assert!((pose.position.z - 0.2).abs() < 1e-4);
    }

    #[test]
    fn test_staggered_combatant_does_not_walk() {
        let mut app = app();
        let mut machine = CombatStateMachine::new();
        machine.stagger(false).unwrap();
        let entity = app
            .world_mut()
            .spawn((
                machine,
                Pose::default(),
                MoveIntent { direction: Vec3::X },
                MovementSpeed::default(),
            ))
            .id();

        tick(&mut app);

        assert_eq!(app.world().get::<Pose>(entity).unwrap().position, Vec3::ZERO);
    }
}
