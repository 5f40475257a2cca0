//! Combat module: state machine, hit resolution, projectiles.
//!
//! ECS ответственность:
//! - Combat state: CombatStateMachine (Idle/Locomotion/Attack/Stagger/Block/Dodge/Dead)
//! - Combat rules: GetHit decision table (parry / block / stagger / toughness)
//! - Events: AnimationCommand, CombatCue, DamageDealt, EntityDied, AttackEnded
//!
//! Движок ответственность (граница):
//! - AnimationEvent: phase callbacks из клипов (start / swing / continue / end / collide.* / projectile)
//! - SpatialQuery: raycast / overlap (ресурс `CombatPhysics`)

use bevy::prelude::*;

pub mod attack;
pub mod events;
pub mod hit;
pub mod hit_registry;
pub mod motion;
pub mod projectile;
pub mod state;
pub mod systems;


// Re-export основных типов
pub use attack::{AttackClass, AttackDefinition, AttackSet, FireType, Weapon, WeightedAttack};
pub use events::{
    AnimationCommand, AnimationEvent, AnimationEventKind, AnimationEventParseError, AttackEnded,
    AttackPhaseEvent, CombatCue, DamageDealt, EntityDied, HitSide, Parried,
};
pub use hit::{apply_parried, resolve_hit, Defender, HitOutcome, HitSource, IncomingHit};
pub use hit_registry::HitRegistry;
pub use motion::{MotionKind, MotionTask, MotionTasks};
pub use projectile::Projectile;
pub use state::{AttackPhase, AttackRejected, CombatState, CombatStateMachine};

use crate::config::CombatTuning;
use crate::physics::CombatPhysics;

/// Порядок фаз одного тика симуляции (FixedUpdate).
///
/// Sense → Decide → Animation → Resolve → Motion → Cleanup
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatSet {
    /// Spatial index refresh (headless: SphereWorld)
    Sense,
    /// Player input / AI decisions / scheduler pass
    Decide,
    /// Clip timeline + animation callbacks (melee hits happen here)
    Animation,
    /// Projectile flight and hits
    Resolve,
    /// Motion tasks and locomotion
    Motion,
    /// Death handling, despawns
    Cleanup,
}

/// Combat Plugin
///
/// Регистрирует события, ресурсы и combat системы в FixedUpdate.
/// Все фазы выполняются последовательно (`.chain()`): никакой параллельной
/// мутации боевого состояния внутри тика.
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<AnimationEvent>()
            .add_event::<AnimationCommand>()
            .add_event::<CombatCue>()
            .add_event::<DamageDealt>()
            .add_event::<EntityDied>()
            .add_event::<AttackEnded>()
            .add_event::<Parried>();

        app.init_resource::<CombatTuning>()
            .init_resource::<CombatPhysics>();

        app.configure_sets(
            FixedUpdate,
            (
                CombatSet::Sense,
                CombatSet::Decide,
                CombatSet::Animation,
                CombatSet::Resolve,
                CombatSet::Motion,
                CombatSet::Cleanup,
            )
                .chain(),
        );

        app.add_systems(
            FixedUpdate,
            (
                systems::process_animation_events.in_set(CombatSet::Animation),
                (
                    systems::advance_projectiles,
                    systems::resolve_projectile_hits,
                )
                    .chain()
                    .in_set(CombatSet::Resolve),
                (systems::advance_motion_tasks, systems::apply_locomotion)
                    .chain()
                    .in_set(CombatSet::Motion),
                (systems::handle_deaths, systems::expire_projectiles)
                    .chain()
                    .in_set(CombatSet::Cleanup),
            ),
        );
    }
}
