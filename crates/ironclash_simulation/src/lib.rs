//! Ironclash Simulation Core
//!
//! ECS-симуляция ближнего боя на Bevy 0.16: state machine бойцов, разрешение
//! попаданий (parry / block / stagger), снаряды, очередь атак AI.
//!
//! HYBRID ARCHITECTURE:
//! - ECS = правила боя, состояния, AI, очередь атак
//! - Движок = анимация (AnimationEvent), физика (SpatialQuery), эффекты (CombatCue)
//!
//! Headless режим (`HeadlessEnginePlugin`) заменяет движок: клипы как таблицы
//! времени, физика как сферы бойцов.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub mod ai;
pub mod animation;
pub mod combat;
pub mod components;
pub mod config;
pub mod logger;
pub mod physics;
pub mod player;

// Re-exports
pub use ai::{AIPlugin, AttackScheduler, BrainIntent, EnemyBrain};
pub use animation::{AttackClip, ClipLibrary, ClipPlayer};
pub use combat::{
    AttackClass, AttackDefinition, AttackEnded, AttackPhase, AttackSet, CombatPlugin, CombatSet,
    CombatState, CombatStateMachine, DamageDealt, EntityDied, FireType, Projectile, Weapon,
    WeightedAttack,
};
pub use components::*;
pub use config::{CombatConfig, CombatTuning, ConfigError};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, set_log_level, set_logger, LogLevel,
    LogPrinter,
};
pub use physics::{CombatLayers, CombatPhysics, SpatialQuery};
pub use player::{ButtonState, Player, PlayerInput, PlayerPlugin};

/// Simulation tick rate (FixedUpdate)
pub const TICK_HZ: f64 = 60.0;

/// Seed, если хост не задал свой
pub const DEFAULT_SEED: u64 = 42;

/// Правила боя: combat + AI + player (без движка).
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Time::<Fixed>::from_hz(TICK_HZ))
            .insert_resource(DeterministicRng::new(DEFAULT_SEED))
            .add_plugins((CombatPlugin, AIPlugin, PlayerPlugin));
    }
}

/// Headless замена движка: клипы анимаций + сферическая физика.
///
/// С реальным движком этот plugin не добавляется: движок сам пишет
/// `AnimationEvent` и ставит свой `CombatPhysics`.
pub struct HeadlessEnginePlugin;

impl Plugin for HeadlessEnginePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ClipLibrary>()
            .init_resource::<ClipPlayer>()
            .add_systems(
                FixedUpdate,
                (
                    physics::sync_sphere_world.in_set(CombatSet::Sense),
                    animation::drive_clip_timelines
                        .in_set(CombatSet::Animation)
                        .before(combat::systems::process_animation_events),
                ),
            );
    }
}

/// Seeded RNG: выбор атак AI. Единственный источник случайности в тике.
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(seed);
        Self { rng, seed }
    }
}

/// Headless app: MinimalPlugins + правила + headless движок, RNG на `seed`.
///
/// Время ручное: каждый `app.update()` = ровно один FixedUpdate тик, без
/// wall clock. Буферы событий меняются в `First`, как в обычном приложении.
pub fn create_headless_app(seed: u64) -> App {
    init_logger();

    let mut headless = App::new();
    headless
        .add_plugins((MinimalPlugins, SimulationPlugin, HeadlessEnginePlugin))
        .insert_resource(DeterministicRng::new(seed));

    // Шаг реального времени == fixed timestep → ровно один тик за update
    let timestep = headless.world().resource::<Time<Fixed>>().timestep();
    headless.insert_resource(TimeUpdateStrategy::ManualDuration(timestep));

    // Первый update только запоминает стартовый момент (delta = 0, тика нет)
    headless.update();
    headless
}

/// Run `ticks` simulation ticks (one `app.update()` each).
pub fn run_ticks(app: &mut App, ticks: u32) {
    for _ in 0..ticks {
        app.update();
    }
}

/// Копит события `E` за весь прогон (буфер `Events<E>` живёт два тика).
#[derive(Resource)]
pub struct EventLog<E: Event>(pub Vec<E>);

impl<E: Event> Default for EventLog<E> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

fn append_to_event_log<E: Event + Clone>(
    mut events: EventReader<E>,
    mut log: ResMut<EventLog<E>>,
) {
    log.0.extend(events.read().cloned());
}

/// Начать запись событий `E` в `EventLog<E>` (каждый update, в `Last`).
pub fn record_events<E: Event + Clone>(app: &mut App) {
    if app.world().contains_resource::<EventLog<E>>() {
        return;
    }
    app.init_resource::<EventLog<E>>()
        .add_systems(Last, append_to_event_log::<E>);
}

/// Всё записанное с момента `record_events::<E>`.
pub fn recorded_events<E: Event + Clone>(app: &App) -> Vec<E> {
    app.world()
        .get_resource::<EventLog<E>>()
        .map(|log| log.0.clone())
        .unwrap_or_default()
}

/// Install a loaded config: tuning resource + scheduler rebuilt from it.
pub fn apply_config(app: &mut App, config: &CombatConfig) {
    app.insert_resource(config.tuning.clone())
        .insert_resource(AttackScheduler::from_tuning(&config.tuning));
}

/// Debug-дамп всех `T` в порядке entity index (сравнение прогонов).
pub fn world_snapshot<T: Component + std::fmt::Debug>(world: &mut World) -> Vec<u8> {
    let mut rows: Vec<(u32, String)> = world
        .query::<(Entity, &T)>()
        .iter(world)
        .map(|(entity, component)| (entity.index(), format!("{:?}", component)))
        .collect();
    rows.sort_by_key(|(index, _)| *index);

    rows.into_iter()
        .flat_map(|(index, dump)| {
            index
                .to_le_bytes()
                .into_iter()
                .chain(dump.into_bytes())
        })
        .collect()
}
