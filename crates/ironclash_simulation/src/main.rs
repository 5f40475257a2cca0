//! Headless симуляция Ironclash
//!
//! Игрок (scripted input) против группы врагов: melee + ranged.
//! Запуск: `IRONCLASH_LOG=info ironclash_simulation [path/to/combat.ron]`

use bevy::prelude::*;
use ironclash_simulation::{
    apply_config, create_headless_app, log_error, log_info, log_warning, run_ticks,
    set_log_level, AttackClass, AttackSet, ButtonState, CombatConfig, CombatStateMachine,
    Combatant, EnemyBrain, Faction, Health, LogLevel, Loadout, Player, PlayerInput, Pose,
    DEFAULT_SEED,
};

const DEFAULT_CONFIG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/config/combat.ron");

fn spawn_enemy(
    app: &mut App,
    config: &CombatConfig,
    set: &str,
    class: AttackClass,
    position: Vec3,
) -> Option<Entity> {
    let attacks: AttackSet = match config.attack_set(set) {
        Ok(attacks) => attacks.clone(),
        Err(err) => {
            log_error(&format!("❌ Config: {}", err));
            return None;
        }
    };

    let entity = app
        .world_mut()
        .spawn((
            Combatant::new(Faction::Enemy),
            Health::new(60.0),
            Pose::at(position),
            EnemyBrain::new(class, attacks),
        ))
        .id();
    Some(entity)
}

fn main() {
    let seed = DEFAULT_SEED;
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());

    let mut app = create_headless_app(seed);
    if let Ok(level) = std::env::var("IRONCLASH_LOG") {
        match level.parse::<LogLevel>() {
            Ok(level) => set_log_level(level),
            Err(err) => log_warning(&format!("⚠️ IRONCLASH_LOG: {}", err)),
        }
    }
    log_info(&format!(
        "Starting Ironclash headless simulation (seed: {}, config: {})",
        seed, config_path
    ));

    let config = match CombatConfig::load(&config_path) {
        Ok(config) => config,
        Err(err) => {
            log_error(&format!("❌ Config: {} → defaults", err));
            CombatConfig::default()
        }
    };
    apply_config(&mut app, &config);

    let (Ok(sword), Ok(crossbow)) = (config.weapon("sword"), config.weapon("crossbow")) else {
        log_error("❌ Config: player needs 'sword' and 'crossbow' weapons");
        return;
    };

    let player = app
        .world_mut()
        .spawn((
            Combatant::new(Faction::Player),
            Player::default(),
            Pose::default(),
            Loadout::new(sword.clone(), crossbow.clone()),
        ))
        .id();

    let enemies: Vec<Entity> = [
        ("grunt", AttackClass::Melee, Vec3::new(4.0, 0.0, 4.0)),
        ("grunt", AttackClass::Melee, Vec3::new(-4.0, 0.0, 4.0)),
        ("grunt", AttackClass::Melee, Vec3::new(0.0, 0.0, 6.0)),
        ("archer", AttackClass::Ranged, Vec3::new(0.0, 0.0, -9.0)),
    ]
    .into_iter()
    .filter_map(|(set, class, position)| spawn_enemy(&mut app, &config, set, class, position))
    .collect();

    // 10 секунд: игрок машет мечом раз в секунду, между ударами блок
    for second in 0..10 {
        if let Some(mut input) = app.world_mut().get_mut::<PlayerInput>(player) {
            *input = PlayerInput {
                aim: Vec3::Z,
                primary: ButtonState::press(),
                ..default()
            };
        }
        run_ticks(&mut app, 1);

        if let Some(mut input) = app.world_mut().get_mut::<PlayerInput>(player) {
            *input = PlayerInput {
                block_held: second % 2 == 1,
                ..default()
            };
        }
        run_ticks(&mut app, 59);

        let world = app.world();
        let alive = enemies
            .iter()
            .filter(|enemy| world.get::<Health>(**enemy).is_some_and(|h| h.is_alive()))
            .count();
        let player_health = world.get::<Health>(player).map_or(0.0, |h| h.current);
        let player_state = world
            .get::<CombatStateMachine>(player)
            .map(|machine| format!("{:?}", machine.state()))
            .unwrap_or_default();

        log_info(&format!(
            "t={}s: player hp {:.0} ({}), enemies alive {}/{}",
            second + 1,
            player_health,
            player_state,
            alive,
            enemies.len()
        ));
    }

    log_info("Simulation complete!");
}
