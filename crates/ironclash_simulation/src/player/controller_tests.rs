//! Player controller tests (headless app, fixed ticks)

use bevy::prelude::*;

use crate::combat::{
    AnimationCommand, AttackClass, AttackDefinition, AttackEnded, CombatState, CombatStateMachine,
    DamageDealt, FireType, Weapon,
};
use crate::components::{Combatant, Faction, Loadout, MoveIntent, Pose, WeaponSlot};
use crate::player::{ButtonState, Player, PlayerInput};
use crate::{create_headless_app, record_events, recorded_events, run_ticks};

fn sword() -> Weapon {
    Weapon::new("sword", AttackDefinition::melee(1, 20.0), AttackClass::Melee)
}

fn bow() -> Weapon {
    Weapon::new(
        "bow",
        AttackDefinition::ranged(2, 10.0, 20.0),
        AttackClass::Ranged,
    )
}

fn spawn_player(app: &mut App, primary: Weapon) -> Entity {
    app.world_mut()
        .spawn((
            Combatant::new(Faction::Player),
            Player::default(),
            Pose::default(),
            Loadout::new(primary, bow()),
        ))
        .id()
}

fn spawn_dummy(app: &mut App, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((Combatant::new(Faction::Enemy), Pose::at(position)))
        .id()
}

fn set_input(app: &mut App, player: Entity, input: PlayerInput) {
    if let Some(mut current) = app.world_mut().get_mut::<PlayerInput>(player) {
        *current = input;
    }
}

fn press_primary() -> PlayerInput {
    PlayerInput {
        primary: ButtonState::press(),
        ..default()
    }
}

fn state(app: &App, entity: Entity) -> CombatState {
    app.world()
        .get::<CombatStateMachine>(entity)
        .map(|machine| machine.state())
        .unwrap_or(CombatState::Dead)
}

fn pose(app: &App, entity: Entity) -> Pose {
    *app.world().get::<Pose>(entity).unwrap()
}

fn player_app(seed: u64) -> App {
    let mut app = create_headless_app(seed);
    record_events::<AnimationCommand>(&mut app);
    record_events::<AttackEnded>(&mut app);
    app
}

fn attack_commands(app: &App, entity: Entity) -> usize {
    recorded_events::<AnimationCommand>(app)
        .iter()
        .filter(|command| {
            matches!(command, AnimationCommand::PlayAttack { entity: e, .. } if *e == entity)
        })
        .count()
}

#[test]
fn test_press_attacks_then_returns_to_free() {
    let mut app = player_app(1);
    let player = spawn_player(&mut app, sword());

    set_input(&mut app, player, press_primary());
    run_ticks(&mut app, 1);
    set_input(&mut app, player, PlayerInput::default());

    assert_eq!(state(&app, player), CombatState::Attack);
    assert_eq!(
        app.world().get::<Loadout>(player).unwrap().equipped_slot(),
        Some(WeaponSlot::Primary)
    );

    // Клип по умолчанию заканчивается через 0.8s
    run_ticks(&mut app, 60);
    assert!(app.world().get::<CombatStateMachine>(player).unwrap().is_free());
    assert_eq!(attack_commands(&app, player), 1);
}

#[test]
fn test_gap_close_stops_short_of_locked_target() {
    let mut app = player_app(2);
    let player = spawn_player(&mut app, sword());
    spawn_dummy(&mut app, Vec3::new(0.0, 0.0, 3.0));

    set_input(&mut app, player, press_primary());
    run_ticks(&mut app, 1);
    set_input(&mut app, player, PlayerInput::default());
    run_ticks(&mut app, 12);

    // 3.0 − gap_close_min_reach (1.3)
    let position = pose(&app, player).position;
    assert!((position.z - 1.7).abs() < 0.05, "position {:?}", position);
    assert!(position.x.abs() < 1e-4);
}

#[test]
fn test_no_gap_close_within_reach() {
    let mut app = player_app(3);
    let player = spawn_player(&mut app, sword());
    spawn_dummy(&mut app, Vec3::new(0.0, 0.0, 1.8));

    set_input(&mut app, player, press_primary());
    run_ticks(&mut app, 1);
    set_input(&mut app, player, PlayerInput::default());
    run_ticks(&mut app, 12);

    assert!(pose(&app, player).position.length() < 1e-4);
}

#[test]
fn test_unlocked_attack_turns_towards_aim() {
    let mut app = player_app(4);
    let player = spawn_player(&mut app, sword());

    set_input(
        &mut app,
        player,
        PlayerInput {
            aim: Vec3::X * 5.0,
            ..press_primary()
        },
    );
    run_ticks(&mut app, 1);
    set_input(&mut app, player, PlayerInput::default());
    run_ticks(&mut app, 10);

    let forward = pose(&app, player).forward();
    assert!((forward - Vec3::X).length() < 1e-3, "forward {:?}", forward);
}

#[test]
fn test_combo_only_in_continue_window() {
    let mut app = player_app(5);
    let player = spawn_player(&mut app, sword());

    set_input(&mut app, player, press_primary());
    run_ticks(&mut app, 1);
    set_input(&mut app, player, PlayerInput::default());
    run_ticks(&mut app, 5);

    // Swing: ввод теряется
    set_input(&mut app, player, press_primary());
    run_ticks(&mut app, 1);
    set_input(&mut app, player, PlayerInput::default());
    assert_eq!(attack_commands(&app, player), 1);

    // Continue наступает в 0.45s после старта клипа
    run_ticks(&mut app, 23);
    set_input(&mut app, player, press_primary());
    run_ticks(&mut app, 1);
    set_input(&mut app, player, PlayerInput::default());

    assert_eq!(attack_commands(&app, player), 2);
    assert_eq!(state(&app, player), CombatState::Attack);
}

#[test]
fn test_block_hold_and_release() {
    let mut app = player_app(6);
    let player = spawn_player(&mut app, sword());

    set_input(
        &mut app,
        player,
        PlayerInput {
            block_held: true,
            ..default()
        },
    );
    run_ticks(&mut app, 1);

    assert_eq!(state(&app, player), CombatState::Block);
    let machine = app.world().get::<CombatStateMachine>(player).unwrap();
    assert!(machine.block_started_at().is_some());
    // Блок без оружия достаёт primary
    assert_eq!(
        app.world().get::<Loadout>(player).unwrap().equipped_slot(),
        Some(WeaponSlot::Primary)
    );

    set_input(&mut app, player, PlayerInput::default());
    run_ticks(&mut app, 1);
    assert!(app.world().get::<CombatStateMachine>(player).unwrap().is_free());
}

#[test]
fn test_block_move_is_clamped() {
    let mut app = player_app(7);
    let player = spawn_player(&mut app, sword());

    set_input(
        &mut app,
        player,
        PlayerInput {
            block_held: true,
            ..default()
        },
    );
    run_ticks(&mut app, 1);
    set_input(
        &mut app,
        player,
        PlayerInput {
            block_held: true,
            move_axis: Vec3::X,
            ..default()
        },
    );
    run_ticks(&mut app, 60);

    // speed 5 * block_max_move_input 0.4 * 1s
    let position = pose(&app, player).position;
    assert!((position.x - 2.0).abs() < 0.05, "position {:?}", position);
}

#[test]
fn test_charge_release_is_powerful_after_charge_time() {
    let mut app = player_app(8);
    let mut hammer = sword().with_fire_type(FireType::Charge);
    hammer.charge_time = 0.5;
    let player = spawn_player(&mut app, hammer);

    set_input(&mut app, player, press_primary());
    run_ticks(&mut app, 1);
    set_input(
        &mut app,
        player,
        PlayerInput {
            primary: ButtonState::hold(),
            move_axis: Vec3::Z,
            ..default()
        },
    );
    run_ticks(&mut app, 1);

    assert!(app.world().get::<Player>(player).unwrap().is_charging());
    assert!(state(&app, player) != CombatState::Attack);
    // Замедление при зарядке
    let intent = app.world().get::<MoveIntent>(player).unwrap().direction;
    assert!((intent.length() - 0.5).abs() < 1e-4);

    run_ticks(&mut app, 40);
    set_input(&mut app, player, PlayerInput::default());
    run_ticks(&mut app, 1);

    let machine = app.world().get::<CombatStateMachine>(player).unwrap();
    assert_eq!(machine.state(), CombatState::Attack);
    assert!(machine.current_attack().unwrap().is_powerful);
    assert!(!app.world().get::<Player>(player).unwrap().is_charging());
}

#[test]
fn test_short_charge_is_normal_attack() {
    let mut app = player_app(9);
    let player = spawn_player(&mut app, sword().with_fire_type(FireType::Charge));

    set_input(&mut app, player, press_primary());
    run_ticks(&mut app, 1);
    set_input(
        &mut app,
        player,
        PlayerInput {
            primary: ButtonState::hold(),
            ..default()
        },
    );
    run_ticks(&mut app, 5);
    set_input(&mut app, player, PlayerInput::default());
    run_ticks(&mut app, 1);

    let machine = app.world().get::<CombatStateMachine>(player).unwrap();
    assert_eq!(machine.state(), CombatState::Attack);
    assert!(!machine.current_attack().unwrap().is_powerful);
}

#[test]
fn test_repeat_weapon_continues_while_held() {
    let mut app = player_app(10);
    let player = spawn_player(&mut app, sword().with_fire_type(FireType::Repeat));

    set_input(&mut app, player, press_primary());
    run_ticks(&mut app, 1);
    set_input(
        &mut app,
        player,
        PlayerInput {
            primary: ButtonState::hold(),
            ..default()
        },
    );
    run_ticks(&mut app, 40);

    assert!(attack_commands(&app, player) >= 2);
    assert_eq!(state(&app, player), CombatState::Attack);
}

#[test]
fn test_dodge_from_continue_ends_attack_and_rolls() {
    let mut app = player_app(11);
    let player = spawn_player(&mut app, sword());

    set_input(&mut app, player, press_primary());
    run_ticks(&mut app, 1);
    set_input(&mut app, player, PlayerInput::default());
    run_ticks(&mut app, 29);

    set_input(
        &mut app,
        player,
        PlayerInput {
            dodge_pressed: true,
            move_axis: -Vec3::Z,
            ..default()
        },
    );
    run_ticks(&mut app, 1);
    set_input(&mut app, player, PlayerInput::default());

    assert_eq!(state(&app, player), CombatState::Dodge);
    assert!((pose(&app, player).forward() + Vec3::Z).length() < 1e-4);

    let ended: Vec<AttackEnded> = recorded_events(&app);
    assert_eq!(
        ended,
        vec![AttackEnded {
            entity: player,
            completed: true
        }]
    );

    run_ticks(&mut app, 40);
    assert!(app.world().get::<CombatStateMachine>(player).unwrap().is_free());
    assert!(pose(&app, player).position.z < -3.0);
}

#[test]
fn test_dodge_refused_mid_swing() {
    let mut app = player_app(12);
    let player = spawn_player(&mut app, sword());

    set_input(&mut app, player, press_primary());
    run_ticks(&mut app, 1);
    set_input(
        &mut app,
        player,
        PlayerInput {
            dodge_pressed: true,
            ..default()
        },
    );
    run_ticks(&mut app, 1);

    assert_eq!(state(&app, player), CombatState::Attack);
}

#[test]
fn test_damage_unequips_weapon() {
    let mut app = player_app(13);
    let player = spawn_player(&mut app, sword());
    let enemy = spawn_dummy(&mut app, Vec3::new(5.0, 0.0, 5.0));
    app.world_mut()
        .get_mut::<Loadout>(player)
        .unwrap()
        .equip(WeaponSlot::Secondary);

    app.world_mut().send_event(DamageDealt {
        attacker: enemy,
        target: player,
        damage: 5.0,
        is_powerful: false,
    });
    run_ticks(&mut app, 1);

    assert_eq!(
        app.world().get::<Loadout>(player).unwrap().equipped_slot(),
        None
    );
}
