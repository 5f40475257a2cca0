//! Player control: marker + raw input + controller systems.
//!
//! Отмечает entity которым управляет игрок через input (в отличие от AI).
//! Движок (или тест) пишет `PlayerInput` каждый тик; контроллер переводит его
//! в переходы `CombatStateMachine`.

use bevy::prelude::*;

pub mod controller;
pub mod lock_on;

pub use controller::{drive_player, unequip_on_damage};
pub use lock_on::{cast_direction, find_lock_direction};

use crate::combat::CombatSet;
use crate::components::WeaponSlot;

/// Charge in progress (FireType::Charge weapon held down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Charge {
    pub slot: WeaponSlot,
    pub held_for: f32,
}

/// Player-controlled combatant + controller state.
///
/// # Архитектурная заметка
/// - AI systems работают через `EnemyBrain` (у игрока его нет)
/// - Input systems используют `With<Player>` filter
///
/// Для атак нужен `Loadout`: игрок без него не управляется.
#[derive(Component, Debug, Clone, Default)]
#[require(PlayerInput)]
pub struct Player {
    pub charge: Option<Charge>,
    /// Slot whose button started the current combo
    pub combo_slot: Option<WeaponSlot>,
}

impl Player {
    pub fn is_charging(&self) -> bool {
        self.charge.is_some()
    }
}

/// One attack button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonState {
    /// Went down this tick
    pub pressed: bool,
    pub held: bool,
}

impl ButtonState {
    pub fn press() -> Self {
        Self {
            pressed: true,
            held: true,
        }
    }

    pub fn hold() -> Self {
        Self {
            pressed: false,
            held: true,
        }
    }
}

/// Raw input for one tick (world space, camera conversion done by the engine).
#[derive(Component, Debug, Clone, Default)]
pub struct PlayerInput {
    /// Move direction on XZ, length ≤ 1
    pub move_axis: Vec3,
    /// Direction towards the cursor (zero → use facing)
    pub aim: Vec3,
    pub primary: ButtonState,
    pub secondary: ButtonState,
    pub block_held: bool,
    pub dodge_pressed: bool,
}

impl PlayerInput {
    pub fn button(&self, slot: WeaponSlot) -> ButtonState {
        match slot {
            WeaponSlot::Primary => self.primary,
            WeaponSlot::Secondary => self.secondary,
        }
    }

    /// Edge flags live for one tick.
    pub fn clear_edges(&mut self) {
        self.primary.pressed = false;
        self.secondary.pressed = false;
        self.dodge_pressed = false;
    }
}

/// Player Plugin
///
/// Decide: drive_player (после AI мозгов, фиксированный порядок событий).
/// Cleanup: unequip_on_damage.
pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            (
                drive_player
                    .in_set(CombatSet::Decide)
                    .after(crate::ai::brain::drive_enemy_brains),
                unequip_on_damage.in_set(CombatSet::Cleanup),
            ),
        );
    }
}

#[cfg(test)]
mod controller_tests;
