//! Базовые компоненты бойцов: Combatant, Health, Pose, MoveIntent

use bevy::prelude::*;

use crate::combat::CombatStateMachine;
use crate::config::CombatTuning;
use crate::physics::CombatLayers;

use super::weapon::WeaponColliders;

/// Фракция бойца (player side vs enemy side)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum Faction {
    Player,
    Enemy,
}

impl Faction {
    /// Physics layer this faction's hurtboxes live on.
    pub fn layer(&self) -> CombatLayers {
        match self {
            Faction::Player => CombatLayers::PLAYER,
            Faction::Enemy => CombatLayers::ENEMY,
        }
    }

    /// Layers an attacker of this faction targets (allies excluded).
    pub fn hostile_layers(&self) -> CombatLayers {
        match self {
            Faction::Player => CombatLayers::ENEMY,
            Faction::Enemy => CombatLayers::PLAYER,
        }
    }
}

/// Боец: всё, что можно ударить и что может ударить.
///
/// Required Components подтягивают Health, Pose, MoveIntent, MovementSpeed,
/// CombatStateMachine, WeaponColliders.
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
#[require(Health, Pose, MoveIntent, MovementSpeed, CombatStateMachine, WeaponColliders)]
pub struct Combatant {
    pub faction: Faction,
    /// "Big" combatants shrug off non-powerful hits (no stagger).
    pub is_big: bool,
    /// Hurtbox radius for spatial queries (metres)
    pub body_radius: f32,
}

impl Combatant {
    pub fn new(faction: Faction) -> Self {
        Self {
            faction,
            is_big: false,
            body_radius: 0.5,
        }
    }

    pub fn big(mut self) -> Self {
        self.is_big = true;
        self
    }
}

/// Здоровье бойца
///
/// Инварианты:
/// - 0 ≤ current ≤ max
/// - `is_dead` монотонен (false → true, обратно никогда)
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
    is_dead: bool,
}

/// What a single `take_damage` call did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageReport {
    /// Health actually removed (after clamping at 0)
    pub applied: f32,
    /// True only for the call that killed the combatant
    pub died: bool,
}

impl DamageReport {
    pub const NONE: DamageReport = DamageReport {
        applied: 0.0,
        died: false,
    };
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            is_dead: false,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }

    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    /// Снимает HP. No-op для мёртвых, clamp на 0, `die()` ровно один раз.
    pub fn take_damage(&mut self, amount: f32) -> DamageReport {
        if self.is_dead || !amount.is_finite() || amount <= 0.0 {
            return DamageReport::NONE;
        }

        let before = self.current;
        self.current = (self.current - amount).max(0.0);

        let died = self.current <= 0.0 && self.die();

        DamageReport {
            applied: before - self.current,
            died,
        }
    }

    /// Returns true on the first call only.
    pub fn die(&mut self) -> bool {
        if self.is_dead {
            return false;
        }
        self.is_dead = true;
        self.current = 0.0;
        true
    }
}

/// Позиция + поворот бойца (simulation-side transform)
///
/// Forward = `facing * Vec3::Z`, Y: вверх.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub facing: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            facing: Quat::IDENTITY,
        }
    }
}

impl Pose {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..default()
        }
    }

    pub fn facing_towards(mut self, direction: Vec3) -> Self {
        if let Some(rotation) = look_rotation(direction) {
            self.facing = rotation;
        }
        self
    }

    pub fn forward(&self) -> Vec3 {
        self.facing * Vec3::Z
    }

    /// Flattened (Y = 0) direction from us towards `point`.
    pub fn flat_direction_to(&self, point: Vec3) -> Vec3 {
        let mut direction = point - self.position;
        direction.y = 0.0;
        direction
    }
}

/// Rotation that looks along the flattened `direction` (Y up).
///
/// None для нулевого направления: поворачиваться некуда.
pub fn look_rotation(direction: Vec3) -> Option<Quat> {
    let flat = Vec3::new(direction.x, 0.0, direction.z);
    if flat.length_squared() < 1e-6 {
        return None;
    }
    Some(Quat::from_rotation_y(flat.x.atan2(flat.z)))
}

/// Желаемое направление движения на этот тик (world XZ, длина ≤ 1)
///
/// Пишут: player controller (stick input), AI brain (approach).
/// Читает: `apply_locomotion`.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct MoveIntent {
    pub direction: Vec3,
}

/// Скорость ходьбы (метры/сек). Без override берётся `CombatTuning::move_speed`.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct MovementSpeed {
    pub speed: Option<f32>,
}

impl MovementSpeed {
    /// Per-combatant override (тяжёлые / обездвиженные бойцы).
    pub fn fixed(speed: f32) -> Self {
        Self { speed: Some(speed) }
    }

    pub fn resolve(&self, tuning: &CombatTuning) -> f32 {
        self.speed.unwrap_or(tuning.move_speed)
    }
}
