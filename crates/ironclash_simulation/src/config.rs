//! Combat configuration: tuning constants, attack sets, weapons.
//!
//! Формат: RON (`config/combat.ron`). Всё валидируется при загрузке:
//! пустой attack set или ranged оружие без projectile_speed: ошибка
//! конфигурации сразу, а не паника посреди боя.

use std::collections::BTreeMap;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::combat::{AttackSet, Weapon};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("attack set is empty")]
    EmptyAttackSet,

    #[error("attack {attack_id} has invalid weight {weight}")]
    InvalidWeight { attack_id: u32, weight: f32 },

    #[error("ranged weapon '{name}' has no projectile speed")]
    MissingProjectileSpeed { name: String },

    #[error("unknown attack set '{0}'")]
    UnknownAttackSet(String),

    #[error("unknown weapon '{0}'")]
    UnknownWeapon(String),

    #[error("failed to parse combat config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("failed to read combat config: {0}")]
    Io(#[from] std::io::Error),
}

/// Tunable combat constants.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Turn-to-target time when committing an attack (seconds)
    pub attack_turn_time: f32,
    /// Free-movement turn damping (per second)
    pub turn_damping: f32,
    pub move_speed: f32,
    /// Movement input clamp while blocking
    pub block_max_move_input: f32,
    /// Forward dodge speed (m/s)
    pub roll_speed: f32,
    pub lock_on_cast_radius: f32,
    pub lock_on_cast_distance: f32,
    /// Block-start window in which a block becomes a parry (seconds)
    pub parry_time: f32,
    pub deflected_projectile_damage_multiplier: f32,
    pub gap_close_max_reach: f32,
    pub gap_close_min_reach: f32,
    /// Duration of the gap-close translation (seconds)
    pub gap_close_time: f32,
    /// Movement multiplier while charging an attack
    pub charge_speed_damper: f32,
    /// Class-wide cooldown between AI attack grants (seconds)
    pub repeat_attack_cooldown: f32,
    /// Window a granted AI has to reach range and commit (seconds)
    pub attempt_attack_time: f32,
    pub projectile_lifetime: f32,
    pub projectile_radius: f32,
    /// Visual lifetime of hit/block/parry effects (seconds)
    pub effect_lifetime: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            attack_turn_time: 0.1,
            turn_damping: 10.0,
            move_speed: 5.0,
            block_max_move_input: 0.4,
            roll_speed: 12.0,
            lock_on_cast_radius: 1.0,
            lock_on_cast_distance: 3.5,
            parry_time: 0.2,
            deflected_projectile_damage_multiplier: 2.0,
            gap_close_max_reach: 2.05,
            gap_close_min_reach: 1.3,
            gap_close_time: 0.15,
            charge_speed_damper: 0.5,
            repeat_attack_cooldown: 1.0,
            attempt_attack_time: 3.0,
            projectile_lifetime: 20.0,
            projectile_radius: 0.25,
            effect_lifetime: 2.0,
        }
    }
}

/// Whole combat config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombatConfig {
    #[serde(default)]
    pub tuning: CombatTuning,
    #[serde(default)]
    pub attack_sets: BTreeMap<String, AttackSet>,
    #[serde(default)]
    pub weapons: BTreeMap<String, Weapon>,
}

impl CombatConfig {
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: CombatConfig = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_ron_str(&source)
    }

    /// Weapons must match their class; attack sets are validated on deserialize.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for weapon in self.weapons.values() {
            weapon.validate()?;
        }
        Ok(())
    }

    pub fn attack_set(&self, name: &str) -> Result<&AttackSet, ConfigError> {
        self.attack_sets
            .get(name)
            .ok_or_else(|| ConfigError::UnknownAttackSet(name.to_string()))
    }

    pub fn weapon(&self, name: &str) -> Result<&Weapon, ConfigError> {
        self.weapons
            .get(name)
            .ok_or_else(|| ConfigError::UnknownWeapon(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::AttackClass;

    const SAMPLE: &str = r#"(
        tuning: (parry_time: 0.25),
        attack_sets: {
            "grunt": [
                (attack: (id: 1, animation_id: 1, damage: 10.0), weight: 0.7),
                (attack: (id: 2, animation_id: 2, damage: 25.0, is_powerful: true), weight: 1.0),
            ],
        },
        weapons: {
            "sword": (
                name: "sword",
                attack: (id: 10, animation_id: 10, damage: 20.0),
                class: Melee,
                fire_type: Charge,
            ),
        },
    )"#;

    #[test]
    fn test_parse_sample_config() {
        let config = CombatConfig::from_ron_str(SAMPLE).unwrap();

        assert_eq!(config.tuning.parry_time, 0.25);
        // Остальные поля: дефолты
        assert_eq!(config.tuning.attack_turn_time, 0.1);

        let grunt = config.attack_set("grunt").unwrap();
        assert_eq!(grunt.entries().len(), 2);
        assert!(grunt.get_by_random_seed(0.9).unwrap().is_powerful);

        let sword = config.weapon("sword").unwrap();
        assert_eq!(sword.class, AttackClass::Melee);
        assert_eq!(sword.charge_time, 1.0);
    }

    #[test]
    fn test_empty_attack_set_fails_at_load() {
        let source = r#"(attack_sets: { "broken": [] })"#;
        let error = CombatConfig::from_ron_str(source).unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
        assert!(error.to_string().contains("attack set is empty"));
    }

    #[test]
    fn test_ranged_weapon_without_speed_fails_at_load() {
        let source = r#"(weapons: {
            "bow": (name: "bow", attack: (id: 3, animation_id: 3, damage: 5.0), class: Ranged),
        })"#;
        assert!(matches!(
            CombatConfig::from_ron_str(source),
            Err(ConfigError::MissingProjectileSpeed { .. })
        ));
    }

    #[test]
    fn test_unknown_names() {
        let config = CombatConfig::default();
        assert!(matches!(
            config.attack_set("nope"),
            Err(ConfigError::UnknownAttackSet(_))
        ));
        assert!(matches!(config.weapon("nope"), Err(ConfigError::UnknownWeapon(_))));
    }
}
