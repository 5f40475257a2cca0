//! Attack data: single attack definitions, weighted attack sets, weapons.
//!
//! Всё здесь: статическая конфигурация: грузится один раз (RON),
//! валидируется на загрузке, дальше только читается.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Immutable description of one attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackDefinition {
    pub id: u32,
    /// Clip the animation driver plays for this attack
    pub animation_id: u32,
    pub damage: f32,
    /// Powerful attacks ignore blocks and stagger "big" combatants
    #[serde(default)]
    pub is_powerful: bool,
    /// Allows hitting combatants of the attacker's own faction
    #[serde(default)]
    pub can_hit_allies: bool,
    #[serde(default)]
    pub hit_effect: Option<String>,
    /// Set for ranged attacks: speed of the released projectile (m/s)
    #[serde(default)]
    pub projectile_speed: Option<f32>,
    #[serde(default)]
    pub sound: Option<String>,
}

impl AttackDefinition {
    pub fn melee(id: u32, damage: f32) -> Self {
        Self {
            id,
            animation_id: id,
            damage,
            is_powerful: false,
            can_hit_allies: false,
            hit_effect: None,
            projectile_speed: None,
            sound: None,
        }
    }

    pub fn ranged(id: u32, damage: f32, projectile_speed: f32) -> Self {
        Self {
            projectile_speed: Some(projectile_speed),
            ..Self::melee(id, damage)
        }
    }

    pub fn powerful(mut self) -> Self {
        self.is_powerful = true;
        self
    }

    pub fn hitting_allies(mut self) -> Self {
        self.can_hit_allies = true;
        self
    }

    pub fn is_ranged(&self) -> bool {
        self.projectile_speed.is_some()
    }
}

/// One roster entry: attack + cumulative selection threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedAttack {
    pub attack: AttackDefinition,
    pub weight: f32,
}

/// Weighted-random attack roster.
///
/// Weights are cumulative thresholds (e.g. `[0.3, 0.7, 1.0]`), kept sorted
/// ascending. Never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<WeightedAttack>", into = "Vec<WeightedAttack>")]
pub struct AttackSet {
    entries: Vec<WeightedAttack>,
}

impl AttackSet {
    /// Validates and sorts the roster.
    pub fn new(mut entries: Vec<WeightedAttack>) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::EmptyAttackSet);
        }

        if let Some(bad) = entries
            .iter()
            .find(|e| !e.weight.is_finite() || e.weight < 0.0)
        {
            return Err(ConfigError::InvalidWeight {
                attack_id: bad.attack.id,
                weight: bad.weight,
            });
        }

        entries.sort_by(|a, b| a.weight.total_cmp(&b.weight));
        Ok(Self { entries })
    }

    /// Single-entry roster (always picks `attack`).
    pub fn single(attack: AttackDefinition) -> Self {
        Self {
            entries: vec![WeightedAttack { attack, weight: 1.0 }],
        }
    }

    pub fn entries(&self) -> &[WeightedAttack] {
        &self.entries
    }

    /// First entry whose cumulative weight ≥ `seed`, else the last one.
    ///
    /// Seed comes from the caller's RNG (`[0, 1)`); seeds past the last
    /// threshold clamp to the last entry.
    pub fn get_by_random_seed(&self, seed: f32) -> Result<&AttackDefinition, ConfigError> {
        self.entries
            .iter()
            .find(|entry| seed <= entry.weight)
            .or_else(|| self.entries.last())
            .map(|entry| &entry.attack)
            .ok_or(ConfigError::EmptyAttackSet)
    }
}

impl TryFrom<Vec<WeightedAttack>> for AttackSet {
    type Error = ConfigError;

    fn try_from(entries: Vec<WeightedAttack>) -> Result<Self, Self::Error> {
        AttackSet::new(entries)
    }
}

impl From<AttackSet> for Vec<WeightedAttack> {
    fn from(set: AttackSet) -> Self {
        set.entries
    }
}

/// Scheduler queue class (melee and ranged attackers take turns separately).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttackClass {
    Melee,
    Ranged,
}

/// How the attack button drives a weapon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FireType {
    /// Press → attack
    #[default]
    Normal,
    /// Hold → charge, release → attack (powerful if held long enough)
    Charge,
    /// Hold → keep continuing the combo
    Repeat,
}

/// Player weapon: one fixed attack + input behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub attack: AttackDefinition,
    pub class: AttackClass,
    #[serde(default)]
    pub fire_type: FireType,
    /// Hold time needed for a powerful charge attack (seconds)
    #[serde(default = "default_charge_time")]
    pub charge_time: f32,
}

fn default_charge_time() -> f32 {
    1.0
}

impl Weapon {
    pub fn new(name: impl Into<String>, attack: AttackDefinition, class: AttackClass) -> Self {
        Self {
            name: name.into(),
            attack,
            class,
            fire_type: FireType::Normal,
            charge_time: default_charge_time(),
        }
    }

    pub fn with_fire_type(mut self, fire_type: FireType) -> Self {
        self.fire_type = fire_type;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.class == AttackClass::Ranged && !self.attack.is_ranged() {
            return Err(ConfigError::MissingProjectileSpeed {
                name: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Attack actually committed, given how long the button was held.
    pub fn attack_for_charge(&self, held_for: f32) -> AttackDefinition {
        let mut attack = self.attack.clone();
        if self.fire_type == FireType::Charge && held_for > self.charge_time {
            attack.is_powerful = true;
        }
        attack
    }
}
