//! Weapon-side components: hit regions and the player loadout.

use bevy::prelude::*;

use crate::combat::attack::Weapon;
use crate::combat::events::HitSide;

/// Сфера оружия в локальных координатах бойца (Y вверх, Z вперёд).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRegion {
    pub offset: Vec3,
    pub radius: f32,
}

impl HitRegion {
    pub const fn new(offset: Vec3, radius: f32) -> Self {
        Self { offset, radius }
    }

    /// World-space center for the given pose.
    pub fn world_center(&self, position: Vec3, facing: Quat) -> Vec3 {
        position + facing * self.offset
    }
}

/// Left / right / front hit regions, activated by `collide.*` events.
///
/// `enabled = false` after death: no further hit detection.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct WeaponColliders {
    pub left: HitRegion,
    pub right: HitRegion,
    pub front: HitRegion,
    pub enabled: bool,
}

impl Default for WeaponColliders {
    fn default() -> Self {
        Self {
            left: HitRegion::new(Vec3::new(-0.6, 1.0, 0.9), 0.6),
            right: HitRegion::new(Vec3::new(0.6, 1.0, 0.9), 0.6),
            front: HitRegion::new(Vec3::new(0.0, 1.0, 1.2), 0.7),
            enabled: true,
        }
    }
}

impl WeaponColliders {
    pub fn region(&self, side: HitSide) -> &HitRegion {
        match side {
            HitSide::Left => &self.left,
            HitSide::Right => &self.right,
            HitSide::Front => &self.front,
        }
    }
}

/// Attack button / weapon slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeaponSlot {
    Primary,
    Secondary,
}

/// Player weapons: two slots, at most one equipped.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Loadout {
    pub primary: Weapon,
    pub secondary: Weapon,
    equipped: Option<WeaponSlot>,
}

impl Loadout {
    pub fn new(primary: Weapon, secondary: Weapon) -> Self {
        Self {
            primary,
            secondary,
            equipped: None,
        }
    }

    pub fn equip(&mut self, slot: WeaponSlot) -> &Weapon {
        self.equipped = Some(slot);
        self.weapon_in(slot)
    }

    /// Taking a damaging hit drops the weapon back to the holster.
    pub fn unequip(&mut self) {
        self.equipped = None;
    }

    pub fn equipped_slot(&self) -> Option<WeaponSlot> {
        self.equipped
    }

    pub fn equipped(&self) -> Option<&Weapon> {
        self.equipped.map(|slot| self.weapon_in(slot))
    }

    pub fn weapon_in(&self, slot: WeaponSlot) -> &Weapon {
        match slot {
            WeaponSlot::Primary => &self.primary,
            WeaponSlot::Secondary => &self.secondary,
        }
    }
}
