//! Spatial query boundary (engine → simulation).
//!
//! Симуляция не владеет физикой. Raycast/overlap делает движок;
//! combat-системы видят только trait `SpatialQuery` через ресурс `CombatPhysics`.
//!
//! Headless реализация: `SphereWorld` (см. `sphere_world.rs`).

use bevy::prelude::*;

pub mod sphere_world;

pub use sphere_world::{sync_sphere_world, SphereBody, SphereWorld, BODY_CENTER_HEIGHT};

/// Combat target layers (bit mask).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect)]
pub struct CombatLayers(pub u32);

impl CombatLayers {
    pub const NONE: CombatLayers = CombatLayers(0);
    pub const PLAYER: CombatLayers = CombatLayers(1 << 0);
    pub const ENEMY: CombatLayers = CombatLayers(1 << 1);
    pub const ALL: CombatLayers = CombatLayers(Self::PLAYER.0 | Self::ENEMY.0);

    pub fn intersects(&self, other: CombatLayers) -> bool {
        self.0 & other.0 != 0
    }

    pub fn union(self, other: CombatLayers) -> CombatLayers {
        CombatLayers(self.0 | other.0)
    }
}

/// Raycast result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: Entity,
    pub point: Vec3,
    pub distance: f32,
}

/// Engine-provided spatial queries against combat hurtboxes.
pub trait SpatialQuery: Send + Sync {
    /// Nearest hurtbox on `layers` along the ray, within `max_distance`.
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        layers: CombatLayers,
    ) -> Option<RayHit>;

    /// Every hurtbox on `layers` overlapping the sphere.
    fn overlap_sphere(&self, center: Vec3, radius: f32, layers: CombatLayers) -> Vec<Entity>;
}

/// Resource: the active spatial query backend.
#[derive(Resource)]
pub struct CombatPhysics(pub Box<dyn SpatialQuery>);

impl CombatPhysics {
    pub fn new(backend: impl SpatialQuery + 'static) -> Self {
        Self(Box::new(backend))
    }

    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        layers: CombatLayers,
    ) -> Option<RayHit> {
        self.0.raycast(origin, direction, max_distance, layers)
    }

    pub fn overlap_sphere(&self, center: Vec3, radius: f32, layers: CombatLayers) -> Vec<Entity> {
        self.0.overlap_sphere(center, radius, layers)
    }
}

impl Default for CombatPhysics {
    fn default() -> Self {
        Self::new(SphereWorld::default())
    }
}
