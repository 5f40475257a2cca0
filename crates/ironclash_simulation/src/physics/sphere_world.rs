//! Headless `SpatialQuery`: every living combatant is one sphere.
//!
//! Пересобирается каждый тик из Pose + Combatant (`sync_sphere_world`).
//! Мёртвые не попадают в мир: хитбоксы отключаются при смерти.

use bevy::prelude::*;

use super::{CombatLayers, CombatPhysics, RayHit, SpatialQuery};
use crate::components::{Combatant, Health, Pose};

/// Hurtbox centre height above the pose origin (chest).
pub const BODY_CENTER_HEIGHT: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereBody {
    pub entity: Entity,
    pub center: Vec3,
    pub radius: f32,
    pub layers: CombatLayers,
}

#[derive(Debug, Clone, Default)]
pub struct SphereWorld {
    bodies: Vec<SphereBody>,
}

impl SphereWorld {
    pub fn new(bodies: Vec<SphereBody>) -> Self {
        Self { bodies }
    }

    pub fn bodies(&self) -> &[SphereBody] {
        &self.bodies
    }
}

impl SpatialQuery for SphereWorld {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        layers: CombatLayers,
    ) -> Option<RayHit> {
        let direction = direction.try_normalize()?;
        let mut nearest: Option<RayHit> = None;

        for body in self.bodies.iter().filter(|b| b.layers.intersects(layers)) {
            // Ray–sphere: |o + t·d − c|² = r²
            let to_origin = origin - body.center;
            let b = to_origin.dot(direction);
            let c = to_origin.length_squared() - body.radius * body.radius;
            let discriminant = b * b - c;
            if discriminant < 0.0 {
                continue;
            }

            let sqrt_d = discriminant.sqrt();
            let mut t = -b - sqrt_d;
            if t < 0.0 {
                // Origin inside the sphere
                t = -b + sqrt_d;
            }
            if t < 0.0 || t > max_distance {
                continue;
            }

            if nearest.map_or(true, |hit| t < hit.distance) {
                nearest = Some(RayHit {
                    entity: body.entity,
                    point: origin + direction * t,
                    distance: t,
                });
            }
        }

        nearest
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, layers: CombatLayers) -> Vec<Entity> {
        self.bodies
            .iter()
            .filter(|b| b.layers.intersects(layers))
            .filter(|b| b.center.distance(center) <= b.radius + radius)
            .map(|b| b.entity)
            .collect()
    }
}

/// System: rebuild the headless sphere world from living combatants.
pub fn sync_sphere_world(
    combatants: Query<(Entity, &Combatant, &Pose, &Health)>,
    mut physics: ResMut<CombatPhysics>,
) {
    let mut bodies: Vec<SphereBody> = combatants
        .iter()
        .filter(|(_, _, _, health)| health.is_alive())
        .map(|(entity, combatant, pose, _)| SphereBody {
            entity,
            center: pose.position + Vec3::Y * BODY_CENTER_HEIGHT,
            radius: combatant.body_radius,
            layers: combatant.faction.layer(),
        })
        .collect();

    // Стабильный порядок overlap результатов → детерминизм
    bodies.sort_by_key(|body| body.entity.index());

    *physics = CombatPhysics::new(SphereWorld::new(bodies));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(index: u32, center: Vec3, layers: CombatLayers) -> SphereBody {
        SphereBody {
            entity: Entity::from_raw(index),
            center,
            radius: 0.5,
            layers,
        }
    }

    #[test]
    fn test_raycast_returns_nearest_on_layer() {
        let world = SphereWorld::new(vec![
            body(1, Vec3::new(0.0, 0.0, 3.0), CombatLayers::ENEMY),
            body(2, Vec3::new(0.0, 0.0, 2.0), CombatLayers::ENEMY),
            body(3, Vec3::new(0.0, 0.0, 1.0), CombatLayers::PLAYER),
        ]);

        let hit = world
            .raycast(Vec3::ZERO, Vec3::Z, 10.0, CombatLayers::ENEMY)
            .expect("ray should hit");
        assert_eq!(hit.entity, Entity::from_raw(2));
        assert!((hit.distance - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_raycast_respects_max_distance() {
        let world = SphereWorld::new(vec![body(1, Vec3::new(0.0, 0.0, 5.0), CombatLayers::ENEMY)]);
        assert!(world
            .raycast(Vec3::ZERO, Vec3::Z, 3.5, CombatLayers::ENEMY)
            .is_none());
    }

    #[test]
    fn test_raycast_misses_off_axis() {
        let world = SphereWorld::new(vec![body(1, Vec3::new(2.0, 0.0, 2.0), CombatLayers::ENEMY)]);
        assert!(world
            .raycast(Vec3::ZERO, Vec3::Z, 10.0, CombatLayers::ENEMY)
            .is_none());
    }

    #[test]
    fn test_overlap_sphere_filters_layers() {
        let world = SphereWorld::new(vec![
            body(1, Vec3::new(0.0, 0.0, 1.0), CombatLayers::ENEMY),
            body(2, Vec3::new(0.0, 0.0, 1.0), CombatLayers::PLAYER),
            body(3, Vec3::new(0.0, 0.0, 5.0), CombatLayers::ENEMY),
        ]);

        let hits = world.overlap_sphere(Vec3::ZERO, 0.6, CombatLayers::ENEMY);
        assert_eq!(hits, vec![Entity::from_raw(1)]);
    }
}
