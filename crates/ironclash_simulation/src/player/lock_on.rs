//! Attack lock-on: three parallel rays from chest height.

use bevy::prelude::*;

use crate::components::Pose;
use crate::config::CombatTuning;
use crate::physics::{CombatLayers, CombatPhysics, BODY_CENTER_HEIGHT};

/// Aim shorter than this falls back to the current facing.
pub const MIN_AIM_LENGTH: f32 = 0.1;

/// Flattened cast direction: aim if present, else facing.
pub fn cast_direction(pose: &Pose, aim: Vec3) -> Vec3 {
    let flat_aim = Vec3::new(aim.x, 0.0, aim.z);
    if flat_aim.length() > MIN_AIM_LENGTH {
        flat_aim.normalize()
    } else {
        let forward = pose.forward();
        Vec3::new(forward.x, 0.0, forward.z).normalize_or(Vec3::Z)
    }
}

/// Lock direction (target position − own position) or None.
///
/// Rays: center, right, left (offset by `lock_on_cast_radius`); the first
/// ray in that order that hits wins.
pub fn find_lock_direction(
    physics: &CombatPhysics,
    pose: &Pose,
    direction: Vec3,
    layers: CombatLayers,
    target_position: impl Fn(Entity) -> Option<Vec3>,
    tuning: &CombatTuning,
) -> Option<Vec3> {
    let origin = pose.position + Vec3::Y * BODY_CENTER_HEIGHT;
    let right = direction.cross(Vec3::Y).normalize_or_zero() * tuning.lock_on_cast_radius;

    [origin, origin + right, origin - right]
        .into_iter()
        .find_map(|ray_origin| {
            physics.raycast(ray_origin, direction, tuning.lock_on_cast_distance, layers)
        })
        .and_then(|hit| target_position(hit.entity))
        .map(|position| position - pose.position)
}
