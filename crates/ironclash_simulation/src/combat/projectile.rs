//! Projectile component: ballistic attack payload with deflect support.

use bevy::prelude::*;

use crate::combat::attack::AttackDefinition;
use crate::components::{Faction, Pose};

/// Летящий снаряд. Движется по прямой (Y = 0), бьёт максимум одну цель.
#[derive(Component, Debug, Clone, PartialEq)]
#[require(Pose)]
pub struct Projectile {
    pub attack: AttackDefinition,
    pub velocity: Vec3,
    pub spawn_time: f32,
    /// Time-to-live (seconds)
    pub lifetime: f32,
    pub is_deflected: bool,
    /// Outgoing damage (`attack.damage`, or multiplied on deflect)
    pub damage: f32,
    /// Faction of the original shooter
    pub faction: Faction,
    pub shooter: Entity,
    pub deflected_by: Option<Entity>,
    /// Set once the projectile has hit something; despawned next cleanup
    pub spent: bool,
}

impl Projectile {
    /// `Fire`: velocity along the flattened direction at the attack's speed.
    ///
    /// None for non-ranged attacks or a vertical / zero direction.
    pub fn fire(
        shooter: Entity,
        faction: Faction,
        direction: Vec3,
        attack: &AttackDefinition,
        now: f32,
        lifetime: f32,
    ) -> Option<Self> {
        let speed = attack.projectile_speed?;
        let flat = Vec3::new(direction.x, 0.0, direction.z).try_normalize()?;

        Some(Self {
            attack: attack.clone(),
            velocity: flat * speed,
            spawn_time: now,
            lifetime,
            is_deflected: false,
            damage: attack.damage,
            faction,
            shooter,
            deflected_by: None,
            spent: false,
        })
    }

    /// `Deflect`: reversed copy with `multiplier × attack.damage`.
    pub fn deflected(&self, deflector: Entity, multiplier: f32, now: f32) -> Self {
        Self {
            attack: self.attack.clone(),
            velocity: -self.velocity,
            spawn_time: now,
            lifetime: self.lifetime,
            is_deflected: true,
            damage: multiplier * self.attack.damage,
            faction: self.faction,
            shooter: self.shooter,
            deflected_by: Some(deflector),
            spent: false,
        }
    }

    pub fn is_expired(&self, now: f32) -> bool {
        now - self.spawn_time >= self.lifetime
    }

    /// Faction filter. Deflected projectiles hit anyone but the deflector.
    pub fn can_hit(&self, target: Entity, target_faction: Faction) -> bool {
        if self.spent || Some(target) == self.deflected_by {
            return false;
        }
        if self.is_deflected {
            return true;
        }
        target != self.shooter && (target_faction != self.faction || self.attack.can_hit_allies)
    }

    /// Combatant credited with hits: the deflector once deflected.
    pub fn owner(&self) -> Entity {
        self.deflected_by.unwrap_or(self.shooter)
    }

    /// Facing that matches the current velocity.
    pub fn facing(&self) -> Quat {
        crate::components::look_rotation(self.velocity).unwrap_or(Quat::IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bolt() -> AttackDefinition {
        AttackDefinition::ranged(10, 12.0, 15.0)
    }

    #[test]
    fn test_fire_flattens_direction() {
        let shooter = Entity::from_raw(1);
        let projectile =
            Projectile::fire(shooter, Faction::Enemy, Vec3::new(3.0, 4.0, 0.0), &bolt(), 0.0, 20.0)
                .unwrap();

        assert_eq!(projectile.velocity.y, 0.0);
        assert!((projectile.velocity - Vec3::X * 15.0).length() < 1e-4);
        assert_eq!(projectile.damage, 12.0);
    }

    #[test]
    fn test_fire_rejects_melee_attack() {
        let melee = AttackDefinition::melee(1, 5.0);
        assert!(Projectile::fire(Entity::from_raw(1), Faction::Enemy, Vec3::Z, &melee, 0.0, 20.0).is_none());
        assert!(Projectile::fire(Entity::from_raw(1), Faction::Enemy, Vec3::Y, &bolt(), 0.0, 20.0).is_none());
    }

    #[test]
    fn test_fire_then_deflect_round_trip() {
        let k = 2.5;
        let projectile =
            Projectile::fire(Entity::from_raw(1), Faction::Enemy, Vec3::new(0.3, 0.0, -1.0), &bolt(), 0.0, 20.0)
                .unwrap();
        let deflected = projectile.deflected(Entity::from_raw(2), k, 1.0);

        assert_eq!(deflected.damage, k * bolt().damage);
        assert_eq!(deflected.velocity, -projectile.velocity);
        assert!(deflected.is_deflected);
        assert_eq!(deflected.spawn_time, 1.0);
    }

    #[test]
    fn test_faction_filter() {
        let shooter = Entity::from_raw(1);
        let player = Entity::from_raw(2);
        let ally = Entity::from_raw(3);
        let projectile = Projectile::fire(shooter, Faction::Enemy, Vec3::Z, &bolt(), 0.0, 20.0).unwrap();

        assert!(projectile.can_hit(player, Faction::Player));
        assert!(!projectile.can_hit(ally, Faction::Enemy));
        assert!(!projectile.can_hit(shooter, Faction::Enemy));

        let friendly_fire = Projectile {
            attack: bolt().hitting_allies(),
            ..projectile.clone()
        };
        assert!(friendly_fire.can_hit(ally, Faction::Enemy));
    }

    #[test]
    fn test_deflected_projectile_hits_enemies_not_deflector() {
        let shooter = Entity::from_raw(1);
        let player = Entity::from_raw(2);
        let projectile = Projectile::fire(shooter, Faction::Enemy, Vec3::Z, &bolt(), 0.0, 20.0).unwrap();
        let deflected = projectile.deflected(player, 2.0, 0.5);

        assert!(deflected.can_hit(shooter, Faction::Enemy));
        assert!(deflected.can_hit(Entity::from_raw(7), Faction::Enemy));
        assert!(!deflected.can_hit(player, Faction::Player));
        assert_eq!(projectile.owner(), shooter);
        assert_eq!(deflected.owner(), player);
    }

    #[test]
    fn test_lifetime_expiry() {
        let projectile = Projectile::fire(Entity::from_raw(1), Faction::Enemy, Vec3::Z, &bolt(), 2.0, 20.0).unwrap();
        assert!(!projectile.is_expired(21.9));
        assert!(projectile.is_expired(22.0));
    }
}
