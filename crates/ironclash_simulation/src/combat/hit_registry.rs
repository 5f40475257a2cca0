//! Per-swing hit deduplication.
//!
//! Один взмах оружия бьёт каждую цель максимум один раз, даже если
//! несколько hit-region событий (left/right/front) накрывают её повторно.
//! Очистка: по событиям анимации (start / swing / end), не по таймеру.

use bevy::prelude::*;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HitRegistry {
    struck: Vec<Entity>,
}

impl HitRegistry {
    /// True (and records the target) the first time it is seen this swing.
    pub fn try_register_hit(&mut self, target: Entity) -> bool {
        if self.struck.contains(&target) {
            return false;
        }
        self.struck.push(target);
        true
    }

    pub fn contains(&self, target: Entity) -> bool {
        self.struck.contains(&target)
    }

    pub fn clear(&mut self) {
        self.struck.clear();
    }

    pub fn len(&self) -> usize {
        self.struck.len()
    }

    pub fn is_empty(&self) -> bool {
        self.struck.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_second_hit_same_swing_rejected() {
        let mut registry = HitRegistry::default();
        let target = Entity::from_raw(7);

        assert!(registry.try_register_hit(target));
        assert!(!registry.try_register_hit(target));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_clear_opens_new_swing_window() {
        let mut registry = HitRegistry::default();
        let target = Entity::from_raw(3);

        assert!(registry.try_register_hit(target));
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.try_register_hit(target));
    }

    proptest! {
        /// Each distinct target is accepted exactly once per swing window.
        #[test]
        fn prop_each_target_registered_once(indices in prop::collection::vec(0u32..8, 0..64)) {
            let mut registry = HitRegistry::default();
            let mut accepted = [0usize; 8];

            for index in &indices {
                if registry.try_register_hit(Entity::from_raw(*index)) {
                    accepted[*index as usize] += 1;
                }
            }

            for (index, count) in accepted.iter().enumerate() {
                let seen = indices.contains(&(index as u32));
                prop_assert_eq!(*count, usize::from(seen));
            }
        }
    }
}
