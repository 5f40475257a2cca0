//! AttackScheduler: очередь атак AI (dogpile prevention).
//!
//! Каждый класс атакующих (melee / ranged) имеет свою FIFO очередь и общий
//! cooldown. За тик класс выдаёт максимум одно разрешение (`AttemptAttack`):
//! голова очереди получает окно `attempt_time`, чтобы дойти до цели и начать
//! атаку. Не успел → `GiveUpAttack`, нужно встать в очередь заново.
//!
//! Бойцы не трогают очередь напрямую: только enter_queue / commit / complete /
//! release / give_up / remove. Все вызовы идемпотентны.

use std::collections::{BTreeMap, VecDeque};

use bevy::prelude::*;

use crate::combat::AttackClass;
use crate::config::CombatTuning;

/// `(combatant, enqueue_time)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackQueueEntry {
    pub combatant: Entity,
    pub enqueue_time: f32,
}

/// Scheduler → combatant decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerNotice {
    /// Granted: reach range and commit within the attempt window
    AttemptAttack { combatant: Entity, class: AttackClass },
    /// Attempt window expired without a commit
    GiveUpAttack { combatant: Entity, class: AttackClass },
}

impl SchedulerNotice {
    pub fn combatant(&self) -> Entity {
        match self {
            SchedulerNotice::AttemptAttack { combatant, .. }
            | SchedulerNotice::GiveUpAttack { combatant, .. } => *combatant,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Attempt {
    combatant: Entity,
    deadline: f32,
}

#[derive(Debug, Clone, Default)]
struct ClassQueue {
    waiting: VecDeque<AttackQueueEntry>,
    /// Granted, not yet committed
    attempts: Vec<Attempt>,
    /// Committed, attack in progress
    attacking: Vec<Entity>,
    next_grant_at: f32,
    last_granted: Option<Entity>,
}

impl ClassQueue {
    fn contains(&self, combatant: Entity) -> bool {
        self.waiting.iter().any(|e| e.combatant == combatant)
            || self.attempts.iter().any(|a| a.combatant == combatant)
            || self.attacking.contains(&combatant)
    }

    fn forget(&mut self, combatant: Entity) {
        self.waiting.retain(|e| e.combatant != combatant);
        self.attempts.retain(|a| a.combatant != combatant);
        self.attacking.retain(|e| *e != combatant);
    }
}

/// Resource: cross-combatant fairness queue (single owner of queue state).
#[derive(Resource, Debug, Clone)]
pub struct AttackScheduler {
    queues: BTreeMap<AttackClass, ClassQueue>,
    /// Class-wide cooldown between grants (seconds)
    pub cooldown: f32,
    /// Attempt window of a grant (seconds)
    pub attempt_time: f32,
}

impl Default for AttackScheduler {
    fn default() -> Self {
        Self::from_tuning(&CombatTuning::default())
    }
}

impl AttackScheduler {
    pub fn new(cooldown: f32, attempt_time: f32) -> Self {
        Self {
            queues: BTreeMap::new(),
            cooldown,
            attempt_time,
        }
    }

    pub fn from_tuning(tuning: &CombatTuning) -> Self {
        Self::new(tuning.repeat_attack_cooldown, tuning.attempt_attack_time)
    }

    /// `EnterQueue`: false (no-op) if the combatant is already queued,
    /// granted or attacking in any class.
    pub fn enter_queue(&mut self, combatant: Entity, class: AttackClass, now: f32) -> bool {
        if self.queues.values().any(|queue| queue.contains(combatant)) {
            return false;
        }
        self.queues
            .entry(class)
            .or_default()
            .waiting
            .push_back(AttackQueueEntry {
                combatant,
                enqueue_time: now,
            });
        true
    }

    pub fn is_queued(&self, combatant: Entity) -> bool {
        self.queues
            .values()
            .any(|queue| queue.waiting.iter().any(|e| e.combatant == combatant))
    }

    pub fn is_attempting(&self, combatant: Entity) -> bool {
        self.queues
            .values()
            .any(|queue| queue.attempts.iter().any(|a| a.combatant == combatant))
    }

    pub fn queue_len(&self, class: AttackClass) -> usize {
        self.queues.get(&class).map_or(0, |queue| queue.waiting.len())
    }

    pub fn waiting(&self, class: AttackClass) -> impl Iterator<Item = &AttackQueueEntry> {
        self.queues
            .get(&class)
            .into_iter()
            .flat_map(|queue| queue.waiting.iter())
    }

    pub fn last_granted(&self, class: AttackClass) -> Option<Entity> {
        self.queues.get(&class).and_then(|queue| queue.last_granted)
    }

    /// Scheduler pass: forfeit expired attempts, then grant at most one
    /// attack per class whose cooldown has elapsed.
    pub fn tick(&mut self, now: f32) -> Vec<SchedulerNotice> {
        let mut notices = Vec::new();

        for (class, queue) in self.queues.iter_mut() {
            let (expired, live): (Vec<Attempt>, Vec<Attempt>) = queue
                .attempts
                .drain(..)
                .partition(|attempt| attempt.deadline <= now);
            queue.attempts = live;
            notices.extend(expired.into_iter().map(|attempt| SchedulerNotice::GiveUpAttack {
                combatant: attempt.combatant,
                class: *class,
            }));

            if now < queue.next_grant_at {
                continue;
            }
            let Some(entry) = queue.waiting.pop_front() else {
                continue;
            };

            queue.attempts.push(Attempt {
                combatant: entry.combatant,
                deadline: now + self.attempt_time,
            });
            queue.next_grant_at = now + self.cooldown;
            queue.last_granted = Some(entry.combatant);
            notices.push(SchedulerNotice::AttemptAttack {
                combatant: entry.combatant,
                class: *class,
            });
        }

        notices
    }

    /// Granted combatant started its attack.
    pub fn commit(&mut self, combatant: Entity) -> bool {
        for queue in self.queues.values_mut() {
            if let Some(index) = queue.attempts.iter().position(|a| a.combatant == combatant) {
                queue.attempts.remove(index);
                queue.attacking.push(combatant);
                return true;
            }
        }
        false
    }

    /// Voluntary forfeit of a grant (target lost, stunned ...).
    pub fn give_up(&mut self, combatant: Entity) -> bool {
        for queue in self.queues.values_mut() {
            let before = queue.attempts.len();
            queue.attempts.retain(|a| a.combatant != combatant);
            if queue.attempts.len() != before {
                return true;
            }
        }
        false
    }

    /// Attack finished normally: class cooldown restarts from `now`.
    pub fn complete(&mut self, combatant: Entity, now: f32) -> bool {
        for queue in self.queues.values_mut() {
            if let Some(index) = queue.attacking.iter().position(|e| *e == combatant) {
                queue.attacking.remove(index);
                queue.next_grant_at = queue.next_grant_at.max(now + self.cooldown);
                return true;
            }
        }
        false
    }

    /// Attack interrupted (stagger / parry): slot freed, cooldown untouched.
    pub fn release(&mut self, combatant: Entity) -> bool {
        for queue in self.queues.values_mut() {
            if let Some(index) = queue.attacking.iter().position(|e| *e == combatant) {
                queue.attacking.remove(index);
                return true;
            }
        }
        false
    }

    /// Death / reset: drop every trace of the combatant.
    pub fn remove(&mut self, combatant: Entity) {
        for queue in self.queues.values_mut() {
            queue.forget(combatant);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(index: u32) -> Entity {
        Entity::from_raw(index)
    }

    #[test]
    fn test_enter_queue_is_idempotent() {
        let mut scheduler = AttackScheduler::new(1.0, 3.0);
        assert!(scheduler.enter_queue(entity(1), AttackClass::Melee, 0.0));
        assert!(!scheduler.enter_queue(entity(1), AttackClass::Melee, 0.5));
        assert!(!scheduler.enter_queue(entity(1), AttackClass::Ranged, 0.5));
        assert_eq!(scheduler.queue_len(AttackClass::Melee), 1);
    }

    #[test]
    fn test_grants_in_fifo_order_spaced_by_cooldown() {
        let mut scheduler = AttackScheduler::new(1.0, 3.0);
        for index in 1..=3 {
            scheduler.enter_queue(entity(index), AttackClass::Melee, 0.0);
        }

        let mut grants = Vec::new();
        let mut now = 0.0;
        while now < 5.0 {
            for notice in scheduler.tick(now) {
                if let SchedulerNotice::AttemptAttack { combatant, .. } = notice {
                    grants.push((combatant, now));
                    scheduler.commit(combatant);
                }
            }
            now += 0.25;
        }

        let order: Vec<Entity> = grants.iter().map(|(e, _)| *e).collect();
        assert_eq!(order, vec![entity(1), entity(2), entity(3)]);
        for pair in grants.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= 1.0);
        }
    }

    #[test]
    fn test_classes_are_scheduled_independently() {
        let mut scheduler = AttackScheduler::new(1.0, 3.0);
        scheduler.enter_queue(entity(1), AttackClass::Melee, 0.0);
        scheduler.enter_queue(entity(2), AttackClass::Ranged, 0.0);

        let notices = scheduler.tick(0.0);
        assert_eq!(notices.len(), 2);
    }

    #[test]
    fn test_attempt_expires_into_give_up() {
        let mut scheduler = AttackScheduler::new(1.0, 3.0);
        scheduler.enter_queue(entity(1), AttackClass::Melee, 0.0);
        scheduler.tick(0.0);
        assert!(scheduler.is_attempting(entity(1)));

        assert!(scheduler.tick(2.9).is_empty());
        let notices = scheduler.tick(3.0);
        assert_eq!(
            notices,
            vec![SchedulerNotice::GiveUpAttack {
                combatant: entity(1),
                class: AttackClass::Melee
            }]
        );
        assert!(!scheduler.is_attempting(entity(1)));
        assert!(scheduler.enter_queue(entity(1), AttackClass::Melee, 3.0));
    }

    #[test]
    fn test_completion_restarts_cooldown() {
        let mut scheduler = AttackScheduler::new(1.0, 3.0);
        scheduler.enter_queue(entity(1), AttackClass::Melee, 0.0);
        scheduler.enter_queue(entity(2), AttackClass::Melee, 0.0);

        scheduler.tick(0.0);
        scheduler.commit(entity(1));
        assert!(scheduler.complete(entity(1), 0.75));

        // Cooldown now runs until 1.75, not 1.0
        assert!(scheduler.tick(1.5).is_empty());
        assert_eq!(scheduler.tick(1.75).len(), 1);
        assert_eq!(scheduler.last_granted(AttackClass::Melee), Some(entity(2)));
    }

    #[test]
    fn test_release_keeps_cooldown() {
        let mut scheduler = AttackScheduler::new(1.0, 3.0);
        scheduler.enter_queue(entity(1), AttackClass::Melee, 0.0);
        scheduler.enter_queue(entity(2), AttackClass::Melee, 0.0);

        scheduler.tick(0.0);
        scheduler.commit(entity(1));
        assert!(scheduler.release(entity(1)));
        assert!(!scheduler.complete(entity(1), 0.5));

        assert_eq!(scheduler.tick(1.0).len(), 1);
    }

    #[test]
    fn test_removed_combatant_is_skipped() {
        let mut scheduler = AttackScheduler::new(1.0, 3.0);
        scheduler.enter_queue(entity(1), AttackClass::Melee, 0.0);
        scheduler.enter_queue(entity(2), AttackClass::Melee, 0.0);
        scheduler.remove(entity(1));

        let notices = scheduler.tick(0.0);
        assert_eq!(notices[0].combatant(), entity(2));
        assert_eq!(scheduler.waiting(AttackClass::Melee).count(), 0);
    }
}
