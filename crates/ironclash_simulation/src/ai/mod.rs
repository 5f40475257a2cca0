//! AI module: enemy brains + attack scheduler (dogpile prevention).
//!
//! Мозги врагов только просят право на атаку; когда и кто атакует решает
//! `AttackScheduler` (FIFO очередь на класс + общий cooldown класса).

use bevy::prelude::*;

pub mod brain;
pub mod scheduler;

// Re-export основных типов
pub use brain::{BrainIntent, EnemyBrain};
pub use scheduler::{AttackQueueEntry, AttackScheduler, SchedulerNotice};

use crate::combat::CombatSet;
use crate::config::CombatTuning;

/// AI Plugin
///
/// Регистрирует AI системы в FixedUpdate (CombatSet::Decide).
/// Порядок выполнения:
/// 1. handle_attack_endings: завершение/прерывание атак → scheduler
/// 2. acquire_targets: выбор ближайшей враждебной цели
/// 3. request_attack_slots: вход в очередь
/// 4. run_attack_scheduler: AttemptAttack / GiveUpAttack
/// 5. drive_enemy_brains: подход к цели + commit атаки
///
/// Cleanup: forget_dead_combatants: мёртвые покидают очередь.
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        let scheduler = app
            .world()
            .get_resource::<CombatTuning>()
            .map(AttackScheduler::from_tuning)
            .unwrap_or_default();
        app.insert_resource(scheduler);

        app.add_systems(
            FixedUpdate,
            (
                (
                    brain::handle_attack_endings,
                    brain::acquire_targets,
                    brain::request_attack_slots,
                    brain::run_attack_scheduler,
                    brain::drive_enemy_brains,
                )
                    .chain() // Последовательное выполнение для детерминизма
                    .in_set(CombatSet::Decide),
                brain::forget_dead_combatants.in_set(CombatSet::Cleanup),
            ),
        );
    }
}
