//! ECS Components для бойцов
//!
//! Организация по доменам:
//! - actor: боец (Combatant, Faction, Health, Pose, MoveIntent)
//! - weapon: hit regions и loadout игрока (WeaponColliders, Loadout)
//!
//! Боевое состояние (CombatStateMachine) живёт в `combat`, AI мозг в `ai`,
//! ввод игрока в `player`.

pub mod actor;
pub mod weapon;

// Re-exports для удобного импорта
pub use actor::*;
pub use weapon::*;
