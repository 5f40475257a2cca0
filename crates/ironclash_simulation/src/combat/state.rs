//! Per-combatant combat state machine.
//!
//! # States
//!
//! ```text
//! Idle ⇄ Locomotion ──commit──▶ Attack ──End──▶ Locomotion
//!    │        │                   │  ▲
//!    │        │                   └──┘ re-trigger (only in Continue)
//!    │        ├──hold──▶ Block ──release──▶ Locomotion
//!    └────────┴── GetHit ──▶ Stagger ──clip end──▶ Locomotion
//! any non-Dead ── dodge ──▶ Dodge ──clip end──▶ Locomotion
//! any ── death ──▶ Dead (absorbing)
//! ```
//!
//! Every mutating method re-checks the current state first, so a callback
//! that arrives after an interrupt (stale animation event, late hit-region
//! activation) is a no-op.

use bevy::prelude::*;

use crate::combat::attack::AttackDefinition;
use crate::combat::hit_registry::HitRegistry;
use crate::combat::motion::MotionTasks;

/// High-level combat state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombatState {
    #[default]
    Idle,
    Locomotion,
    Attack,
    Stagger {
        big_hit: bool,
    },
    Block,
    Dodge,
    Dead,
}

/// Attack sub-phase, driven by animation events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttackPhase {
    /// Hit window: hit regions may activate, combo input is dropped
    #[default]
    Swing,
    /// Combo window: a new attack may re-trigger
    Continue,
    /// Attack over
    End,
}

/// Why `start_attack` refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackRejected {
    /// Mid-swing: the new attack is dropped (no input buffering)
    MidSwing,
    /// Not in a state that can attack (stagger, block, dodge, dead)
    Busy(CombatState),
}

/// Combat state component.
#[derive(Component, Debug, Clone, Default)]
pub struct CombatStateMachine {
    state: CombatState,
    phase: AttackPhase,
    current_attack: Option<AttackDefinition>,
    hits: HitRegistry,
    block_started_at: Option<f32>,
    /// Earliest time this combatant may start another AI attack
    pub next_attack_allowed_at: f32,
    pub motion: MotionTasks,
}

impl CombatStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CombatState {
        self.state
    }

    pub fn phase(&self) -> AttackPhase {
        self.phase
    }

    pub fn current_attack(&self) -> Option<&AttackDefinition> {
        self.current_attack.as_ref()
    }

    pub fn hits(&self) -> &HitRegistry {
        &self.hits
    }

    pub fn block_started_at(&self) -> Option<f32> {
        self.block_started_at
    }

    pub fn is_dead(&self) -> bool {
        self.state == CombatState::Dead
    }

    pub fn is_attacking(&self) -> bool {
        self.state == CombatState::Attack && self.current_attack.is_some()
    }

    /// Swing window of the current attack is open (hit detection allowed).
    pub fn is_swinging(&self) -> bool {
        self.is_attacking() && self.phase == AttackPhase::Swing
    }

    pub fn is_mid_powerful_attack(&self) -> bool {
        self.is_attacking()
            && self
                .current_attack
                .as_ref()
                .is_some_and(|attack| attack.is_powerful)
    }

    /// Free to act: Idle or Locomotion.
    pub fn is_free(&self) -> bool {
        matches!(self.state, CombatState::Idle | CombatState::Locomotion)
    }

    pub fn can_start_attack(&self) -> bool {
        self.is_free() || (self.is_attacking() && self.phase == AttackPhase::Continue)
    }

    /// Block hit at `now` lands inside the parry window.
    pub fn in_parry_window(&self, now: f32, parry_time: f32) -> bool {
        self.state == CombatState::Block
            && self
                .block_started_at
                .is_some_and(|started| now - started < parry_time)
    }

    /// Idle ⇄ Locomotion from movement input.
    pub fn set_moving(&mut self, moving: bool) {
        if self.is_free() {
            self.state = if moving {
                CombatState::Locomotion
            } else {
                CombatState::Idle
            };
        }
    }

    /// Commit to an attack (fresh or combo continue).
    ///
    /// Entry resets the hit registry and cancels previous motion tasks;
    /// turn/gap-close tasks are started by the caller afterwards.
    pub fn start_attack(&mut self, attack: AttackDefinition) -> Result<(), AttackRejected> {
        if !self.can_start_attack() {
            return Err(if self.is_attacking() && self.phase == AttackPhase::Swing {
                AttackRejected::MidSwing
            } else {
                AttackRejected::Busy(self.state)
            });
        }

        self.motion.cancel_all();
        self.hits.clear();
        self.block_started_at = None;
        self.current_attack = Some(attack);
        self.phase = AttackPhase::Swing;
        self.state = CombatState::Attack;
        Ok(())
    }

    /// `start` animation event: a new swing begins.
    pub fn on_attack_start(&mut self) -> bool {
        if !self.is_attacking() {
            return false;
        }
        self.hits.clear();
        self.phase = AttackPhase::Swing;
        true
    }

    /// Phase event. Returns the finished attack on `End`.
    pub fn on_attack_phase(&mut self, phase: AttackPhase) -> Option<AttackDefinition> {
        if !self.is_attacking() {
            return None;
        }

        match phase {
            AttackPhase::Swing => {
                self.hits.clear();
                self.phase = AttackPhase::Swing;
                None
            }
            AttackPhase::Continue => {
                self.phase = AttackPhase::Continue;
                None
            }
            AttackPhase::End => self.end_attack(),
        }
    }

    /// Attack → Locomotion. Clears attack, hits and motion tasks.
    pub fn end_attack(&mut self) -> Option<AttackDefinition> {
        if self.state != CombatState::Attack {
            return None;
        }
        let finished = self.clear_attack();
        self.state = CombatState::Locomotion;
        finished
    }

    /// Record a target struck during the current swing.
    pub fn register_hit(&mut self, target: Entity) -> bool {
        self.is_swinging() && self.hits.try_register_hit(target)
    }

    /// Force Stagger. Returns the interrupted attack (if any).
    ///
    /// Ignored while dodging or dead.
    pub fn stagger(&mut self, big_hit: bool) -> Result<Option<AttackDefinition>, CombatState> {
        if matches!(self.state, CombatState::Dodge | CombatState::Dead) {
            return Err(self.state);
        }
        let interrupted = self.clear_attack();
        self.block_started_at = None;
        self.state = CombatState::Stagger { big_hit };
        Ok(interrupted)
    }

    /// Stagger clip finished.
    pub fn finish_stagger(&mut self) -> bool {
        if !matches!(self.state, CombatState::Stagger { .. }) {
            return false;
        }
        self.state = CombatState::Locomotion;
        true
    }

    /// Start holding block. Outside the swing an attack is ended first.
    pub fn begin_block(&mut self, now: f32) -> Result<Option<AttackDefinition>, CombatState> {
        let ended = match self.state {
            CombatState::Idle | CombatState::Locomotion => None,
            CombatState::Attack if self.phase != AttackPhase::Swing => self.end_attack(),
            CombatState::Block => return Ok(None),
            other => return Err(other),
        };
        self.state = CombatState::Block;
        self.block_started_at = Some(now);
        Ok(ended)
    }

    pub fn end_block(&mut self) -> bool {
        if self.state != CombatState::Block {
            return false;
        }
        self.state = CombatState::Locomotion;
        self.block_started_at = None;
        true
    }

    /// Enter Dodge from any living state. Cancels attack and motion tasks.
    pub fn begin_dodge(&mut self) -> Result<Option<AttackDefinition>, CombatState> {
        if self.state == CombatState::Dead {
            return Err(self.state);
        }
        let interrupted = self.clear_attack();
        self.block_started_at = None;
        self.state = CombatState::Dodge;
        Ok(interrupted)
    }

    pub fn finish_dodge(&mut self) -> bool {
        if self.state != CombatState::Dodge {
            return false;
        }
        self.motion.stop_roll();
        self.state = CombatState::Locomotion;
        true
    }

    /// Terminal transition. True the first time only.
    pub fn die(&mut self) -> bool {
        if self.state == CombatState::Dead {
            return false;
        }
        self.clear_attack();
        self.block_started_at = None;
        self.state = CombatState::Dead;
        true
    }

    fn clear_attack(&mut self) -> Option<AttackDefinition> {
        self.motion.cancel_all();
        self.hits.clear();
        self.phase = AttackPhase::End;
        self.current_attack.take()
    }
}
