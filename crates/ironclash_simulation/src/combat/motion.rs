//! Multi-tick motion tasks: attack turn, gap-close, dodge roll.
//!
//! Каждая задача помечена generation. `cancel_all()` увеличивает generation
//! и сбрасывает задачи; перед каждой записью в Pose generation сверяется,
//! поэтому отменённая задача никогда не допишет поворот/позицию позже.

use bevy::prelude::*;

use crate::components::{look_rotation, Pose};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionKind {
    /// Slerp facing from → to
    Turn { from: Quat, to: Quat },
    /// Lerp position from → to (Y untouched)
    Travel { from: Vec3, to: Vec3 },
    /// Constant forward velocity along the facing at start
    Roll { velocity: Vec3 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionTask {
    pub kind: MotionKind,
    pub elapsed: f32,
    pub duration: f32,
    generation: u32,
}

impl MotionTask {
    fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }
}

/// Active motion tasks of one combatant (at most one rotation + one translation).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionTasks {
    generation: u32,
    rotation: Option<MotionTask>,
    translation: Option<MotionTask>,
}

impl MotionTasks {
    pub fn is_idle(&self) -> bool {
        self.rotation.is_none() && self.translation.is_none()
    }

    pub fn rotation(&self) -> Option<&MotionTask> {
        self.rotation.as_ref()
    }

    pub fn translation(&self) -> Option<&MotionTask> {
        self.translation.as_ref()
    }

    /// Interrupt: drop every task immediately.
    pub fn cancel_all(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.rotation = None;
        self.translation = None;
    }

    /// Turn towards a flattened direction over `duration`. Zero direction → no task.
    pub fn start_turn(&mut self, current: Quat, direction: Vec3, duration: f32) -> bool {
        let Some(to) = look_rotation(direction) else {
            return false;
        };
        self.rotation = Some(MotionTask {
            kind: MotionKind::Turn { from: current, to },
            elapsed: 0.0,
            duration,
            generation: self.generation,
        });
        true
    }

    pub fn start_travel(&mut self, from: Vec3, to: Vec3, duration: f32) {
        self.translation = Some(MotionTask {
            kind: MotionKind::Travel { from, to },
            elapsed: 0.0,
            duration,
            generation: self.generation,
        });
    }

    /// Roll runs until `stop_roll()` (dodge end event), not on a timer.
    pub fn start_roll(&mut self, velocity: Vec3) {
        self.translation = Some(MotionTask {
            kind: MotionKind::Roll { velocity },
            elapsed: 0.0,
            duration: f32::INFINITY,
            generation: self.generation,
        });
    }

    pub fn stop_roll(&mut self) {
        if matches!(
            self.translation,
            Some(MotionTask {
                kind: MotionKind::Roll { .. },
                ..
            })
        ) {
            self.translation = None;
        }
    }

    /// Advance every live task by `delta` and write into `pose`.
    pub fn advance(&mut self, delta: f32, pose: &mut Pose) {
        let generation = self.generation;

        if let Some(task) = self.rotation.as_mut() {
            if task.generation != generation {
                self.rotation = None;
            } else {
                task.elapsed += delta;
                let t = task.progress();
                if let MotionKind::Turn { from, to } = task.kind {
                    pose.facing = from.slerp(to, t);
                }
                if t >= 1.0 {
                    self.rotation = None;
                }
            }
        }

        if let Some(task) = self.translation.as_mut() {
            if task.generation != generation {
                self.translation = None;
            } else {
                task.elapsed += delta;
                let t = task.progress();
                match task.kind {
                    MotionKind::Travel { from, to } => {
                        let target = from.lerp(to, t);
                        pose.position.x = target.x;
                        pose.position.z = target.z;
                    }
                    MotionKind::Roll { velocity } => {
                        pose.position += velocity * delta;
                    }
                    MotionKind::Turn { .. } => {}
                }
                if t >= 1.0 {
                    self.translation = None;
                }
            }
        }
    }
}
