//! Headless animation driver: clip timelines that emit authored events.
//!
//! В игре события приходят из клипов движка. Headless режим проигрывает
//! "клипы" как списки `(время, событие)`: `AnimationCommand` запускает клип,
//! система отдаёт `AnimationEvent` когда наступает время события.
//!
//! На сущность: один активный клип: новый клип (атака, stagger, dodge,
//! блок, смерть) вытесняет старый, его оставшиеся события пропадают.

use std::collections::{BTreeMap, HashMap};

use bevy::prelude::*;

use crate::combat::events::{
    AnimationCommand, AnimationEvent, AnimationEventKind, AnimationEventParseError,
    AttackPhaseEvent, HitSide,
};
use crate::combat::state::AttackPhase;

/// One authored callback inside a clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipEvent {
    /// Seconds from clip start
    pub at: f32,
    pub kind: AnimationEventKind,
}

/// Attack clip: sorted authored events.
#[derive(Debug, Clone, PartialEq)]
pub struct AttackClip {
    events: Vec<ClipEvent>,
}

impl AttackClip {
    fn new(mut events: Vec<ClipEvent>) -> Self {
        events.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self { events }
    }

    /// Single-weapon melee swing: one front hit region.
    pub fn melee(hit_at: f32, continue_at: f32, end_at: f32) -> Self {
        Self::new(vec![
            attack_event(0.0, AttackPhaseEvent::Start),
            attack_event(0.0, AttackPhaseEvent::Phase(AttackPhase::Swing)),
            attack_event(hit_at, AttackPhaseEvent::HitRegionActivated(HitSide::Front)),
            attack_event(continue_at, AttackPhaseEvent::Phase(AttackPhase::Continue)),
            attack_event(end_at, AttackPhaseEvent::Phase(AttackPhase::End)),
        ])
    }

    /// Ranged attack: projectile release instead of hit regions.
    pub fn ranged(release_at: f32, continue_at: f32, end_at: f32) -> Self {
        Self::new(vec![
            attack_event(0.0, AttackPhaseEvent::Start),
            attack_event(0.0, AttackPhaseEvent::Phase(AttackPhase::Swing)),
            attack_event(release_at, AttackPhaseEvent::ProjectileRelease),
            attack_event(continue_at, AttackPhaseEvent::Phase(AttackPhase::Continue)),
            attack_event(end_at, AttackPhaseEvent::Phase(AttackPhase::End)),
        ])
    }

    /// Clip from engine-authored event names (`"collide.left"` ...).
    pub fn from_authored(events: &[(f32, &str)]) -> Result<Self, AnimationEventParseError> {
        let events = events
            .iter()
            .map(|(at, name)| Ok(attack_event(*at, name.parse()?)))
            .collect::<Result<Vec<_>, AnimationEventParseError>>()?;
        Ok(Self::new(events))
    }

    pub fn events(&self) -> &[ClipEvent] {
        &self.events
    }

    pub fn duration(&self) -> f32 {
        self.events.last().map_or(0.0, |event| event.at)
    }
}

fn attack_event(at: f32, event: AttackPhaseEvent) -> ClipEvent {
    ClipEvent {
        at,
        kind: AnimationEventKind::Attack(event),
    }
}

/// Clip timings of the headless driver.
#[derive(Resource, Debug, Clone)]
pub struct ClipLibrary {
    attacks: HashMap<u32, AttackClip>,
    pub default_melee: AttackClip,
    pub default_ranged: AttackClip,
    pub stagger_time: f32,
    pub big_stagger_time: f32,
    pub dodge_time: f32,
}

impl Default for ClipLibrary {
    fn default() -> Self {
        Self {
            attacks: HashMap::new(),
            default_melee: AttackClip::melee(0.25, 0.45, 0.8),
            default_ranged: AttackClip::ranged(0.4, 0.6, 0.9),
            stagger_time: 0.5,
            big_stagger_time: 0.9,
            dodge_time: 0.5,
        }
    }
}

impl ClipLibrary {
    /// Override the clip played for `animation_id`.
    pub fn insert_attack(&mut self, animation_id: u32, clip: AttackClip) {
        self.attacks.insert(animation_id, clip);
    }

    pub fn attack_clip(&self, animation_id: u32, ranged: bool) -> &AttackClip {
        self.attacks.get(&animation_id).unwrap_or(if ranged {
            &self.default_ranged
        } else {
            &self.default_melee
        })
    }

    /// Events of the clip started by `command`, or None if it starts no clip.
    fn clip_for(&self, command: &AnimationCommand) -> Option<Vec<ClipEvent>> {
        match command {
            AnimationCommand::PlayAttack {
                animation_id,
                ranged,
                ..
            } => Some(self.attack_clip(*animation_id, *ranged).events().to_vec()),
            AnimationCommand::PlayStagger { big_hit, .. } => Some(vec![ClipEvent {
                at: if *big_hit {
                    self.big_stagger_time
                } else {
                    self.stagger_time
                },
                kind: AnimationEventKind::StaggerFinished,
            }]),
            AnimationCommand::PlayDodge { .. } => Some(vec![
                ClipEvent {
                    at: 0.0,
                    kind: AnimationEventKind::DodgeStarted,
                },
                ClipEvent {
                    at: self.dodge_time,
                    kind: AnimationEventKind::DodgeFinished,
                },
            ]),
            // Block pose / death pose: no authored callbacks, but replaces the clip
            AnimationCommand::SetBlocking { blocking: true, .. }
            | AnimationCommand::PlayDeath { .. } => Some(Vec::new()),
            _ => None,
        }
    }
}

/// Pending event of the active clip (absolute fire time).
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScheduledEvent {
    fire_at: f32,
    kind: AnimationEventKind,
}

/// Resource: active clip per entity.
///
/// BTreeMap → события разных сущностей уходят в стабильном порядке.
#[derive(Resource, Debug, Default)]
pub struct ClipPlayer {
    tracks: BTreeMap<Entity, Vec<ScheduledEvent>>,
}

impl ClipPlayer {
    /// Start `events` for `entity` at `now`, replacing its active clip.
    pub fn play(&mut self, entity: Entity, events: &[ClipEvent], now: f32) {
        let track = events
            .iter()
            .map(|event| ScheduledEvent {
                fire_at: now + event.at,
                kind: event.kind,
            })
            .collect();
        self.tracks.insert(entity, track);
    }

    pub fn is_playing(&self, entity: Entity) -> bool {
        self.tracks.get(&entity).is_some_and(|track| !track.is_empty())
    }

    /// Pop every event due at `now`, in clip order.
    pub fn drain_due(&mut self, now: f32) -> Vec<AnimationEvent> {
        let mut due = Vec::new();
        for (entity, track) in self.tracks.iter_mut() {
            let ready = track.iter().take_while(|event| event.fire_at <= now).count();
            due.extend(track.drain(..ready).map(|event| AnimationEvent {
                entity: *entity,
                kind: event.kind,
            }));
        }
        self.tracks.retain(|_, track| !track.is_empty());
        due
    }
}

/// System: start clips from `AnimationCommand`, emit due `AnimationEvent`s.
///
/// Runs before `process_animation_events` (CombatSet::Animation).
pub fn drive_clip_timelines(
    mut commands_in: EventReader<AnimationCommand>,
    mut events_out: EventWriter<AnimationEvent>,
    mut player: ResMut<ClipPlayer>,
    library: Res<ClipLibrary>,
    time: Res<Time<Fixed>>,
) {
    let now = time.elapsed_secs();

    for command in commands_in.read() {
        if let Some(events) = library.clip_for(command) {
            player.play(command.entity(), &events, now);
        }
    }

    for event in player.drain_due(now) {
        events_out.write(event);
    }
}
