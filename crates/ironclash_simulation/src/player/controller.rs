//! Player controller: raw input → combat state machine transitions.
//!
//! Per state:
//! - Idle/Locomotion: dodge > attack buttons (primary, secondary) > block > move
//! - Attack: dodge (not in Swing) > combo re-trigger (only in Continue) > block
//! - Block: release → Locomotion, dodge
//! - Stagger/Dodge/Dead: no control

use bevy::prelude::*;

use crate::combat::{
    AnimationCommand, AttackClass, AttackEnded, AttackPhase, CombatState, CombatStateMachine,
    DamageDealt, FireType,
};
use crate::components::{look_rotation, Combatant, Loadout, MoveIntent, Pose, WeaponSlot};
use crate::config::CombatTuning;
use crate::physics::CombatPhysics;
use crate::player::lock_on::{cast_direction, find_lock_direction};
use crate::player::{ButtonState, Player, PlayerInput};

/// Запросы/события, накопленные за тик (пишутся после цикла).
#[derive(Default)]
struct Outbox {
    animation: Vec<AnimationCommand>,
    attack_ended: Vec<AttackEnded>,
}

/// Один игрок на один тик.
struct PlayerTick<'a> {
    entity: Entity,
    player: &'a mut Player,
    machine: &'a mut CombatStateMachine,
    pose: &'a mut Pose,
    intent: &'a mut MoveIntent,
    loadout: &'a mut Loadout,
    tuning: &'a CombatTuning,
    now: f32,
    delta: f32,
    out: &'a mut Outbox,
}

impl PlayerTick<'_> {
    fn grounded(&mut self, input: &PlayerInput, lock: &impl Fn(&Pose, Vec3) -> Option<Vec3>) {
        if input.dodge_pressed {
            self.cancel_charge();
            self.dodge(input.move_axis);
            return;
        }

        if self.attack_button(WeaponSlot::Primary, input.primary, input, lock)
            || self.attack_button(WeaponSlot::Secondary, input.secondary, input, lock)
        {
            return;
        }

        if input.block_held {
            self.block();
            return;
        }

        self.walk(input.move_axis);
    }

    fn attacking(&mut self, input: &PlayerInput, lock: &impl Fn(&Pose, Vec3) -> Option<Vec3>) {
        let phase = self.machine.phase();

        if input.dodge_pressed && phase != AttackPhase::Swing {
            if self.machine.end_attack().is_some() {
                self.attack_ended(true);
            }
            self.dodge(input.move_axis);
            return;
        }

        let combo_slot = self.player.combo_slot.unwrap_or(WeaponSlot::Primary);
        let button = input.button(combo_slot);
        let repeat = self.loadout.weapon_in(combo_slot).fire_type == FireType::Repeat;
        if (repeat && button.held) || button.pressed {
            // Swing → ввод теряется (без буфера)
            if phase == AttackPhase::Continue {
                self.attack(combo_slot, input.aim, lock);
            }
            return;
        }

        if input.block_held && phase != AttackPhase::Swing {
            self.block();
        }
    }

    fn blocking(&mut self, input: &PlayerInput) {
        self.intent.direction = input.move_axis;

        if !input.block_held {
            self.release_block();
            return;
        }

        if input.dodge_pressed {
            self.release_block();
            self.dodge(input.move_axis);
        }
    }

    /// true → кнопка обработана, дальше по приоритетам не идём.
    fn attack_button(
        &mut self,
        slot: WeaponSlot,
        button: ButtonState,
        input: &PlayerInput,
        lock: &impl Fn(&Pose, Vec3) -> Option<Vec3>,
    ) -> bool {
        if let Some(charge) = self.player.charge.as_mut() {
            if charge.slot == slot {
                if button.held {
                    charge.held_for += self.delta;
                    if input.move_axis.length_squared() == 0.0 {
                        self.turn_damped(cast_direction(&*self.pose, input.aim));
                    }
                    return false;
                }
                self.attack(slot, input.aim, lock);
                return true;
            }
        }

        if !(button.held || button.pressed) {
            return false;
        }

        let fire_type = self.loadout.equip(slot).fire_type;
        self.player.combo_slot = Some(slot);
        if fire_type == FireType::Charge {
            self.start_charge(slot);
            return false;
        }

        self.attack(slot, input.aim, lock);
        true
    }

    /// Commit: lock-on → start_attack → turn → gap-close → PlayAttack.
    fn attack(
        &mut self,
        slot: WeaponSlot,
        aim: Vec3,
        lock: &impl Fn(&Pose, Vec3) -> Option<Vec3>,
    ) -> bool {
        let held_for = self.player.charge.map_or(0.0, |charge| charge.held_for);
        let weapon = self.loadout.weapon_in(slot);
        let attack = weapon.attack_for_charge(held_for);
        let class = weapon.class;
        let attack_id = attack.id;
        let animation_id = attack.animation_id;
        let ranged = attack.is_ranged();
        let powerful = attack.is_powerful;

        let direction = cast_direction(&*self.pose, aim);
        let lock_direction = lock(&*self.pose, direction);

        if let Err(rejected) = self.machine.start_attack(attack) {
            crate::logger::log(&format!("🎮 Player: attack dropped ({:?})", rejected));
            return false;
        }
        self.cancel_charge();

        let facing = self.pose.facing;
        match lock_direction {
            Some(lock_direction) => {
                self.machine
                    .motion
                    .start_turn(facing, lock_direction, self.tuning.attack_turn_time);

                let distance = lock_direction.length();
                if class == AttackClass::Melee && distance > self.tuning.gap_close_max_reach {
                    let from = self.pose.position;
                    let to = from
                        + lock_direction
                            .clamp_length_max(distance - self.tuning.gap_close_min_reach);
                    self.machine
                        .motion
                        .start_travel(from, to, self.tuning.gap_close_time);
                }
            }
            None => {
                self.machine
                    .motion
                    .start_turn(facing, direction, self.tuning.attack_turn_time);
            }
        }

        self.out.animation.push(AnimationCommand::PlayAttack {
            entity: self.entity,
            animation_id,
            ranged,
        });
        crate::logger::log(&format!(
            "🗡️ Player: attack {} (locked: {}, powerful: {})",
            attack_id,
            lock_direction.is_some(),
            powerful
        ));
        true
    }

    fn block(&mut self) {
        if self.loadout.equipped().is_none() {
            self.loadout.equip(WeaponSlot::Primary);
        }
        self.cancel_charge();

        match self.machine.begin_block(self.now) {
            Ok(ended) => {
                if ended.is_some() {
                    self.attack_ended(true);
                }
                self.out.animation.push(AnimationCommand::SetBlocking {
                    entity: self.entity,
                    blocking: true,
                });
            }
            Err(state) => {
                crate::logger::log(&format!("🎮 Player: block refused in {:?}", state));
            }
        }
    }

    fn release_block(&mut self) {
        if self.machine.end_block() {
            self.out.animation.push(AnimationCommand::SetBlocking {
                entity: self.entity,
                blocking: false,
            });
        }
    }

    /// Мгновенный поворот по вводу, затем Dodge (roll стартует по событию клипа).
    fn dodge(&mut self, move_axis: Vec3) {
        if let Some(rotation) = look_rotation(move_axis) {
            self.pose.facing = rotation;
        }

        match self.machine.begin_dodge() {
            Ok(interrupted) => {
                if interrupted.is_some() {
                    self.attack_ended(false);
                }
                self.out.animation.push(AnimationCommand::PlayDodge {
                    entity: self.entity,
                });
            }
            Err(state) => {
                crate::logger::log(&format!("🎮 Player: dodge refused in {:?}", state));
            }
        }
    }

    fn walk(&mut self, move_axis: Vec3) {
        let damper = if self.player.is_charging() {
            self.tuning.charge_speed_damper
        } else {
            1.0
        };
        self.intent.direction = move_axis.clamp_length_max(1.0) * damper;
    }

    fn turn_damped(&mut self, direction: Vec3) {
        if let Some(target) = look_rotation(direction) {
            let t = (self.tuning.turn_damping * self.delta).min(1.0);
            self.pose.facing = self.pose.facing.slerp(target, t);
        }
    }

    fn start_charge(&mut self, slot: WeaponSlot) {
        self.player.charge = Some(crate::player::Charge {
            slot,
            held_for: 0.0,
        });
        self.out.animation.push(AnimationCommand::SetCharging {
            entity: self.entity,
            charging: true,
        });
        crate::logger::log(&format!("🎮 Player: charging {:?}", slot));
    }

    fn cancel_charge(&mut self) {
        if self.player.charge.take().is_some() {
            self.out.animation.push(AnimationCommand::SetCharging {
                entity: self.entity,
                charging: false,
            });
        }
    }

    fn attack_ended(&mut self, completed: bool) {
        self.out.attack_ended.push(AttackEnded {
            entity: self.entity,
            completed,
        });
    }
}

/// System: player input → state machine (CombatSet::Decide).
///
/// Edge-флаги ввода (`pressed`, `dodge_pressed`) сбрасываются после тика.
pub fn drive_player(
    mut players: Query<
        (
            Entity,
            &mut Player,
            &mut PlayerInput,
            &Combatant,
            &mut CombatStateMachine,
            &mut Pose,
            &mut MoveIntent,
            &mut Loadout,
        ),
    >,
    targets: Query<&Pose, (With<Combatant>, Without<Player>)>,
    physics: Res<CombatPhysics>,
    tuning: Res<CombatTuning>,
    time: Res<Time<Fixed>>,
    mut animation: EventWriter<AnimationCommand>,
    mut attack_ended: EventWriter<AttackEnded>,
) {
    let mut out = Outbox::default();

    for (entity, mut player, mut input, combatant, mut machine, mut pose, mut intent, mut loadout) in
        players.iter_mut()
    {
        let layers = combatant.faction.hostile_layers();
        let lock = |pose: &Pose, direction: Vec3| {
            find_lock_direction(
                &physics,
                pose,
                direction,
                layers,
                |target| targets.get(target).ok().map(|target_pose| target_pose.position),
                &tuning,
            )
        };

        let mut tick = PlayerTick {
            entity,
            player: &mut player,
            machine: &mut machine,
            pose: &mut pose,
            intent: &mut intent,
            loadout: &mut loadout,
            tuning: &tuning,
            now: time.elapsed_secs(),
            delta: time.delta_secs(),
            out: &mut out,
        };
        tick.intent.direction = Vec3::ZERO;

        match tick.machine.state() {
            CombatState::Idle | CombatState::Locomotion => tick.grounded(&input, &lock),
            CombatState::Attack => tick.attacking(&input, &lock),
            CombatState::Block => tick.blocking(&input),
            CombatState::Stagger { .. } | CombatState::Dodge | CombatState::Dead => {
                tick.cancel_charge()
            }
        }

        input.clear_edges();
    }

    animation.write_batch(out.animation);
    attack_ended.write_batch(out.attack_ended);
}

/// System: damaging hit on the player → weapon back to holster.
pub fn unequip_on_damage(
    mut damage: EventReader<DamageDealt>,
    mut players: Query<&mut Loadout, With<Player>>,
) {
    for dealt in damage.read() {
        if let Ok(mut loadout) = players.get_mut(dealt.target) {
            if loadout.equipped_slot().is_some() {
                loadout.unequip();
                crate::logger::log(&format!("🎮 Player: {:?} hit → weapon unequipped", dealt.target));
            }
        }
    }
}
