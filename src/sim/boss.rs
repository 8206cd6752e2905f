//! Primary boss state machine
//!
//! The boss idles until the player walks into its room, then thinks on a
//! fixed rhythm, picking one attack at a time. Each attack owns a countdown
//! set when it is chosen; the attack resolves at fixed ticks of that
//! countdown and clears itself when it reaches zero.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ai::{AiCtx, Arena};
use super::entity::{Behavior, Enemy, EnemyKind};
use super::room::{Particle, ParticleKind, Prop, PropKind};
use crate::consts::*;

/// Ticks between action choices
pub const THINK_PERIOD: u32 = 60;
/// Cooldown after the idle boss summons adds
pub const SUMMON_COOLDOWN: i32 = 180;
pub const RAGE_MAX: f32 = 100.0;

const SLAM_TICKS: u32 = 40;
const SLAM_HIT_AT: u32 = 18;
const LUNGE_TICKS: u32 = 36;
const LUNGE_SPEED: f32 = 6.0;
const BARRAGE_TICKS: u32 = 80;
const BARRAGE_INTERVAL: u32 = 12;
const PULSE_TICKS: u32 = 100;
const PULSE_HIT_AT: u32 = 20;
/// Seed lifetime before it hatches
pub const SEED_LIFE: u32 = 120;

/// One attack in progress, with its countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossAction {
    RootSlam { timer: u32 },
    Lunge { timer: u32 },
    SeedBarrage { timer: u32 },
    AltarPulse { timer: u32 },
}

/// Coarse state for renderers and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossMode {
    Inactive,
    Idle,
    PhaseShift,
    Acting(BossAction),
}

impl BossMode {
    pub fn label(self) -> &'static str {
        match self {
            BossMode::Inactive => "inactive",
            BossMode::Idle => "idle",
            BossMode::PhaseShift => "phase shift",
            BossMode::Acting(BossAction::RootSlam { .. }) => "root slam",
            BossMode::Acting(BossAction::Lunge { .. }) => "lunge",
            BossMode::Acting(BossAction::SeedBarrage { .. }) => "seed barrage",
            BossMode::Acting(BossAction::AltarPulse { .. }) => "altar pulse",
        }
    }
}

/// Per-boss state carried inside [`Behavior::RootTitan`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossBrain {
    /// Escalation tier, 1..=3, never decreases
    pub phase: u8,
    /// Accumulates with time and damage; read by telemetry only
    pub rage: f32,
    /// Countdown to the next action choice
    pub think: u32,
    pub action: Option<BossAction>,
    pub charge: f32,
    pub spawn_cooldown: i32,
    /// Ticks since activation or the last phase change
    pub timer: u32,
    /// Phase changed on the most recent update
    pub phase_shift: bool,
}

impl Default for BossBrain {
    fn default() -> Self {
        Self {
            phase: 1,
            rage: 0.0,
            think: 0,
            action: None,
            charge: 0.0,
            spawn_cooldown: 0,
            timer: 0,
            phase_shift: false,
        }
    }
}

/// Phase implied by a health ratio
pub fn phase_for_ratio(ratio: f32) -> u8 {
    if ratio < 0.3 {
        3
    } else if ratio < 0.65 {
        2
    } else {
        1
    }
}

impl BossBrain {
    /// Raise the phase if health has dropped far enough. Returns true on change.
    pub fn update_phase(&mut self, hp: i32, max_hp: i32) -> bool {
        let ratio = hp as f32 / max_hp.max(1) as f32;
        let target = phase_for_ratio(ratio);
        if target <= self.phase {
            return false;
        }
        self.phase = target;
        self.think = 0;
        self.timer = 0;
        self.spawn_cooldown = 0;
        if target == 3 {
            self.charge = 0.0;
        }
        true
    }

    pub fn add_rage(&mut self, hp: i32, max_hp: i32) {
        self.rage = (self.rage + 0.01 + (max_hp - hp) as f32 * 0.0008).min(RAGE_MAX);
    }

    pub fn mode(&self, active: bool) -> BossMode {
        if !active {
            BossMode::Inactive
        } else if self.phase_shift {
            BossMode::PhaseShift
        } else if let Some(action) = self.action {
            BossMode::Acting(action)
        } else {
            BossMode::Idle
        }
    }

    /// Roll the next attack from the distance band and phase
    fn choose(&self, dist: f32, rng: &mut impl Rng) -> BossAction {
        let mut action = if dist < 180.0 && rng.random_bool(0.6) {
            BossAction::RootSlam { timer: SLAM_TICKS }
        } else if dist < 350.0 && rng.random_bool(0.5) {
            BossAction::Lunge { timer: LUNGE_TICKS }
        } else {
            BossAction::SeedBarrage {
                timer: BARRAGE_TICKS,
            }
        };
        if self.phase >= 2 && rng.random_bool(0.25) {
            action = BossAction::AltarPulse { timer: PULSE_TICKS };
        }
        if self.phase >= 3 && rng.random_bool(0.35) {
            action = BossAction::Lunge { timer: LUNGE_TICKS };
        }
        action
    }
}

/// Advance the primary boss by one tick, logging mode transitions
pub fn update(enemy: &mut Enemy, arena: &mut Arena<'_>, ctx: &mut AiCtx<'_>) {
    let before = enemy.boss_brain().map(|b| b.mode(*arena.boss_active));
    advance(enemy, arena, ctx);
    let after = enemy.boss_brain().map(|b| b.mode(*arena.boss_active));
    if let (Some(before), Some(after)) = (before, after) {
        if before.label() != after.label() {
            log::debug!("Boss in {}: {} -> {}", arena.coord, before.label(), after.label());
        }
    }
}

fn advance(enemy: &mut Enemy, arena: &mut Arena<'_>, ctx: &mut AiCtx<'_>) {
    let Enemy {
        behavior,
        pos,
        vel,
        size,
        hp,
        max_hp,
        facing,
    } = enemy;
    let Behavior::RootTitan(brain) = behavior else {
        return;
    };

    brain.timer = brain.timer.saturating_add(1);
    brain.phase_shift = false;

    if !*arena.boss_active && ctx.player.room() == arena.coord {
        *arena.boss_active = true;
        *arena.locked = true;
        brain.timer = 0;
        log::info!("Boss awakened in room {}", arena.coord);
    }
    if !*arena.boss_active {
        return;
    }

    if brain.update_phase(*hp, *max_hp) {
        brain.phase_shift = true;
        log::info!("Boss entered phase {} ({}/{} hp)", brain.phase, hp, max_hp);
    }
    brain.add_rage(*hp, *max_hp);

    let player_local = ctx.player.pos - arena.origin;

    if brain.think == 0 && brain.action.is_none() {
        let dist = (player_local.x - pos.x).abs();
        let action = brain.choose(dist, ctx.rng);
        start_action(action, brain, pos, vel, facing, player_local, arena);
        brain.action = Some(action);
        brain.think = THINK_PERIOD;
        log::debug!("Boss chose {:?}", action);
    }
    brain.think = brain.think.saturating_sub(1);

    match brain.action {
        Some(BossAction::RootSlam { timer }) => {
            let timer = timer.saturating_sub(1);
            if timer == SLAM_HIT_AT {
                let reach = if *facing > 0.0 { 40.0 } else { -80.0 };
                let hit = arena.origin + Vec2::new(pos.x + reach, pos.y + size.y);
                let p = &ctx.player;
                if p.pos.x + p.size.x / 2.0 > hit.x - 40.0
                    && p.pos.x < hit.x + 40.0
                    && (p.pos.y - hit.y).abs() < 40.0
                {
                    ctx.player.take_damage(ctx.tuning, ctx.cues);
                }
                for i in 0..4 {
                    let x = pos.x + (i as f32 * 24.0 - 36.0) + reach;
                    arena.props.push(Prop::spike(x, pos.y + size.y, 8.0, 12.0));
                }
            }
            brain.action = (timer > 0).then_some(BossAction::RootSlam { timer });
        }
        Some(BossAction::Lunge { timer }) => {
            let timer = timer.saturating_sub(1);
            pos.x += vel.x;
            if timer == 0 {
                if (ctx.player.pos.x - (arena.origin.x + pos.x)).abs() < 120.0 {
                    ctx.player.take_damage(ctx.tuning, ctx.cues);
                }
                for _ in 0..6 {
                    let at = Vec2::new(
                        pos.x + (ctx.rng.random::<f32>() - 0.5) * 60.0,
                        pos.y + size.y,
                    );
                    arena.spawned.push(Enemy::debris(ctx.rng, at));
                }
                vel.x = 0.0;
            }
            brain.action = (timer > 0).then_some(BossAction::Lunge { timer });
        }
        Some(BossAction::SeedBarrage { timer }) => {
            let timer = timer.saturating_sub(1);
            if timer % BARRAGE_INTERVAL == 0 {
                let rng = &mut *ctx.rng;
                let seed_pos = Vec2::new(
                    pos.x + (rng.random::<f32>() - 0.5) * 40.0,
                    pos.y + 20.0 + rng.random::<f32>() * 20.0,
                );
                let seed_vel = Vec2::new(
                    (rng.random::<f32>() - 0.5) * 2.0 + (player_local.x - pos.x) * 0.002,
                    -2.0 + rng.random::<f32>() * 0.4,
                );
                arena
                    .particles
                    .push(Particle::new(ParticleKind::Seed, seed_pos, seed_vel, SEED_LIFE, 4.0));
            }
            brain.action = (timer > 0).then_some(BossAction::SeedBarrage { timer });
        }
        Some(BossAction::AltarPulse { timer }) => {
            let timer = timer.saturating_sub(1);
            if timer == PULSE_HIT_AT {
                let altar_x = arena.origin.x + 30.0 * TILE_SIZE;
                if (ctx.player.pos.x - altar_x).abs() < 220.0 {
                    ctx.player.take_damage(ctx.tuning, ctx.cues);
                }
                for i in 0..6 {
                    let x = 20.0 * TILE_SIZE + i as f32 * 16.0 + ctx.rng.random::<f32>() * 8.0;
                    arena
                        .props
                        .push(Prop::new(PropKind::Crack, x, 36.0 * TILE_SIZE + 8.0, 12.0, 8.0));
                }
            }
            if timer == 0 {
                brain.charge = 0.0;
            }
            brain.action = (timer > 0).then_some(BossAction::AltarPulse { timer });
        }
        None => {
            if ctx.rng.random_bool(0.01) {
                *facing = -*facing;
            }
            if brain.spawn_cooldown <= 0 && ctx.rng.random_bool(0.02) {
                brain.spawn_cooldown = SUMMON_COOLDOWN;
                let y = 30.0 * TILE_SIZE;
                arena
                    .spawned
                    .push(Enemy::swarm(ctx.rng, EnemyKind::FastSwarm, Vec2::new(40.0, y)));
                arena
                    .spawned
                    .push(Enemy::swarm(ctx.rng, EnemyKind::MiniSwarm, Vec2::new(560.0, y)));
                log::debug!("Boss summoned adds");
            }
            brain.spawn_cooldown = (brain.spawn_cooldown - 1).max(0);
        }
    }

    pos.x = pos.x.clamp(30.0, ROOM_W - 80.0);
}

/// Entry effects of a freshly chosen action
fn start_action(
    action: BossAction,
    brain: &mut BossBrain,
    pos: &Vec2,
    vel: &mut Vec2,
    facing: &mut f32,
    player_local: Vec2,
    arena: &mut Arena<'_>,
) {
    match action {
        BossAction::RootSlam { .. } => {
            arena
                .particles
                .push(Particle::new(ParticleKind::Telegraph, *pos, Vec2::ZERO, 30, 6.0));
        }
        BossAction::Lunge { .. } => {
            vel.x = if player_local.x - pos.x > 0.0 {
                LUNGE_SPEED
            } else {
                -LUNGE_SPEED
            };
            *facing = vel.x.signum();
        }
        BossAction::SeedBarrage { .. } => {}
        BossAction::AltarPulse { .. } => brain.charge = 100.0,
    }
}
