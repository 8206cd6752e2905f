//! Entity AI pipeline
//!
//! Only the room the player stands in is simulated. Enemies are walked
//! back-to-front by index so a dead one can be removed in place; enemies
//! spawned during the pass are buffered and appended afterwards, so they
//! first act on the next tick.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::boss;
use super::entity::{Behavior, Enemy, EnemyKind};
use super::player::Player;
use super::projectile::{BulletOwner, BulletPool};
use super::room::{Particle, ParticleKind, Prop, Room, RoomCoord};
use crate::audio::Cue;
use crate::consts::*;
use crate::sign;
use crate::tuning::Tuning;

/// Particles emitted when an enemy dies
pub const DEATH_BURST: usize = 15;
/// Crawlers and debris never sink below this room-local y
pub const GROUND_CLAMP_Y: f32 = ROOM_H - 80.0;
const ENEMY_GRAVITY: f32 = 0.4;
const CRAWLER_SPEED: f32 = 0.8;
const MINI_BOSS_SPEED: f32 = 1.2;
const FLYER_AGGRO: f32 = 350.0;
const WATCHER_RANGE: f32 = 350.0;
const WATCHER_RETREAT: f32 = 80.0;
const WATCHER_COOLDOWN: u32 = 90;
const WATCHER_SHOT_SPEED: f32 = 6.0;
const WEAVER_AGGRO: f32 = 500.0;
const SWARM_AGGRO: f32 = 300.0;
const SWARM_SPEED: f32 = 0.6;
const SEED_GRAVITY: f32 = 0.08;
const SEED_HIT_BOX: f32 = 12.0;

/// Simulation-wide handles an enemy update may touch
pub struct AiCtx<'a> {
    pub player: &'a mut Player,
    pub bullets: &'a mut BulletPool,
    pub tuning: &'a Tuning,
    pub rng: &'a mut Pcg32,
    pub cues: &'a mut Vec<Cue>,
}

/// The parts of the owning room an enemy update may touch
pub struct Arena<'a> {
    pub coord: RoomCoord,
    pub origin: Vec2,
    pub particles: &'a mut Vec<Particle>,
    pub props: &'a mut Vec<Prop>,
    /// Enemies created this pass, appended after it
    pub spawned: &'a mut Vec<Enemy>,
    pub locked: &'a mut bool,
    pub boss_active: &'a mut bool,
}

/// Update every enemy in the room, then append anything spawned
pub fn update_room(room: &mut Room, ctx: &mut AiCtx<'_>) {
    let coord = room.coord;
    let origin = room.origin();
    let Room {
        enemies,
        particles,
        props,
        locked,
        boss_active,
        ..
    } = room;

    let mut spawned = Vec::new();
    let mut arena = Arena {
        coord,
        origin,
        particles,
        props,
        spawned: &mut spawned,
        locked,
        boss_active,
    };

    for i in (0..enemies.len()).rev() {
        let enemy = &mut enemies[i];
        match enemy.behavior {
            Behavior::RootTitan(_) => boss::update(enemy, &mut arena, ctx),
            _ => update_enemy(enemy, &mut arena, ctx),
        }

        if enemy.is_dead() {
            let dead = enemies.remove(i);
            on_death(&dead, arena.particles, arena.locked, arena.boss_active, ctx.rng, ctx.cues);
        }
    }

    enemies.append(&mut spawned);
}

/// Remove every dead enemy from a room (used right after bullets land)
pub fn reap_dead(room: &mut Room, rng: &mut Pcg32, cues: &mut Vec<Cue>) -> usize {
    let mut reaped = 0;
    for i in (0..room.enemies.len()).rev() {
        if room.enemies[i].is_dead() {
            let dead = room.enemies.remove(i);
            on_death(&dead, &mut room.particles, &mut room.locked, &mut room.boss_active, rng, cues);
            reaped += 1;
        }
    }
    reaped
}

/// Death burst, plus arena unlock when the primary boss falls
fn on_death(
    dead: &Enemy,
    particles: &mut Vec<Particle>,
    locked: &mut bool,
    boss_active: &mut bool,
    rng: &mut Pcg32,
    cues: &mut Vec<Cue>,
) {
    death_burst(particles, dead.pos, rng);
    if dead.kind() == EnemyKind::RootTitan {
        *locked = false;
        *boss_active = false;
        cues.push(Cue::BossDie);
        log::info!("Boss defeated");
    } else if dead.kind().is_boss() {
        log::info!("{:?} defeated", dead.kind());
    } else {
        log::debug!("{:?} died at {:?}", dead.kind(), dead.pos);
    }
}

pub fn death_burst(particles: &mut Vec<Particle>, at: Vec2, rng: &mut impl Rng) {
    for _ in 0..DEATH_BURST {
        let vel = Vec2::new(
            (rng.random::<f32>() - 0.5) * 5.0,
            (rng.random::<f32>() - 0.5) * 5.0,
        );
        let size = 2.0 + rng.random::<f32>() * 3.0;
        particles.push(Particle::new(ParticleKind::Death, at, vel, 40, size));
    }
}

/// Ground walker movement shared by crawlers, debris and the mini boss
fn fall_and_walk(enemy: &mut Enemy, walk: Option<f32>) {
    enemy.vel.y += ENEMY_GRAVITY;
    enemy.pos += enemy.vel;
    if let Some(vx) = walk {
        enemy.vel.x = vx;
    }
    if enemy.pos.y > GROUND_CLAMP_Y {
        enemy.pos.y = GROUND_CLAMP_Y;
        enemy.vel.y = 0.0;
    }
}

fn update_enemy(enemy: &mut Enemy, arena: &mut Arena<'_>, ctx: &mut AiCtx<'_>) {
    let world_pos = arena.origin + enemy.pos;
    let dx = ctx.player.pos.x - world_pos.x;
    let dy = ctx.player.pos.y - world_pos.y;

    match &mut enemy.behavior {
        Behavior::Crawler { dir } => {
            let vx = *dir * CRAWLER_SPEED;
            if ctx.rng.random_bool(0.01) {
                *dir = -*dir;
            }
            enemy.facing = sign(vx);
            fall_and_walk(enemy, Some(vx));
        }
        Behavior::MiniBoss { dir } => {
            let vx = *dir * MINI_BOSS_SPEED;
            if ctx.rng.random_bool(0.01) {
                *dir = -*dir;
            }
            enemy.facing = sign(vx);
            fall_and_walk(enemy, Some(vx));
        }
        Behavior::Debris => fall_and_walk(enemy, None),
        Behavior::Flyer { base_y, phase } => {
            *phase += 0.04;
            enemy.pos.y = *base_y + phase.sin() * 20.0;
            if dx.abs() < FLYER_AGGRO {
                enemy.pos.x += sign(dx) * 0.8;
            }
        }
        Behavior::Watcher { cooldown } => {
            *cooldown = cooldown.saturating_sub(1);
            let dist = dx.hypot(dy);
            if dist < WATCHER_RANGE && *cooldown == 0 {
                let angle = dy.atan2(dx);
                let dir = Vec2::new(angle.cos(), angle.sin());
                ctx.bullets.spawn(
                    world_pos + dir * 10.0,
                    dir * WATCHER_SHOT_SPEED,
                    1,
                    BulletOwner::Enemy,
                );
                let vel = Vec2::new(ctx.rng.random::<f32>() - 0.5, ctx.rng.random::<f32>() - 0.5);
                arena
                    .particles
                    .push(Particle::new(ParticleKind::Ambient, enemy.pos, vel, 30, 2.0));
                *cooldown = WATCHER_COOLDOWN;
            }
            if dist < WATCHER_RETREAT {
                enemy.pos.x -= sign(dx) * 1.5;
            }
            enemy.facing = if dx < 0.0 { -1.0 } else { 1.0 };
        }
        Behavior::Swarm { variant, phase } => {
            let target = ctx.player.center() - world_pos;
            let speed = SWARM_SPEED * variant.speed_mult();
            if target.length() < SWARM_AGGRO {
                enemy.pos.x += sign(target.x) * speed;
                enemy.pos.y += sign(target.y) * speed;
            } else {
                *phase += 0.05;
                enemy.pos.y += phase.sin() * 0.3;
            }
            enemy.facing = if target.x < 0.0 { -1.0 } else { 1.0 };
        }
        Behavior::GloomWeaver { phase } => {
            *phase += 0.03;
            enemy.pos.y += phase.sin() * 0.5;
            if dx.abs() < WEAVER_AGGRO {
                enemy.pos.x += sign(dx) * 0.5;
            }
            if ctx.rng.random_bool(0.05) {
                let rng = &mut *ctx.rng;
                let at = enemy.pos
                    + Vec2::new(
                        (rng.random::<f32>() - 0.5) * 40.0,
                        (rng.random::<f32>() - 0.5) * 40.0,
                    );
                let vel = Vec2::new(
                    (rng.random::<f32>() - 0.5) * 2.0,
                    (rng.random::<f32>() - 0.5) * 2.0,
                );
                arena
                    .particles
                    .push(Particle::new(ParticleKind::Ambient, at, vel, 50, 3.0));
            }
        }
        // driven by the boss state machine
        Behavior::RootTitan(_) => {}
    }
}

/// Age the room's particles. Seeds fall, hurt the player on contact and
/// hatch into mini swarms when they expire.
pub fn age_particles(room: &mut Room, player: &mut Player, tuning: &Tuning, rng: &mut Pcg32, cues: &mut Vec<Cue>) {
    let origin = room.origin();
    let mut hatched = Vec::new();

    room.particles.retain_mut(|p| {
        if p.kind == ParticleKind::Seed {
            p.pos += p.vel;
            p.vel.y += SEED_GRAVITY;
            p.life = p.life.saturating_sub(1);
            let player_center = player.pos + player.size / 2.0;
            let d = player_center - (origin + p.pos);
            if d.x.abs() < SEED_HIT_BOX && d.y.abs() < SEED_HIT_BOX {
                player.take_damage(tuning, cues);
                return false;
            }
            if p.life == 0 {
                for _ in 0..2 {
                    let at = p.pos
                        + Vec2::new(
                            (rng.random::<f32>() - 0.5) * 24.0,
                            (rng.random::<f32>() - 0.5) * 24.0,
                        );
                    hatched.push(Enemy::swarm(rng, EnemyKind::MiniSwarm, at));
                }
                return false;
            }
            return true;
        }

        p.pos += p.vel;
        p.vel *= 0.98;
        p.life = p.life.saturating_sub(1);
        p.life > 0
    });

    room.enemies.append(&mut hatched);
}
