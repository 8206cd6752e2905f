//! Player state and per-tick update
//!
//! Order within a tick: ability timers and triggers (sword, dash, pistol,
//! down-shot), horizontal input, buffered jump, gravity, collision, a second
//! buffered-jump check, then cosmetic relaxation (squash/stretch, cape).

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::move_body;
use super::projectile::{BulletOwner, BulletPool};
use super::room::{ParticleKind, Room, RoomCoord, World};
use super::tick::TickInput;
use crate::audio::Cue;
use crate::tuning::Tuning;

pub const PLAYER_SIZE: Vec2 = Vec2::new(20.0, 40.0);
/// Where the player starts and returns to after losing all health
pub const SPAWN_POINT: Vec2 = Vec2::new(100.0, 300.0);
pub const CAPE_NODES: usize = 8;
const CAPE_LINK: f32 = 5.0;
/// Sword reach in front of the player's center
const MELEE_REACH: f32 = 40.0;
const DOWN_SHOT_DAMAGE: i32 = 1;
/// Screen shake ticks applied when hurt
const HURT_SHAKE: u32 = 30;

/// Active flag, countdown and cooldown of a timed ability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityTimer {
    pub active: bool,
    pub timer: u32,
    pub cooldown: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pistol {
    pub owned: bool,
    pub ammo: u32,
    pub max_ammo: u32,
    /// Ticks until the next shot is allowed
    pub cooldown: u32,
    /// Ticks until the clip refills (0 = not reloading)
    pub reload: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    // === Body ===
    /// Top-left corner in world pixels
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub grounded: bool,
    /// +1 right, -1 left
    pub facing: f32,

    // === Health ===
    pub hp: i32,
    pub max_hp: i32,
    /// Invulnerability ticks after a hit
    pub hit_timer: u32,
    pub shake_timer: u32,

    // === Input memory ===
    pub jump_buffer: u32,

    // === Abilities ===
    pub has_sword: bool,
    pub attack: AbilityTimer,
    pub dash: AbilityTimer,
    pub pistol: Pistol,
    pub has_down_shot: bool,
    pub down_shot_cooldown: u32,
    /// Shorter dash cooldown
    pub momentum_dash: bool,

    // === Collectibles ===
    pub cores: u32,
    pub shrines: u32,

    // === Cosmetic ===
    pub squash: f32,
    pub stretch: f32,
    pub cape: [Vec2; CAPE_NODES],
}

impl Player {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            pos: SPAWN_POINT,
            vel: Vec2::ZERO,
            size: PLAYER_SIZE,
            grounded: false,
            facing: 1.0,
            hp: tuning.player_max_hp,
            max_hp: tuning.player_max_hp,
            hit_timer: 0,
            shake_timer: 0,
            jump_buffer: 0,
            has_sword: false,
            attack: AbilityTimer::default(),
            dash: AbilityTimer::default(),
            pistol: Pistol {
                max_ammo: tuning.pistol_max_ammo,
                ..Default::default()
            },
            has_down_shot: false,
            down_shot_cooldown: 0,
            momentum_dash: false,
            cores: 0,
            shrines: 0,
            squash: 1.0,
            stretch: 1.0,
            cape: [SPAWN_POINT; CAPE_NODES],
        }
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    /// Room containing the player's center
    pub fn room(&self) -> RoomCoord {
        RoomCoord::containing(self.center())
    }

    /// Apply one point of damage. Ignored while invulnerable or dashing.
    /// Returns true if the hit landed.
    pub fn take_damage(&mut self, tuning: &Tuning, cues: &mut Vec<Cue>) -> bool {
        if self.hit_timer > 0 || self.dash.active {
            return false;
        }
        self.hp -= 1;
        self.hit_timer = tuning.hit_invuln_ticks;
        self.shake_timer = HURT_SHAKE;
        self.vel = Vec2::new(-self.facing * 7.0, -4.0);
        cues.push(Cue::Hit);
        if self.hp <= 0 {
            log::info!("Player fell; returning to spawn");
            self.hp = self.max_hp;
            self.pos = SPAWN_POINT;
            self.vel = Vec2::ZERO;
        }
        true
    }

    pub fn heal(&mut self, amount: i32) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    /// Fill the clip and cancel any reload
    pub fn refill_ammo(&mut self) {
        self.pistol.ammo = self.pistol.max_ammo;
        self.pistol.reload = 0;
    }

    fn dash_cooldown(&self, tuning: &Tuning) -> u32 {
        if self.momentum_dash {
            tuning.dash_cooldown_upgraded
        } else {
            tuning.dash_cooldown
        }
    }

    fn try_buffered_jump(&mut self, tuning: &Tuning, fx: &mut Vec<(Vec2, ParticleKind)>) {
        if self.jump_buffer > 0 && self.grounded {
            self.vel.y = tuning.jump_power;
            self.grounded = false;
            self.jump_buffer = 0;
            self.stretch = 1.4;
            self.squash = 0.7;
            let feet = Vec2::new(self.pos.x + self.size.x / 2.0, self.pos.y + self.size.y);
            fx.extend(std::iter::repeat_n((feet, ParticleKind::Dust), 8));
        }
    }

    fn update_cape(&mut self) {
        let anchor_x = if self.facing > 0.0 {
            self.pos.x + self.size.x
        } else {
            self.pos.x
        };
        self.cape[0] = Vec2::new(anchor_x, self.pos.y + 15.0);
        for i in 1..CAPE_NODES {
            let prev = self.cape[i - 1];
            let node = &mut self.cape[i];
            node.y += 0.4;
            node.x -= self.vel.x * 0.3 + self.facing * 0.5;
            let d = *node - prev;
            let len = d.length();
            if len > CAPE_LINK {
                *node = prev + d * (CAPE_LINK / len);
            }
        }
    }
}

/// Advance the player by one tick
pub fn update(
    player: &mut Player,
    world: &mut World,
    bullets: &mut BulletPool,
    input: &TickInput,
    tuning: &Tuning,
    rng: &mut impl Rng,
    cues: &mut Vec<Cue>,
) {
    let here = player.room();
    let mut fx: Vec<(Vec2, ParticleKind)> = Vec::new();

    update_abilities(player, world.room_mut(here), bullets, input, tuning, rng, cues, &mut fx);

    if input.jump_pressed {
        player.jump_buffer = tuning.jump_buffer_ticks;
    }
    if input.right {
        player.vel.x += tuning.accel;
        player.facing = 1.0;
    }
    if input.left {
        player.vel.x -= tuning.accel;
        player.facing = -1.0;
    }

    player.try_buffered_jump(tuning, &mut fx);
    player.vel.y += tuning.gravity;

    let was_grounded = player.grounded;
    let result = move_body(
        world,
        &mut player.pos,
        &mut player.vel,
        player.size,
        &mut player.grounded,
    );
    if result.landed() && !was_grounded {
        player.squash = 1.3;
        player.stretch = 0.8;
        let feet = Vec2::new(player.pos.x + player.size.x / 2.0, player.pos.y + player.size.y);
        fx.extend(std::iter::repeat_n((feet, ParticleKind::Dust), 5));
    }

    player.try_buffered_jump(tuning, &mut fx);
    player.jump_buffer = player.jump_buffer.saturating_sub(1);

    player.squash += (1.0 - player.squash) * 0.25;
    player.stretch += (1.0 - player.stretch) * 0.25;
    player.update_cape();

    if let Some(room) = world.room_mut(here) {
        let origin = room.origin();
        for (at, kind) in fx {
            room.spawn_particle(rng, at - origin, kind);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn update_abilities(
    player: &mut Player,
    mut room: Option<&mut Room>,
    bullets: &mut BulletPool,
    input: &TickInput,
    tuning: &Tuning,
    rng: &mut impl Rng,
    cues: &mut Vec<Cue>,
    fx: &mut Vec<(Vec2, ParticleKind)>,
) {
    // Sword
    player.attack.cooldown = player.attack.cooldown.saturating_sub(1);
    if input.attack && player.has_sword && !player.attack.active && player.attack.cooldown == 0 {
        player.attack.active = true;
        player.attack.timer = tuning.attack_ticks;
        player.attack.cooldown = tuning.attack_cooldown;
        if let Some(room) = room.as_deref_mut() {
            melee_strike(player, room, tuning, rng, cues);
        }
    }
    if player.attack.timer > 0 {
        player.attack.timer -= 1;
    } else {
        player.attack.active = false;
    }

    // Dash
    player.dash.cooldown = player.dash.cooldown.saturating_sub(1);
    if input.dash && player.dash.cooldown == 0 && !player.dash.active {
        player.dash.active = true;
        player.dash.timer = tuning.dash_ticks;
        player.vel.x = player.facing * tuning.dash_power;
        player.dash.cooldown = player.dash_cooldown(tuning);
        player.stretch = 1.6;
        player.squash = 0.6;
        fx.extend(std::iter::repeat_n((player.center(), ParticleKind::Dash), 15));
    }
    if player.dash.active {
        player.dash.timer = player.dash.timer.saturating_sub(1);
        if player.dash.timer == 0 {
            player.dash.active = false;
        }
        player.vel.x *= 0.98;
    } else {
        player.vel.x *= tuning.friction;
    }

    // Pistol
    let pistol = &mut player.pistol;
    pistol.cooldown = pistol.cooldown.saturating_sub(1);
    if pistol.reload > 0 {
        pistol.reload -= 1;
        if pistol.reload == 0 {
            pistol.ammo = pistol.max_ammo;
        }
    }
    if input.fire && pistol.owned && pistol.ammo > 0 && pistol.cooldown == 0 && pistol.reload == 0 {
        let dir = player.facing;
        let muzzle = player.center() + Vec2::new(dir * 8.0, -4.0);
        let spread = (rng.random::<f32>() - 0.5) * tuning.pistol_spread;
        let vel = Vec2::new(
            spread.cos() * dir * tuning.pistol_bullet_speed,
            spread.sin() * tuning.pistol_bullet_speed,
        );
        bullets.spawn(muzzle, vel, tuning.pistol_damage, BulletOwner::Player);
        let pistol = &mut player.pistol;
        pistol.ammo -= 1;
        pistol.cooldown = tuning.pistol_fire_rate;
        if pistol.ammo == 0 {
            pistol.reload = tuning.pistol_reload_ticks;
        }
        player.vel.x -= dir * 0.6;
        fx.push((muzzle, ParticleKind::Dash));
        cues.push(Cue::Fire);
    }

    // Down-shot
    player.down_shot_cooldown = player.down_shot_cooldown.saturating_sub(1);
    if input.down_shot && player.has_down_shot && player.down_shot_cooldown == 0 && !player.grounded {
        let at = Vec2::new(player.pos.x + player.size.x / 2.0, player.pos.y + player.size.y);
        bullets.spawn(
            at,
            Vec2::new(0.0, tuning.down_shot_speed),
            DOWN_SHOT_DAMAGE,
            BulletOwner::Player,
        );
        player.vel.y = player.vel.y.min(tuning.down_shot_boost);
        player.down_shot_cooldown = tuning.down_shot_cooldown;
        fx.push((at, ParticleKind::Dash));
        cues.push(Cue::Fire);
    }
}

/// Damage every enemy inside the swing on the facing side. Returns hits.
fn melee_strike(player: &Player, room: &mut Room, tuning: &Tuning, rng: &mut impl Rng, cues: &mut Vec<Cue>) -> usize {
    let center = player.center() - room.origin();
    let mut struck = Vec::new();
    for (i, e) in room.enemies.iter_mut().enumerate() {
        let dx = e.pos.x - center.x;
        let in_front = dx * player.facing >= 0.0 && dx.abs() <= MELEE_REACH + e.size.x / 2.0;
        let level = (e.pos.y - center.y).abs() < (player.size.y + e.size.y) / 2.0;
        if in_front && level {
            e.hp -= tuning.attack_damage;
            struck.push(i);
        }
    }
    for &i in &struck {
        let at = room.enemies[i].pos;
        room.spawn_hit_spark(rng, at);
    }
    if !struck.is_empty() {
        cues.push(Cue::Hit);
    }
    struck.len()
}
