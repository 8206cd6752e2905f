//! Projectile subsystem
//!
//! A single global pool of bullets in world pixel space. A bullet's room is
//! recomputed from its position every tick; it is never stored.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::player::Player;
use super::room::{Particle, ParticleKind, RoomCoord, World};
use crate::audio::Cue;
use crate::tuning::Tuning;

/// Ticks a bullet lives without hitting anything
pub const BULLET_LIFE: u32 = 120;
/// Enemy bullet to player-center hit radius
pub const PLAYER_HIT_RADIUS: f32 = 12.0;
/// Player bullet to enemy anchor hit radius
pub const ENEMY_HIT_RADIUS: f32 = 18.0;

/// Which side fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletOwner {
    Player,
    Enemy,
}

/// Opaque handle returned by [`BulletPool::spawn`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BulletId(pub u32);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub id: BulletId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: u32,
    pub damage: i32,
    pub owner: BulletOwner,
}

/// What happened during one [`BulletPool::advance`]
#[derive(Debug, Clone, Default)]
pub struct BulletReport {
    /// Rooms whose enemies took damage this tick
    pub struck_rooms: Vec<RoomCoord>,
    pub player_hits: u32,
    pub tile_hits: u32,
    pub enemy_hits: u32,
    pub expired: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulletPool {
    bullets: Vec<Bullet>,
    next_id: u32,
}

impl BulletPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, pos: Vec2, vel: Vec2, damage: i32, owner: BulletOwner) -> BulletId {
        let id = BulletId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.bullets.push(Bullet {
            id,
            pos,
            vel,
            life: BULLET_LIFE,
            damage,
            owner,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.bullets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bullets.is_empty()
    }

    pub fn as_slice(&self) -> &[Bullet] {
        &self.bullets
    }

    /// Move every bullet and resolve terminations in fixed order:
    /// enemy bullet near player, solid tile, player bullet near enemy,
    /// lifetime. At most one termination applies per bullet.
    pub fn advance(
        &mut self,
        world: &mut World,
        player: &mut Player,
        tuning: &Tuning,
        rng: &mut impl Rng,
        cues: &mut Vec<Cue>,
    ) -> BulletReport {
        let mut report = BulletReport::default();
        self.bullets.retain_mut(|b| {
            b.pos += b.vel;
            b.life = b.life.saturating_sub(1);

            if b.owner == BulletOwner::Enemy && player.center().distance(b.pos) < PLAYER_HIT_RADIUS {
                player.take_damage(tuning, cues);
                report.player_hits += 1;
                return false;
            }

            let coord = RoomCoord::containing(b.pos);
            if world.is_solid(b.pos) {
                if let Some(room) = world.room_mut(coord) {
                    let local = b.pos - room.origin();
                    room.particles
                        .push(Particle::new(ParticleKind::Spark, local, Vec2::ZERO, 20, 3.0));
                }
                report.tile_hits += 1;
                return false;
            }

            if b.owner == BulletOwner::Player {
                if let Some(room) = world.room_mut(coord) {
                    let origin = room.origin();
                    let target = room
                        .enemies
                        .iter()
                        .rposition(|e| (origin + e.pos).distance(b.pos) < ENEMY_HIT_RADIUS);
                    if let Some(i) = target {
                        room.enemies[i].hp -= b.damage;
                        let at = room.enemies[i].pos;
                        room.spawn_hit_spark(rng, at);
                        if !report.struck_rooms.contains(&coord) {
                            report.struck_rooms.push(coord);
                        }
                        report.enemy_hits += 1;
                        return false;
                    }
                }
            }

            if b.life == 0 {
                report.expired += 1;
                return false;
            }
            true
        });

        report
    }
}
