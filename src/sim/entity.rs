//! Enemy entities
//!
//! Every enemy carries an explicit [`Behavior`] variant; AI dispatch is a
//! match over it. Positions are room-local anchors (the point bullets and
//! melee hits are measured against).

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::boss::BossBrain;

/// Closed set of enemy kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Crawler,
    Flyer,
    Watcher,
    Debris,
    Swarm,
    MiniSwarm,
    FastSwarm,
    /// Primary phased boss
    RootTitan,
    /// Secondary floating boss
    GloomWeaver,
    MiniBoss,
}

impl EnemyKind {
    /// Default bounding size
    pub fn size(self) -> Vec2 {
        match self {
            EnemyKind::Crawler => Vec2::new(28.0, 20.0),
            EnemyKind::Flyer => Vec2::new(24.0, 20.0),
            EnemyKind::Watcher => Vec2::new(24.0, 28.0),
            EnemyKind::Debris => Vec2::new(16.0, 16.0),
            EnemyKind::Swarm => Vec2::new(24.0, 24.0),
            EnemyKind::MiniSwarm => Vec2::new(16.0, 16.0),
            EnemyKind::FastSwarm => Vec2::new(14.0, 14.0),
            EnemyKind::RootTitan => Vec2::new(80.0, 60.0),
            EnemyKind::GloomWeaver => Vec2::new(48.0, 48.0),
            EnemyKind::MiniBoss => Vec2::new(40.0, 40.0),
        }
    }

    /// Hit points when none are authored
    pub fn default_hp(self) -> i32 {
        match self {
            EnemyKind::Watcher => 3,
            EnemyKind::RootTitan | EnemyKind::GloomWeaver => 20,
            EnemyKind::MiniBoss => 6,
            _ => 1,
        }
    }

    pub fn is_boss(self) -> bool {
        matches!(self, EnemyKind::RootTitan | EnemyKind::GloomWeaver)
    }
}

/// Which flavor of swarm (size and speed scale)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwarmVariant {
    Normal,
    Mini,
    Fast,
}

impl SwarmVariant {
    pub fn speed_mult(self) -> f32 {
        match self {
            SwarmVariant::Normal => 1.0,
            SwarmVariant::Mini => 1.5,
            SwarmVariant::Fast => 2.0,
        }
    }
}

/// Kind-specific transient state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Behavior {
    Crawler {
        /// Patrol direction sign
        dir: f32,
    },
    Debris,
    Flyer {
        base_y: f32,
        phase: f32,
    },
    Watcher {
        cooldown: u32,
    },
    Swarm {
        variant: SwarmVariant,
        phase: f32,
    },
    RootTitan(Box<BossBrain>),
    GloomWeaver {
        phase: f32,
    },
    MiniBoss {
        dir: f32,
    },
}

/// A live enemy (room-local)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub behavior: Behavior,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub hp: i32,
    pub max_hp: i32,
    /// Facing sign (+1 right, -1 left)
    pub facing: f32,
}

impl Enemy {
    /// Discriminant of the behavior variant
    pub fn kind(&self) -> EnemyKind {
        match &self.behavior {
            Behavior::Crawler { .. } => EnemyKind::Crawler,
            Behavior::Debris => EnemyKind::Debris,
            Behavior::Flyer { .. } => EnemyKind::Flyer,
            Behavior::Watcher { .. } => EnemyKind::Watcher,
            Behavior::Swarm { variant, .. } => match variant {
                SwarmVariant::Normal => EnemyKind::Swarm,
                SwarmVariant::Mini => EnemyKind::MiniSwarm,
                SwarmVariant::Fast => EnemyKind::FastSwarm,
            },
            Behavior::RootTitan(_) => EnemyKind::RootTitan,
            Behavior::GloomWeaver { .. } => EnemyKind::GloomWeaver,
            Behavior::MiniBoss { .. } => EnemyKind::MiniBoss,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    /// Brain of the primary boss, if this is one
    pub fn boss_brain(&self) -> Option<&BossBrain> {
        match &self.behavior {
            Behavior::RootTitan(brain) => Some(&**brain),
            _ => None,
        }
    }

    /// Falling debris chunk with a random toss
    pub fn debris(rng: &mut impl Rng, pos: Vec2) -> Self {
        let side = 12.0 + rng.random::<f32>() * 12.0;
        Self {
            behavior: Behavior::Debris,
            pos,
            vel: Vec2::new(
                (rng.random::<f32>() - 0.5) * 3.0,
                -1.0 - rng.random::<f32>() * 2.0,
            ),
            size: Vec2::splat(side),
            hp: 1,
            max_hp: 1,
            facing: 1.0,
        }
    }

    /// Swarm of the given kind with one hit point
    pub fn swarm(rng: &mut impl Rng, kind: EnemyKind, pos: Vec2) -> Self {
        EnemySpec::new(kind, pos.x, pos.y, 1).spawn(rng)
    }
}

fn patrol_dir(rng: &mut impl Rng) -> f32 {
    if rng.random_bool(0.5) { -1.0 } else { 1.0 }
}

/// Authoring description of an enemy to spawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpec {
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub hp: i32,
}

impl EnemySpec {
    pub fn new(kind: EnemyKind, x: f32, y: f32, hp: i32) -> Self {
        Self {
            kind,
            pos: Vec2::new(x, y),
            hp,
        }
    }

    /// Spec with the kind's default hit points
    pub fn of(kind: EnemyKind, x: f32, y: f32) -> Self {
        Self::new(kind, x, y, kind.default_hp())
    }

    /// Materialize a live enemy
    pub fn spawn(&self, rng: &mut impl Rng) -> Enemy {
        let behavior = match self.kind {
            EnemyKind::Crawler => Behavior::Crawler {
                dir: patrol_dir(rng),
            },
            EnemyKind::Debris => Behavior::Debris,
            EnemyKind::Flyer => Behavior::Flyer {
                base_y: self.pos.y,
                phase: 0.0,
            },
            EnemyKind::Watcher => Behavior::Watcher { cooldown: 0 },
            EnemyKind::Swarm => Behavior::Swarm {
                variant: SwarmVariant::Normal,
                phase: rng.random::<f32>() * 100.0,
            },
            EnemyKind::MiniSwarm => Behavior::Swarm {
                variant: SwarmVariant::Mini,
                phase: rng.random::<f32>() * 100.0,
            },
            EnemyKind::FastSwarm => Behavior::Swarm {
                variant: SwarmVariant::Fast,
                phase: rng.random::<f32>() * 100.0,
            },
            EnemyKind::RootTitan => Behavior::RootTitan(Box::default()),
            EnemyKind::GloomWeaver => Behavior::GloomWeaver {
                phase: rng.random::<f32>() * 100.0,
            },
            EnemyKind::MiniBoss => Behavior::MiniBoss {
                dir: patrol_dir(rng),
            },
        };
        Enemy {
            behavior,
            pos: self.pos,
            vel: Vec2::ZERO,
            size: self.kind.size(),
            hp: self.hp,
            max_hp: self.hp,
            facing: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_spawn_preserves_kind() {
        let mut rng = Pcg32::seed_from_u64(7);
        for kind in [
            EnemyKind::Crawler,
            EnemyKind::Flyer,
            EnemyKind::Watcher,
            EnemyKind::Debris,
            EnemyKind::Swarm,
            EnemyKind::MiniSwarm,
            EnemyKind::FastSwarm,
            EnemyKind::RootTitan,
            EnemyKind::GloomWeaver,
            EnemyKind::MiniBoss,
        ] {
            let e = EnemySpec::of(kind, 10.0, 20.0).spawn(&mut rng);
            assert_eq!(e.kind(), kind);
            assert_eq!(e.hp, e.max_hp);
            assert_eq!(e.size, kind.size());
        }
    }

    #[test]
    fn test_only_titan_and_weaver_are_bosses() {
        assert!(EnemyKind::RootTitan.is_boss());
        assert!(EnemyKind::GloomWeaver.is_boss());
        assert!(!EnemyKind::MiniBoss.is_boss());
        assert!(!EnemyKind::Crawler.is_boss());
    }

    #[test]
    fn test_crawler_dir_is_unit() {
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..20 {
            let e = EnemySpec::new(EnemyKind::Crawler, 0.0, 0.0, 2).spawn(&mut rng);
            let Behavior::Crawler { dir } = e.behavior else {
                panic!("not a crawler");
            };
            assert!(dir == 1.0 || dir == -1.0);
        }
    }

    #[test]
    fn test_debris_tossed_upward() {
        let mut rng = Pcg32::seed_from_u64(11);
        let d = Enemy::debris(&mut rng, Vec2::new(50.0, 0.0));
        assert!(d.vel.y < -1.0 + f32::EPSILON);
        assert_eq!(d.hp, 1);
        assert!(d.size.x >= 12.0 && d.size.x <= 24.0);
    }
}
