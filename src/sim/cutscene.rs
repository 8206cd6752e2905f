//! Intro sequence
//!
//! While active the sequence owns the camera target and the player's body;
//! the regular player-control branch of the tick is skipped. Control is
//! handed back exactly once, when the timeline ends or a skip is requested.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::camera::{Camera, INTRO_LERP, PLAY_LERP};
use super::player::Player;
use super::room::{Particle, ParticleKind, Prop, PropKind, Room, RoomCoord, World};
use crate::consts::*;

/// Tick at which control returns to the player
pub const INTRO_TICKS: u32 = 660;
const FADE_END: u32 = 30;
const PAN_END: u32 = 240;
const LOWER_END: u32 = 420;
const LEAVES_END: u32 = 540;
const TWITCH_AT: u32 = 320;
const SWORD_TWITCH: f32 = 8.0;
/// Sway given to the first trunk or wallrun when the player first moves
const FIRST_STEP_TWITCH: f32 = 8.0;
/// Where the player walks from and to, relative to the first room's origin
const ENTRY_FROM_X: f32 = -40.0;
const ENTRY_TO_X: f32 = 80.0;
const ENTRY_Y: f32 = 300.0;

/// The room the intro plays in
pub const INTRO_ROOM: RoomCoord = RoomCoord::new(0, 0);

/// Cubic ease-out over [0, 1]
pub fn ease_out_cubic(t: f32) -> f32 {
    let u = 1.0 - t.clamp(0.0, 1.0);
    1.0 - u * u * u
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cutscene {
    pub active: bool,
    pub completed: bool,
    pub timer: u32,
    pub skip_requested: bool,
    /// Green wash opacity for renderers
    pub fade: f32,
    /// Title text opacity for renderers
    pub text_alpha: f32,
    sword_created: bool,
    #[serde(default)]
    first_step_done: bool,
}

impl Cutscene {
    /// Begin the intro and park the camera left of the first room
    pub fn start(camera: &mut Camera) -> Self {
        let origin = INTRO_ROOM.origin();
        camera.snap(origin + Vec2::new(-120.0, 0.0));
        camera.lerp = INTRO_LERP;
        log::info!("Intro started");
        Self {
            active: true,
            ..Default::default()
        }
    }

    /// A sequence that has already handed over control
    pub fn finished() -> Self {
        Self {
            completed: true,
            ..Default::default()
        }
    }

    /// Ask the sequence to end on its next advance
    pub fn request_skip(&mut self) {
        if self.active {
            self.skip_requested = true;
        }
    }

    /// Advance one tick. Returns true on the tick control is handed back.
    pub fn advance(&mut self, world: &mut World, player: &mut Player, camera: &mut Camera, rng: &mut impl Rng) -> bool {
        if !self.active {
            return false;
        }
        self.timer += 1;
        if self.skip_requested {
            self.timer = INTRO_TICKS;
        }
        let t = self.timer;
        let origin = INTRO_ROOM.origin();

        self.fade = if t < FADE_END {
            t as f32 / FADE_END as f32
        } else {
            1.0
        };

        let Some(room) = world.room_mut(INTRO_ROOM) else {
            log::warn!("Intro room {} missing; ending intro", INTRO_ROOM);
            self.finish(camera);
            return true;
        };

        if t < FADE_END && t % 6 == 0 {
            let at = Vec2::new(rng.random::<f32>() * ROOM_W, rng.random::<f32>() * 40.0);
            let vel = Vec2::new((rng.random::<f32>() - 0.5) * 0.2, 0.2 + rng.random::<f32>() * 0.2);
            room.particles.push(Particle::new(ParticleKind::Ambient, at, vel, 80, 2.0));
        }

        if (FADE_END..PAN_END).contains(&t) {
            let p = (t - FADE_END) as f32 / (PAN_END - FADE_END) as f32;
            let (from, to) = (origin.x - 120.0, origin.x + 160.0);
            camera.target = Vec2::new(from + (to - from) * ease_out_cubic(p), origin.y - 20.0);
        }

        if (PAN_END..LOWER_END).contains(&t) {
            let p = (t - PAN_END) as f32 / (LOWER_END - PAN_END) as f32;
            camera.target.y = origin.y + 40.0 * ease_out_cubic(p);
            if !self.sword_created {
                self.sword_created = true;
                room.props
                    .push(Prop::new(PropKind::IntroSword, 120.0, 320.0, 20.0, 6.0));
            }
            if t == TWITCH_AT {
                for prop in room.props.iter_mut().filter(|p| p.kind == PropKind::IntroSword) {
                    prop.twitch = SWORD_TWITCH;
                }
            }
        }

        if (LOWER_END..LEAVES_END).contains(&t) && t % 8 == 0 {
            let at = Vec2::new(rng.random::<f32>() * ROOM_W, -10.0);
            let vel = Vec2::new((rng.random::<f32>() - 0.5) * 0.3, 1.0 + rng.random::<f32>() * 0.5);
            room.particles.push(Particle::new(ParticleKind::Leaf, at, vel, 120, 2.0));
        }

        if (LEAVES_END..INTRO_TICKS).contains(&t) {
            let p = (t - LEAVES_END) as f32 / (INTRO_TICKS - LEAVES_END) as f32;
            let (from, to) = (origin.x + ENTRY_FROM_X, origin.x + ENTRY_TO_X);
            player.pos = Vec2::new(from + (to - from) * ease_out_cubic(p), origin.y + ENTRY_Y);
            player.vel = Vec2::ZERO;
            player.attack.active = false;
            player.dash.active = false;
            self.text_alpha = match t {
                580..620 => ((t - 580) as f32 / 10.0).min(1.0),
                620..650 => (1.0 - (t - 620) as f32 / 30.0).max(0.0),
                _ => self.text_alpha,
            };
        }

        for prop in room.props.iter_mut().filter(|p| p.kind == PropKind::IntroSword) {
            prop.twitch = (prop.twitch - 0.5).max(0.0);
            prop.pos.y -= prop.twitch * 0.01;
        }

        if t >= INTRO_TICKS {
            room.props.retain(|p| p.kind != PropKind::IntroSword);
            self.finish(camera);
            return true;
        }

        camera.lerp = INTRO_LERP;
        false
    }

    /// Nudge the scenery the first time the player moves after the intro.
    /// The first trunk or wallrun in `room` sways; a room without one gets a
    /// glint ahead of the player instead. Returns true on the tick it fires.
    pub fn first_step(&mut self, room: Option<&mut Room>, player: &Player, steering: bool) -> bool {
        if !self.completed || self.first_step_done {
            return false;
        }
        if !steering && player.vel.x.abs() <= 0.1 {
            return false;
        }
        self.first_step_done = true;
        let Some(room) = room else {
            return true;
        };
        let origin = room.origin();
        match room
            .props
            .iter_mut()
            .find(|p| matches!(p.kind, PropKind::Trunk | PropKind::Wallrun))
        {
            Some(prop) => prop.twitch += FIRST_STEP_TWITCH,
            None => {
                let at = player.pos - origin + Vec2::new(80.0, -40.0);
                room.particles
                    .push(Particle::new(ParticleKind::Ambient, at, Vec2::ZERO, 50, 4.0));
            }
        }
        log::debug!("First step after the intro in room {}", room.coord);
        true
    }

    fn finish(&mut self, camera: &mut Camera) {
        self.active = false;
        self.completed = true;
        self.fade = 0.0;
        self.text_alpha = 0.0;
        camera.lerp = PLAY_LERP;
        log::info!("Intro finished after {} ticks", self.timer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::room::RoomKind;
    use crate::tuning::Tuning;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn setup() -> (World, Player, Camera, Pcg32) {
        let mut world = World::new();
        world.insert(Room::new(INTRO_ROOM, RoomKind::Forest));
        (world, Player::new(&Tuning::default()), Camera::default(), Pcg32::seed_from_u64(2))
    }

    fn sword_count(world: &World) -> usize {
        world
            .room(INTRO_ROOM)
            .map(|r| {
                r.props
                    .iter()
                    .filter(|p| p.kind == PropKind::IntroSword)
                    .count()
            })
            .unwrap_or(0)
    }

    #[test]
    fn test_ease_out_cubic_endpoints() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert!(ease_out_cubic(0.5) > 0.5);
    }

    #[test]
    fn test_full_timeline_hands_back_once() {
        let (mut world, mut player, mut camera, mut rng) = setup();
        let mut cs = Cutscene::start(&mut camera);
        let mut handoffs = 0;
        for tick in 1..=INTRO_TICKS + 50 {
            if cs.advance(&mut world, &mut player, &mut camera, &mut rng) {
                handoffs += 1;
                assert_eq!(tick, INTRO_TICKS);
            }
            if tick == 400 {
                assert_eq!(sword_count(&world), 1);
            }
        }
        assert_eq!(handoffs, 1);
        assert!(!cs.active);
        assert!(cs.completed);
        assert_eq!(sword_count(&world), 0);
        assert_eq!(camera.lerp, PLAY_LERP);
        // walked in to the end of the entry lerp
        assert!((player.pos.x - ENTRY_TO_X).abs() < 0.5);
        assert_eq!(player.pos.y, ENTRY_Y);
    }

    #[test]
    fn test_first_step_sways_trunk_once() {
        let mut room = Room::new(INTRO_ROOM, RoomKind::Forest);
        room.props.push(Prop::new(PropKind::Ruin, 10.0, 0.0, 40.0, 40.0));
        room.props.push(Prop::new(PropKind::Trunk, 300.0, 0.0, 40.0, ROOM_H));
        room.props.push(Prop::new(PropKind::Trunk, 600.0, 0.0, 40.0, ROOM_H));
        let player = Player::new(&Tuning::default());
        let mut cs = Cutscene::finished();

        assert!(!cs.first_step(Some(&mut room), &player, false));
        assert!(cs.first_step(Some(&mut room), &player, true));
        assert!(!cs.first_step(Some(&mut room), &player, true));
        let twitches: Vec<f32> = room.props.iter().map(|p| p.twitch).collect();
        assert_eq!(twitches, vec![0.0, FIRST_STEP_TWITCH, 0.0]);
        assert!(room.particles.is_empty());
    }

    #[test]
    fn test_first_step_without_trunk_leaves_glint() {
        let mut room = Room::new(INTRO_ROOM, RoomKind::Forest);
        let mut player = Player::new(&Tuning::default());
        player.vel.x = 2.0;
        let mut cs = Cutscene::finished();
        assert!(cs.first_step(Some(&mut room), &player, false));
        assert_eq!(room.particles.len(), 1);
        assert_eq!(room.particles[0].pos, player.pos + Vec2::new(80.0, -40.0));
        assert_eq!(room.particles[0].life, 50);
    }

    #[test]
    fn test_first_step_waits_for_intro() {
        let (mut world, player, mut camera, _) = setup();
        let mut cs = Cutscene::start(&mut camera);
        assert!(!cs.first_step(world.room_mut(INTRO_ROOM), &player, true));
        assert!(!cs.first_step_done);
    }

    #[test]
    fn test_skip_finishes_same_tick() {
        let (mut world, mut player, mut camera, mut rng) = setup();
        let mut cs = Cutscene::start(&mut camera);
        for _ in 0..10 {
            cs.advance(&mut world, &mut player, &mut camera, &mut rng);
        }
        cs.request_skip();
        assert!(cs.advance(&mut world, &mut player, &mut camera, &mut rng));
        assert!(cs.completed);
        assert!(!cs.advance(&mut world, &mut player, &mut camera, &mut rng));
    }
}
