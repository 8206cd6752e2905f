//! Game state and read-only views
//!
//! One `GameState` per running game. It owns everything a tick touches:
//! the world, the player, the global bullet pool, the camera, the intro
//! sequence and the single seeded RNG.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use super::camera::Camera;
use super::cutscene::Cutscene;
use super::player::Player;
use super::projectile::{Bullet, BulletPool};
use super::room::{Room, RoomCoord, World};
use super::worldgen::{BuildError, ancient_forest, build};
use crate::audio::Cue;
use crate::tuning::Tuning;

/// Complete simulation context
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Every random roll in the simulation draws from here
    pub rng: Pcg32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub tuning: Tuning,
    pub world: World,
    pub player: Player,
    pub camera: Camera,
    /// Live bullets from every owner, in world space
    pub bullets: BulletPool,
    pub cutscene: Cutscene,
    /// Audio cues emitted since the last drain
    pub cues: Vec<Cue>,
}

impl GameState {
    /// Build the authored world and start the intro
    pub fn new(seed: u64) -> Result<Self, BuildError> {
        Self::with_tuning(seed, Tuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: Tuning) -> Result<Self, BuildError> {
        let mut rng = Pcg32::seed_from_u64(seed);
        let world = build(ancient_forest(), &mut rng)?;
        let mut state = Self::assemble(seed, rng, world, tuning);
        state.cutscene = Cutscene::start(&mut state.camera);
        log::info!("New game (seed {seed})");
        Ok(state)
    }

    /// Run on a caller-built world with no intro
    pub fn with_world(seed: u64, world: World, tuning: Tuning) -> Self {
        let mut state = Self::assemble(seed, Pcg32::seed_from_u64(seed), world, tuning);
        state.skip_intro();
        state
    }

    fn assemble(seed: u64, rng: Pcg32, world: World, tuning: Tuning) -> Self {
        let player = Player::new(&tuning);
        Self {
            seed,
            rng,
            time_ticks: 0,
            tuning,
            world,
            player,
            camera: Camera::default(),
            bullets: BulletPool::new(),
            cutscene: Cutscene::finished(),
            cues: Vec::new(),
        }
    }

    /// Hand control to the player immediately
    pub fn skip_intro(&mut self) {
        self.cutscene = Cutscene::finished();
        self.camera = Camera::default();
        self.camera.snap(self.player_room().origin());
    }

    /// Room containing the player's center
    pub fn player_room(&self) -> RoomCoord {
        self.player.room()
    }

    pub fn current_room(&self) -> Option<&Room> {
        self.world.room(self.player_room())
    }

    /// Take the cues emitted since the last call
    pub fn drain_cues(&mut self) -> Vec<Cue> {
        std::mem::take(&mut self.cues)
    }

    /// Read-only snapshot for renderers and debug dumps
    pub fn view(&self) -> View<'_> {
        let room = self.current_room();
        View {
            time_ticks: self.time_ticks,
            coord: self.player_room(),
            zone: room.map(|r| r.kind.label()),
            room,
            player: &self.player,
            camera: &self.camera,
            bullets: self.bullets.as_slice(),
            cutscene: &self.cutscene,
        }
    }
}

/// What a renderer needs for one frame
#[derive(Debug, Serialize)]
pub struct View<'a> {
    pub time_ticks: u64,
    pub coord: RoomCoord,
    pub zone: Option<&'static str>,
    pub room: Option<&'a Room>,
    pub player: &'a Player,
    pub camera: &'a Camera,
    pub bullets: &'a [Bullet],
    pub cutscene: &'a Cutscene,
}
