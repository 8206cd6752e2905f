//! Tile/Room store
//!
//! The world is a sparse grid of fixed-size rooms. Rooms tile world pixel
//! space with no gaps, so any world point maps to exactly one room
//! coordinate; a coordinate with no room is all air.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::director::{Encounter, PendingAction, PickupEncounter};
use super::entity::Enemy;
use crate::consts::*;
use crate::{room_of, room_origin};

/// Integer grid address of a room
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoomCoord {
    pub gx: i32,
    pub gy: i32,
}

impl RoomCoord {
    pub const fn new(gx: i32, gy: i32) -> Self {
        Self { gx, gy }
    }

    /// Room containing a world-space point
    pub fn containing(world: Vec2) -> Self {
        let (gx, gy) = room_of(world);
        Self { gx, gy }
    }

    /// World-space top-left of this room
    pub fn origin(self) -> Vec2 {
        room_origin(self.gx, self.gy)
    }
}

impl std::fmt::Display for RoomCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.gx, self.gy)
    }
}

/// Fixed-size grid of tile codes (row-major)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileGrid {
    width: usize,
    height: usize,
    cells: Vec<u8>,
}

impl TileGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![TILE_AIR; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Tile code at a cell, air when out of range
    pub fn get(&self, tx: i32, ty: i32) -> u8 {
        if tx < 0 || ty < 0 || tx as usize >= self.width || ty as usize >= self.height {
            return TILE_AIR;
        }
        self.cells[ty as usize * self.width + tx as usize]
    }

    /// Set a cell; writes outside the grid are ignored
    pub fn set(&mut self, tx: i32, ty: i32, val: u8) {
        if tx >= 0 && ty >= 0 && (tx as usize) < self.width && (ty as usize) < self.height {
            self.cells[ty as usize * self.width + tx as usize] = val;
        }
    }

    /// Fill a rectangle of cells, clipped to the grid
    pub fn fill(&mut self, x: i32, y: i32, w: i32, h: i32, val: u8) {
        for tx in x..x + w {
            for ty in y..y + h {
                self.set(tx, ty, val);
            }
        }
    }

    /// Number of non-air cells
    pub fn solid_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != TILE_AIR).count()
    }
}

/// Flavor of a room; drives ambient effects and set-piece mechanics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomKind {
    Forest,
    CombatIntro,
    RuinedOutskirts,
    TownEdge,
    MiniBossRoom,
    ForestTrap,
    ForestSplit,
    ThornClimb,
    RuinedGate,
    HunterClearing,
    BrambleRange,
    ShatteredWatchpost,
    Windpass,
    HangingCanopy,
    BrokenOverpass,
    RunnerShrine,
    OvergrownGauntlet,
    CanopyBreak,
    EchoGrove,
    PistolArena,
}

impl RoomKind {
    /// Zone label for HUDs
    pub fn label(self) -> &'static str {
        match self {
            RoomKind::Forest => "forest",
            RoomKind::CombatIntro => "combat_intro",
            RoomKind::RuinedOutskirts => "ruined_outskirts",
            RoomKind::TownEdge => "town_edge",
            RoomKind::MiniBossRoom => "mini_boss_room",
            RoomKind::ForestTrap => "forest_trap",
            RoomKind::ForestSplit => "forest_split",
            RoomKind::ThornClimb => "thorn_climb",
            RoomKind::RuinedGate => "ruined_gate",
            RoomKind::HunterClearing => "hunter_clearing",
            RoomKind::BrambleRange => "bramble_range",
            RoomKind::ShatteredWatchpost => "shattered_watchpost",
            RoomKind::Windpass => "windpass",
            RoomKind::HangingCanopy => "hanging_canopy",
            RoomKind::BrokenOverpass => "broken_overpass",
            RoomKind::RunnerShrine => "runner_shrine",
            RoomKind::OvergrownGauntlet => "overgrown_gauntlet",
            RoomKind::CanopyBreak => "canopy_break",
            RoomKind::EchoGrove => "echo_grove",
            RoomKind::PistolArena => "pistol_arena",
        }
    }
}

/// Collectible item types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Sword,
    Potion,
    Pistol,
    PistolUpgrade,
    PistolAmmo,
    Core,
    Shrine,
    TrapMarker,
    MomentumModule,
    MomentumDash,
}

/// An item resting in a room (room-local position)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub pos: Vec2,
    pub kind: ItemKind,
    pub picked: bool,
}

impl Item {
    pub fn new(kind: ItemKind, x: f32, y: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            kind,
            picked: false,
        }
    }
}

/// Static or semi-static room furniture
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PropKind {
    Trunk,
    Building,
    Ruin,
    Vine,
    Platform,
    Wallrun,
    LowCeiling,
    Fragile,
    /// Intro-only prop
    IntroSword,
    /// Damages the player on overlap while active
    Spike { active: bool },
    /// Decorative scar left by the boss pulse
    Crack,
    /// Drops debris the first time the player touches it
    FallTrigger { triggered: bool },
    /// Shatters into debris the first time the player touches it
    Breakable { broken: bool },
}

/// A prop (room-local top-left position)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prop {
    pub pos: Vec2,
    pub size: Vec2,
    pub kind: PropKind,
    /// Cosmetic sway, decays back to zero
    #[serde(default)]
    pub twitch: f32,
}

impl Prop {
    pub fn new(kind: PropKind, x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
            kind,
            twitch: 0.0,
        }
    }

    pub fn spike(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self::new(PropKind::Spike { active: true }, x, y, w, h)
    }
}

/// Particle types; the kind also decides how alpha fades
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    Dust,
    Dash,
    Spark,
    Hit,
    Death,
    Spawn,
    Ambient,
    Telegraph,
    Fog,
    DebrisHint,
    Leaf,
    /// Boss seed: falls, hurts the player on contact, hatches on expiry
    Seed,
}

/// A room-local visual particle (seeds double as projectiles)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: u32,
    pub max_life: u32,
    pub size: f32,
    pub kind: ParticleKind,
}

impl Particle {
    pub fn new(kind: ParticleKind, pos: Vec2, vel: Vec2, life: u32, size: f32) -> Self {
        Self {
            pos,
            vel,
            life,
            max_life: life,
            size,
            kind,
        }
    }

    /// Derived opacity for renderers
    pub fn alpha(&self) -> f32 {
        match self.kind {
            ParticleKind::Seed => 1.0,
            ParticleKind::Dust
            | ParticleKind::Dash
            | ParticleKind::Fog
            | ParticleKind::DebrisHint
            | ParticleKind::Leaf => self.life as f32 / self.max_life.max(1) as f32,
            _ => (self.life as f32 / 50.0).min(1.0),
        }
    }
}

/// Per-room set-piece bookkeeping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomFlags {
    pub secret_found: bool,
    pub momentum_unlocked: bool,
    pub momentum_reward_spawned: bool,
    pub chase_active: bool,
    /// The gauntlet chase only runs once
    pub chase_done: bool,
    pub chase_timer: u32,
    pub collapse: CollapseStage,
    /// Granted once the collapse aftermath is cleared
    pub set_piece_reward: Option<Item>,
}

/// Canopy collapse progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollapseStage {
    #[default]
    Dormant,
    Counting { timer: u32 },
    Collapsed,
}

/// A single room and everything it owns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub coord: RoomCoord,
    pub kind: RoomKind,
    pub tiles: TileGrid,
    pub enemies: Vec<Enemy>,
    pub items: Vec<Item>,
    pub particles: Vec<Particle>,
    pub props: Vec<Prop>,
    /// Player is held in the room (arena or boss fight)
    pub locked: bool,
    pub boss_active: bool,
    pub encounter: Option<Encounter>,
    pub pickup_encounter: Option<PickupEncounter>,
    /// Side effects scheduled for a future tick
    pub pending: Vec<PendingAction>,
    pub flags: RoomFlags,
}

impl Room {
    pub fn new(coord: RoomCoord, kind: RoomKind) -> Self {
        Self {
            coord,
            kind,
            tiles: TileGrid::new(ROOM_WIDTH_TILES, ROOM_HEIGHT_TILES),
            enemies: Vec::new(),
            items: Vec::new(),
            particles: Vec::new(),
            props: Vec::new(),
            locked: false,
            boss_active: false,
            encounter: None,
            pickup_encounter: None,
            pending: Vec::new(),
            flags: RoomFlags::default(),
        }
    }

    /// Authoring-time single tile write
    pub fn set_tile(&mut self, tx: i32, ty: i32, val: u8) {
        self.tiles.set(tx, ty, val);
    }

    /// Authoring-time rectangle fill
    pub fn fill_area(&mut self, x: i32, y: i32, w: i32, h: i32, val: u8) {
        self.tiles.fill(x, y, w, h, val);
    }

    pub fn origin(&self) -> Vec2 {
        self.coord.origin()
    }

    /// Ambient particle with a randomized drift (room-local position)
    pub fn spawn_particle(&mut self, rng: &mut impl Rng, pos: Vec2, kind: ParticleKind) {
        let life = match kind {
            ParticleKind::Dust => 25,
            ParticleKind::Dash => 50,
            ParticleKind::DebrisHint => 120,
            ParticleKind::Fog => 250,
            _ => 40,
        };
        let vel = Vec2::new(
            (rng.random::<f32>() - 0.5) * 3.0,
            (rng.random::<f32>() - 0.5) * 2.0,
        );
        let size = 1.0 + rng.random::<f32>() * 0.5;
        self.particles.push(Particle::new(kind, pos, vel, life, size));
    }

    /// Small burst marking where something was struck
    pub fn spawn_hit_spark(&mut self, rng: &mut impl Rng, pos: Vec2) {
        let vel = Vec2::new(
            (rng.random::<f32>() - 0.5) * 2.0,
            (rng.random::<f32>() - 0.5) * 2.0,
        );
        self.particles.push(Particle::new(ParticleKind::Hit, pos, vel, 30, 3.0));
    }

    /// Count of unpicked items of a kind
    pub fn item_count(&self, kind: ItemKind) -> usize {
        self.items.iter().filter(|i| i.kind == kind && !i.picked).count()
    }
}

/// Sparse room registry
#[derive(Debug, Clone, Default)]
pub struct World {
    rooms: BTreeMap<RoomCoord, Room>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a room, returning any room it replaced
    pub fn insert(&mut self, room: Room) -> Option<Room> {
        self.rooms.insert(room.coord, room)
    }

    pub fn contains(&self, coord: RoomCoord) -> bool {
        self.rooms.contains_key(&coord)
    }

    pub fn room(&self, coord: RoomCoord) -> Option<&Room> {
        self.rooms.get(&coord)
    }

    pub fn room_mut(&mut self, coord: RoomCoord) -> Option<&mut Room> {
        self.rooms.get_mut(&coord)
    }

    /// Lookup by raw grid coordinates
    pub fn get_room(&self, gx: i32, gy: i32) -> Option<&Room> {
        self.room(RoomCoord::new(gx, gy))
    }

    /// Rooms in stable coordinate order
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    pub fn rooms_mut(&mut self) -> impl Iterator<Item = &mut Room> {
        self.rooms.values_mut()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Tile code at a world-space point (air when no room covers it)
    pub fn tile_at(&self, world: Vec2) -> u8 {
        let coord = RoomCoord::containing(world);
        let Some(room) = self.rooms.get(&coord) else {
            return TILE_AIR;
        };
        let lx = (world.x.rem_euclid(ROOM_W) / TILE_SIZE).floor() as i32;
        let ly = (world.y.rem_euclid(ROOM_H) / TILE_SIZE).floor() as i32;
        room.tiles.get(lx, ly)
    }

    /// Whether a world point blocks movement
    #[inline]
    pub fn is_solid(&self, world: Vec2) -> bool {
        self.tile_at(world) != TILE_AIR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn world_with_floor() -> World {
        let mut world = World::new();
        let mut room = Room::new(RoomCoord::new(0, 0), RoomKind::Forest);
        room.fill_area(0, 50, ROOM_WIDTH_TILES as i32, 10, TILE_GROUND);
        world.insert(room);
        world
    }

    #[test]
    fn test_tile_at_resolves_local_cell() {
        let world = world_with_floor();
        assert_eq!(world.tile_at(Vec2::new(5.0, 50.0 * TILE_SIZE + 1.0)), TILE_GROUND);
        assert_eq!(world.tile_at(Vec2::new(5.0, 49.0 * TILE_SIZE)), TILE_AIR);
    }

    #[test]
    fn test_item_count_skips_picked() {
        let mut room = Room::new(RoomCoord::new(0, 0), RoomKind::Forest);
        room.items.push(Item::new(ItemKind::Core, 10.0, 10.0));
        room.items.push(Item::new(ItemKind::Core, 40.0, 10.0));
        room.items.push(Item::new(ItemKind::Potion, 70.0, 10.0));
        assert_eq!(room.item_count(ItemKind::Core), 2);
        room.items[0].picked = true;
        assert_eq!(room.item_count(ItemKind::Core), 1);
        assert_eq!(room.item_count(ItemKind::Potion), 1);
    }

    #[test]
    fn test_fill_clips_to_grid() {
        let mut room = Room::new(RoomCoord::new(0, 0), RoomKind::Forest);
        room.fill_area(ROOM_WIDTH_TILES as i32 - 2, 0, 10, 1, TILE_GROUND);
        room.fill_area(-5, -5, 3, 3, TILE_GROUND);
        assert_eq!(room.tiles.solid_count(), 2);
    }

    #[test]
    fn test_neighbor_room_lookup() {
        let mut world = world_with_floor();
        let mut right = Room::new(RoomCoord::new(1, 0), RoomKind::CombatIntro);
        right.set_tile(0, 0, TILE_GROUND);
        world.insert(right);
        assert!(world.is_solid(Vec2::new(ROOM_W + 1.0, 1.0)));
        assert!(!world.is_solid(Vec2::new(ROOM_W - 1.0, 1.0)));
    }

    #[test]
    fn test_particle_alpha_by_kind() {
        let fog = Particle::new(ParticleKind::Fog, Vec2::ZERO, Vec2::ZERO, 250, 1.0);
        assert_eq!(fog.alpha(), 1.0);
        let mut hit = Particle::new(ParticleKind::Hit, Vec2::ZERO, Vec2::ZERO, 30, 1.0);
        assert!((hit.alpha() - 0.6).abs() < 1e-6);
        hit.life = 0;
        assert_eq!(hit.alpha(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_air_outside_rooms(x in -1.0e6f32..1.0e6, y in -1.0e6f32..1.0e6) {
            let world = world_with_floor();
            let coord = RoomCoord::containing(Vec2::new(x, y));
            prop_assume!(coord != RoomCoord::new(0, 0));
            prop_assert_eq!(world.tile_at(Vec2::new(x, y)), TILE_AIR);
            prop_assert!(!world.is_solid(Vec2::new(x, y)));
        }
    }
}
