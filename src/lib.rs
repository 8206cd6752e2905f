//! Ancient Forest - a room-based 2D action platformer
//!
//! Core modules:
//! - `sim`: Deterministic simulation (rooms, physics, AI, encounters)
//! - `tuning`: Data-driven gameplay constants
//! - `settings`: Player-facing preferences
//! - `audio`: Fire-and-forget cue boundary

pub mod audio;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec2;

/// World layout constants
pub mod consts {
    /// Nominal frame rate the simulation is tuned for (one tick per frame)
    pub const TICKS_PER_SECOND: u32 = 60;

    /// Side length of a square tile in pixels
    pub const TILE_SIZE: f32 = 16.0;
    /// Room width in tiles
    pub const ROOM_WIDTH_TILES: usize = 80;
    /// Room height in tiles
    pub const ROOM_HEIGHT_TILES: usize = 60;
    /// Room width in pixels (rooms tile world space with no gaps)
    pub const ROOM_W: f32 = ROOM_WIDTH_TILES as f32 * TILE_SIZE;
    /// Room height in pixels
    pub const ROOM_H: f32 = ROOM_HEIGHT_TILES as f32 * TILE_SIZE;

    /// Tile code for empty/air
    pub const TILE_AIR: u8 = 0;
    /// Tile code for plain ground
    pub const TILE_GROUND: u8 = 1;
}

/// Sign of a value, with zero mapping to zero (unlike `f32::signum`)
#[inline]
pub fn sign(v: f32) -> f32 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Room grid coordinate containing a world-space point
#[inline]
pub fn room_of(world: Vec2) -> (i32, i32) {
    (
        (world.x / consts::ROOM_W).floor() as i32,
        (world.y / consts::ROOM_H).floor() as i32,
    )
}

/// World-space origin (top-left pixel) of a room
#[inline]
pub fn room_origin(gx: i32, gy: i32) -> Vec2 {
    Vec2::new(gx as f32 * consts::ROOM_W, gy as f32 * consts::ROOM_H)
}
