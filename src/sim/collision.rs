//! Collision detection and response against the tile grid
//!
//! Bodies are axis-aligned boxes (top-left `pos`, `size`) moved in two
//! independent passes: horizontal fully resolved before vertical. Each pass
//! samples a pair of probe points on the leading edge and snaps to the tile
//! boundary with floor/ceil matching the direction of travel. Corner
//! catching from the split passes is expected.

use glam::Vec2;

use super::room::World;
use crate::consts::TILE_SIZE;

/// Inset of horizontal probes from the top and bottom edges
const SIDE_PROBE_INSET: f32 = 4.0;
/// Inset of vertical probes from the left and right edges
const FOOT_PROBE_INSET: f32 = 2.0;

/// Result of the vertical pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalHit {
    None,
    /// Came down onto a solid tile
    Landed,
    /// Bumped a ceiling moving up
    Ceiling,
}

/// Result of a full move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionResult {
    pub hit_left: bool,
    pub hit_right: bool,
    pub vertical: VerticalHit,
}

impl CollisionResult {
    pub fn landed(&self) -> bool {
        self.vertical == VerticalHit::Landed
    }
}

/// Integrate x and resolve against walls. Returns (hit_left, hit_right).
///
/// Left probes are checked first, then right probes against the already
/// snapped position.
pub fn resolve_horizontal(world: &World, pos: &mut Vec2, vel: &mut Vec2, size: Vec2) -> (bool, bool) {
    pos.x += vel.x;

    let top = pos.y + SIDE_PROBE_INSET;
    let bottom = pos.y + size.y - SIDE_PROBE_INSET;

    let mut hit_left = false;
    if world.is_solid(Vec2::new(pos.x, top)) || world.is_solid(Vec2::new(pos.x, bottom)) {
        pos.x = (pos.x / TILE_SIZE).ceil() * TILE_SIZE;
        vel.x = 0.0;
        hit_left = true;
    }

    let mut hit_right = false;
    let right = pos.x + size.x;
    if world.is_solid(Vec2::new(right, top)) || world.is_solid(Vec2::new(right, bottom)) {
        pos.x = (right / TILE_SIZE).floor() * TILE_SIZE - size.x;
        vel.x = 0.0;
        hit_right = true;
    }

    (hit_left, hit_right)
}

/// Integrate y and resolve floors/ceilings. Clears and sets `grounded`.
pub fn resolve_vertical(
    world: &World,
    pos: &mut Vec2,
    vel: &mut Vec2,
    size: Vec2,
    grounded: &mut bool,
) -> VerticalHit {
    pos.y += vel.y;
    *grounded = false;

    let left = pos.x + FOOT_PROBE_INSET;
    let right = pos.x + size.x - FOOT_PROBE_INSET;

    if vel.y > 0.0 {
        let feet = pos.y + size.y;
        if world.is_solid(Vec2::new(left, feet)) || world.is_solid(Vec2::new(right, feet)) {
            pos.y = (feet / TILE_SIZE).floor() * TILE_SIZE - size.y;
            vel.y = 0.0;
            *grounded = true;
            return VerticalHit::Landed;
        }
    } else if world.is_solid(Vec2::new(left, pos.y)) || world.is_solid(Vec2::new(right, pos.y)) {
        pos.y = (pos.y / TILE_SIZE).ceil() * TILE_SIZE;
        vel.y = 0.0;
        return VerticalHit::Ceiling;
    }

    VerticalHit::None
}

/// Move a box through the grid: horizontal pass, then vertical pass
pub fn move_body(world: &World, pos: &mut Vec2, vel: &mut Vec2, size: Vec2, grounded: &mut bool) -> CollisionResult {
    let (hit_left, hit_right) = resolve_horizontal(world, pos, vel, size);
    let vertical = resolve_vertical(world, pos, vel, size, grounded);
    CollisionResult {
        hit_left,
        hit_right,
        vertical,
    }
}

/// Strict AABB overlap (touching edges do not count)
#[inline]
pub fn overlaps(a_pos: Vec2, a_size: Vec2, b_pos: Vec2, b_size: Vec2) -> bool {
    a_pos.x + a_size.x > b_pos.x
        && a_pos.x < b_pos.x + b_size.x
        && a_pos.y + a_size.y > b_pos.y
        && a_pos.y < b_pos.y + b_size.y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::room::{Room, RoomCoord, RoomKind};

    const PLAYER: Vec2 = Vec2::new(20.0, 40.0);

    fn floor_world() -> World {
        let mut world = World::new();
        let mut room = Room::new(RoomCoord::new(0, 0), RoomKind::Forest);
        // floor top at y = 640
        room.fill_area(0, 40, ROOM_WIDTH_TILES as i32, 20, TILE_GROUND);
        // wall from x = 320
        room.fill_area(20, 0, 2, 40, TILE_GROUND);
        world.insert(room);
        world
    }

    #[test]
    fn test_landing_zeroes_vy_and_grounds() {
        let world = floor_world();
        let mut pos = Vec2::new(100.0, 595.0);
        let mut vel = Vec2::new(0.0, 9.0);
        let mut grounded = false;
        let hit = resolve_vertical(&world, &mut pos, &mut vel, PLAYER, &mut grounded);
        assert_eq!(hit, VerticalHit::Landed);
        assert_eq!(vel.y, 0.0);
        assert!(grounded);
        assert_eq!(pos.y, 600.0);
    }

    #[test]
    fn test_ceiling_snaps_down() {
        let mut world = World::new();
        let mut room = Room::new(RoomCoord::new(0, 0), RoomKind::Forest);
        room.fill_area(0, 0, ROOM_WIDTH_TILES as i32, 5, TILE_GROUND);
        world.insert(room);
        let mut pos = Vec2::new(100.0, 84.0);
        let mut vel = Vec2::new(0.0, -6.0);
        let mut grounded = true;
        let hit = resolve_vertical(&world, &mut pos, &mut vel, PLAYER, &mut grounded);
        assert_eq!(hit, VerticalHit::Ceiling);
        assert_eq!(pos.y, 80.0);
        assert_eq!(vel.y, 0.0);
        assert!(!grounded);
    }

    #[test]
    fn test_right_wall_snaps_flush() {
        let world = floor_world();
        let mut pos = Vec2::new(296.0, 500.0);
        let mut vel = Vec2::new(6.0, 0.0);
        let (left, right) = resolve_horizontal(&world, &mut pos, &mut vel, PLAYER);
        assert!(!left);
        assert!(right);
        assert_eq!(pos.x, 300.0);
        assert_eq!(vel.x, 0.0);
    }

    #[test]
    fn test_left_wall_snaps_flush() {
        let world = floor_world();
        // wall spans x 320..352
        let mut pos = Vec2::new(356.0, 500.0);
        let mut vel = Vec2::new(-6.0, 0.0);
        let (left, _) = resolve_horizontal(&world, &mut pos, &mut vel, PLAYER);
        assert!(left);
        assert_eq!(pos.x, 352.0);
        assert_eq!(vel.x, 0.0);
    }

    #[test]
    fn test_missing_room_is_free_fall() {
        let world = World::new();
        let mut pos = Vec2::new(-500.0, -500.0);
        let mut vel = Vec2::new(3.0, 8.0);
        let mut grounded = true;
        let result = move_body(&world, &mut pos, &mut vel, PLAYER, &mut grounded);
        assert_eq!(result.vertical, VerticalHit::None);
        assert!(!grounded);
        assert_eq!(pos, Vec2::new(-497.0, -492.0));
    }

    #[test]
    fn test_overlap_excludes_touching() {
        assert!(overlaps(Vec2::ZERO, Vec2::splat(10.0), Vec2::splat(5.0), Vec2::splat(10.0)));
        assert!(!overlaps(Vec2::ZERO, Vec2::splat(10.0), Vec2::new(10.0, 0.0), Vec2::splat(10.0)));
    }
}
