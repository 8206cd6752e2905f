//! Smoothed room-following camera

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Smoothing factor during normal play
pub const PLAY_LERP: f32 = 0.15;
/// Smoothing factor while the intro runs
pub const INTRO_LERP: f32 = 0.12;
/// Horizontal speed above which the camera leads the player
const LEAD_SPEED: f32 = 2.0;
const LEAD_FACTOR: f32 = 15.0;

/// View position is the top-left corner of the visible room area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub pos: Vec2,
    pub target: Vec2,
    pub lerp: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            target: Vec2::ZERO,
            lerp: PLAY_LERP,
        }
    }
}

impl Camera {
    /// Snap both position and target
    pub fn snap(&mut self, at: Vec2) {
        self.pos = at;
        self.target = at;
    }

    /// Frame the player's room, leading in the direction of fast travel
    pub fn follow(&mut self, room_origin: Vec2, player_vx: f32) {
        let lead = if player_vx.abs() > LEAD_SPEED {
            player_vx * LEAD_FACTOR
        } else {
            0.0
        };
        self.target = room_origin + Vec2::new(lead, 0.0);
    }

    /// Ease toward the target
    pub fn step(&mut self) {
        self.pos += (self.target - self.pos) * self.lerp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_leads_only_when_fast() {
        let mut cam = Camera::default();
        cam.follow(Vec2::new(1280.0, 0.0), 1.5);
        assert_eq!(cam.target, Vec2::new(1280.0, 0.0));
        cam.follow(Vec2::new(1280.0, 0.0), -4.0);
        assert_eq!(cam.target, Vec2::new(1220.0, 0.0));
    }

    #[test]
    fn test_step_converges() {
        let mut cam = Camera::default();
        cam.target = Vec2::new(100.0, 50.0);
        cam.step();
        assert!((cam.pos.x - 15.0).abs() < 1e-4);
        for _ in 0..200 {
            cam.step();
        }
        assert!(cam.pos.distance(cam.target) < 0.01);
    }
}
