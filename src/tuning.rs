//! Data-driven gameplay tuning
//!
//! All per-frame physics and ability constants live here so they can be
//! tweaked from a JSON file without recompiling. Units are pixels and
//! ticks (one tick per rendered frame).

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a tuning file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid tuning json: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Gameplay constants for the player and abilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Movement ===
    pub gravity: f32,
    pub friction: f32,
    pub accel: f32,
    /// Vertical velocity applied on jump (negative = up)
    pub jump_power: f32,
    /// Ticks a jump press is remembered before landing
    pub jump_buffer_ticks: u32,

    // === Dash ===
    pub dash_power: f32,
    pub dash_ticks: u32,
    pub dash_cooldown: u32,
    /// Cooldown once the momentum dash upgrade is collected
    pub dash_cooldown_upgraded: u32,

    // === Sword ===
    pub attack_ticks: u32,
    pub attack_cooldown: u32,
    pub attack_damage: i32,

    // === Pistol ===
    pub pistol_damage: i32,
    pub pistol_fire_rate: u32,
    pub pistol_max_ammo: u32,
    pub pistol_reload_ticks: u32,
    pub pistol_bullet_speed: f32,
    /// Total random spread in radians
    pub pistol_spread: f32,

    // === Down-shot ===
    pub down_shot_speed: f32,
    pub down_shot_boost: f32,
    pub down_shot_cooldown: u32,

    // === Health ===
    pub player_max_hp: i32,
    pub hit_invuln_ticks: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: 0.42,
            friction: 0.85,
            accel: 0.65,
            jump_power: -9.8,
            jump_buffer_ticks: 4,

            dash_power: 12.0,
            dash_ticks: 10,
            dash_cooldown: 30,
            dash_cooldown_upgraded: 18,

            attack_ticks: 18,
            attack_cooldown: 15,
            attack_damage: 1,

            pistol_damage: 1,
            pistol_fire_rate: 12,
            pistol_max_ammo: 12,
            pistol_reload_ticks: 72,
            pistol_bullet_speed: 14.0,
            pistol_spread: 0.08,

            down_shot_speed: 10.0,
            down_shot_boost: -4.5,
            down_shot_cooldown: 24,

            player_max_hp: 3,
            hit_invuln_ticks: 50,
        }
    }
}

impl Tuning {
    /// Parse tuning from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "gravity": 0.5, "pistol_max_ammo": 6 }"#).unwrap();
        assert_eq!(tuning.gravity, 0.5);
        assert_eq!(tuning.pistol_max_ammo, 6);
        assert_eq!(tuning.jump_buffer_ticks, Tuning::default().jump_buffer_ticks);
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(matches!(
            Tuning::from_json("{ gravity: "),
            Err(TuningError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            Tuning::load("/definitely/not/here/tuning.json"),
            Err(TuningError::Io(_))
        ));
    }
}
