//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (rooms by coordinate, entities by index)
//! - No rendering, audio or platform dependencies

pub mod ai;
pub mod boss;
pub mod camera;
pub mod collision;
pub mod cutscene;
pub mod director;
pub mod entity;
pub mod mechanics;
pub mod player;
pub mod projectile;
pub mod room;
pub mod state;
pub mod tick;
pub mod worldgen;

pub use boss::{BossAction, BossBrain, BossMode};
pub use camera::Camera;
pub use collision::{CollisionResult, VerticalHit, move_body};
pub use cutscene::Cutscene;
pub use director::{Encounter, EncounterStage, PickupEncounter};
pub use entity::{Enemy, EnemyKind, EnemySpec};
pub use player::Player;
pub use projectile::{Bullet, BulletId, BulletOwner, BulletPool};
pub use room::{Item, ItemKind, Particle, ParticleKind, Prop, PropKind, Room, RoomCoord, RoomKind, World};
pub use state::{GameState, View};
pub use tick::{TickInput, tick};
pub use worldgen::{BuildError, RoomPlan};
