//! Fixed timestep simulation tick
//!
//! Core game loop that advances the simulation deterministically. Order:
//! intro (exclusive), player physics, projectiles, current-room mechanics,
//! AI, director, scheduled actions, particles, timers, camera.

use serde::{Deserialize, Serialize};

use super::ai::{self, AiCtx};
use super::director;
use super::mechanics;
use super::player;
use super::state::GameState;

/// Input intents for a single tick (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    /// Jump held
    pub jump: bool,
    /// Jump went down this tick (feeds the jump buffer)
    pub jump_pressed: bool,
    pub attack: bool,
    pub dash: bool,
    pub fire: bool,
    pub down_shot: bool,
    /// Ask the intro to end
    pub skip_cutscene: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    state.time_ticks += 1;

    if state.cutscene.active {
        if input.skip_cutscene {
            state.cutscene.request_skip();
        }
        state
            .cutscene
            .advance(&mut state.world, &mut state.player, &mut state.camera, &mut state.rng);
        state.camera.step();
        return;
    }

    let GameState {
        rng,
        time_ticks,
        tuning,
        world,
        player,
        camera,
        cutscene,
        bullets,
        cues,
        ..
    } = state;
    let now = *time_ticks;

    // Physics
    player::update(player, world, bullets, input, tuning, rng, cues);
    let swung_in = player.room();

    // Projectiles; anything they killed goes this tick
    let report = bullets.advance(world, player, tuning, rng, cues);
    // a fatal hit sends the player back to spawn, so read the room after
    let here = player.room();
    for coord in report.struck_rooms.iter().copied().chain([swung_in, here]) {
        if let Some(room) = world.room_mut(coord) {
            ai::reap_dead(room, rng, cues);
        }
    }

    if let Some(room) = world.room_mut(here) {
        // Pickups, hazards and set-pieces
        mechanics::collect_items(room, player, tuning, cues);
        mechanics::update_props(room, player, tuning, rng, cues);
        mechanics::update_room_kind(room, player, now, rng);

        // AI
        let mut ctx = AiCtx {
            player: &mut *player,
            bullets: &mut *bullets,
            tuning: &*tuning,
            rng: &mut *rng,
            cues: &mut *cues,
        };
        ai::update_room(room, &mut ctx);

        // Director
        director::update_encounter(room, here, rng, cues);
        director::update_pickup_encounter(room, rng);

        ai::age_particles(room, player, tuning, rng, cues);
    }

    for room in world.rooms_mut() {
        director::run_pending(room, now, rng);
    }

    player.hit_timer = player.hit_timer.saturating_sub(1);
    player.shake_timer = player.shake_timer.saturating_sub(1);

    cutscene.first_step(world.room_mut(player.room()), player, input.left || input.right);

    camera.follow(player.room().origin(), player.vel.x);
    camera.step();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Cue;
    use crate::consts::*;
    use crate::sim::cutscene::INTRO_TICKS;
    use crate::sim::entity::{EnemyKind, EnemySpec};
    use crate::sim::projectile::BulletOwner;
    use crate::sim::room::{Item, ItemKind, ParticleKind, Prop, PropKind, Room, RoomCoord, RoomKind, World};
    use crate::tuning::Tuning;
    use glam::Vec2;

    fn flat_world() -> World {
        let mut world = World::new();
        let mut room = Room::new(RoomCoord::new(0, 0), RoomKind::Forest);
        room.fill_area(0, 40, ROOM_WIDTH_TILES as i32, 20, TILE_GROUND);
        world.insert(room);
        world
    }

    #[test]
    fn test_player_bullet_kills_crawler_end_to_end() {
        let mut world = flat_world();
        let room = world.room_mut(RoomCoord::new(0, 0)).unwrap();
        let mut rng = rand_pcg::Pcg32::new(1, 1);
        room.enemies
            .push(EnemySpec::new(EnemyKind::Crawler, 600.0, 500.0, 1).spawn(&mut rng));

        let mut state = GameState::with_world(9, world, Tuning::default());
        state
            .bullets
            .spawn(Vec2::new(590.0, 500.0), Vec2::new(10.0, 0.0), 1, BulletOwner::Player);
        assert_eq!(state.current_room().unwrap().enemies.len(), 1);

        tick(&mut state, &TickInput::default());

        let room = state.current_room().unwrap();
        assert!(room.enemies.is_empty());
        assert!(state.bullets.is_empty());
        let burst = room
            .particles
            .iter()
            .filter(|p| p.kind == ParticleKind::Death)
            .count();
        assert_eq!(burst, ai::DEATH_BURST);
    }

    #[test]
    fn test_dead_enemy_leaves_room_once() {
        let mut world = flat_world();
        let room = world.room_mut(RoomCoord::new(0, 0)).unwrap();
        let mut rng = rand_pcg::Pcg32::new(1, 1);
        room.enemies
            .push(EnemySpec::new(EnemyKind::Crawler, 300.0, 500.0, 3).spawn(&mut rng));
        room.enemies
            .push(EnemySpec::new(EnemyKind::Crawler, 600.0, 500.0, 1).spawn(&mut rng));

        let mut state = GameState::with_world(9, world, Tuning::default());
        state
            .bullets
            .spawn(Vec2::new(590.0, 500.0), Vec2::new(10.0, 0.0), 1, BulletOwner::Player);
        let deaths = |state: &GameState| {
            state
                .current_room()
                .unwrap()
                .particles
                .iter()
                .filter(|p| p.kind == ParticleKind::Death)
                .count()
        };

        tick(&mut state, &TickInput::default());
        assert_eq!(state.current_room().unwrap().enemies.len(), 1);
        assert_eq!(deaths(&state), ai::DEATH_BURST);

        for _ in 0..5 {
            let before = state.current_room().unwrap().enemies[0].pos;
            tick(&mut state, &TickInput::default());
            let room = state.current_room().unwrap();
            assert_eq!(room.enemies.len(), 1);
            assert_eq!(room.enemies[0].hp, 3);
            assert_ne!(room.enemies[0].pos.x, before.x);
            assert_eq!(deaths(&state), ai::DEATH_BURST);
        }
    }

    #[test]
    fn test_respawn_runs_spawn_room_same_tick() {
        let mut world = flat_world();
        let mut next = Room::new(RoomCoord::new(1, 0), RoomKind::Forest);
        next.fill_area(0, 40, ROOM_WIDTH_TILES as i32, 20, TILE_GROUND);
        world.insert(next);
        // sits under the spawn point
        world
            .room_mut(RoomCoord::new(0, 0))
            .unwrap()
            .items
            .push(Item::new(ItemKind::Core, 110.0, 300.0));

        let mut state = GameState::with_world(4, world, Tuning::default());
        state.player.pos = RoomCoord::new(1, 0).origin() + Vec2::new(600.0, 600.0);
        state.player.hp = 1;
        let aim = state.player.center() - Vec2::new(6.0, 0.0);
        state.bullets.spawn(aim, Vec2::new(6.0, 0.0), 1, BulletOwner::Enemy);

        tick(&mut state, &TickInput::default());

        assert_eq!(state.player_room(), RoomCoord::new(0, 0));
        assert_eq!(state.player.hp, state.player.max_hp);
        assert_eq!(state.player.cores, 1);
    }

    #[test]
    fn test_first_move_after_intro_sways_trunk() {
        let mut world = flat_world();
        world
            .room_mut(RoomCoord::new(0, 0))
            .unwrap()
            .props
            .push(Prop::new(PropKind::Trunk, 600.0, 0.0, 40.0, ROOM_H));
        let mut state = GameState::with_world(2, world, Tuning::default());
        assert!(state.cutscene.completed);

        tick(&mut state, &TickInput::default());
        assert_eq!(state.current_room().unwrap().props[0].twitch, 0.0);

        let run = TickInput {
            right: true,
            ..Default::default()
        };
        tick(&mut state, &run);
        assert_eq!(state.current_room().unwrap().props[0].twitch, 8.0);
        tick(&mut state, &run);
        assert!(state.current_room().unwrap().props[0].twitch < 8.0);
    }

    #[test]
    fn test_boss_activates_on_entry() {
        let mut state = GameState::new(3).unwrap();
        state.skip_intro();
        let boss_room = RoomCoord::new(4, 0);
        state.player.pos = boss_room.origin() + Vec2::new(100.0, 600.0);

        tick(&mut state, &TickInput::default());

        let room = state.world.room(boss_room).unwrap();
        assert!(room.boss_active);
        assert!(room.locked);
        let titan = room
            .enemies
            .iter()
            .find(|e| e.kind() == EnemyKind::RootTitan)
            .unwrap();
        assert_eq!(titan.hp, titan.max_hp);
    }

    #[test]
    fn test_arena_locks_on_entry() {
        let mut state = GameState::new(3).unwrap();
        state.skip_intro();
        let gate = RoomCoord::new(10, 0);
        state.player.pos = gate.origin() + Vec2::new(100.0, 600.0);
        tick(&mut state, &TickInput::default());
        let room = state.world.room(gate).unwrap();
        assert!(room.locked);
        assert_eq!(room.enemies.len(), 6);
        assert!(state.drain_cues().contains(&Cue::Spawn));
        assert!(state.cues.is_empty());
    }

    #[test]
    fn test_intro_blocks_control_then_hands_back() {
        let mut state = GameState::new(5).unwrap();
        let run = TickInput {
            right: true,
            ..Default::default()
        };
        tick(&mut state, &run);
        assert!(state.cutscene.active);
        assert_eq!(state.player.vel, Vec2::ZERO);

        for _ in 1..INTRO_TICKS {
            tick(&mut state, &run);
        }
        assert!(!state.cutscene.active);
        assert!(state.cutscene.completed);

        let x = state.player.pos.x;
        tick(&mut state, &run);
        assert!(state.player.pos.x > x);
    }

    #[test]
    fn test_skip_request_ends_intro() {
        let mut state = GameState::new(5).unwrap();
        tick(&mut state, &TickInput::default());
        tick(
            &mut state,
            &TickInput {
                skip_cutscene: true,
                ..Default::default()
            },
        );
        assert!(state.cutscene.completed);
        assert_eq!(state.time_ticks, 2);
    }

    #[test]
    fn test_same_seed_same_run() {
        let script = |t: u64| TickInput {
            right: t % 90 < 60,
            left: t % 90 >= 75,
            jump_pressed: t % 45 == 0,
            dash: t % 120 == 30,
            attack: t % 20 == 0,
            ..Default::default()
        };
        let mut a = GameState::new(77).unwrap();
        let mut b = GameState::new(77).unwrap();
        a.skip_intro();
        b.skip_intro();
        for t in 0..600 {
            tick(&mut a, &script(t));
            tick(&mut b, &script(t));
        }
        assert_eq!(a.player.pos, b.player.pos);
        let va = serde_json::to_string(&a.view()).unwrap();
        let vb = serde_json::to_string(&b.view()).unwrap();
        assert_eq!(va, vb);
    }

    #[test]
    fn test_timers_count_down() {
        let mut state = GameState::with_world(1, flat_world(), Tuning::default());
        state.player.hit_timer = 2;
        state.player.shake_timer = 1;
        tick(&mut state, &TickInput::default());
        assert_eq!(state.player.hit_timer, 1);
        assert_eq!(state.player.shake_timer, 0);
    }
}
