//! Room mechanics: item pickup, prop hazards and triggers, and the
//! per-kind set-pieces. Everything here runs for the player's current room
//! only.

use glam::Vec2;
use rand::Rng;

use super::collision::overlaps;
use super::director::{ScheduledAction, schedule};
use super::entity::{Enemy, EnemyKind, EnemySpec};
use super::player::Player;
use super::room::{CollapseStage, Item, ItemKind, Particle, ParticleKind, PropKind, Room, RoomKind};
use crate::audio::Cue;
use crate::consts::*;
use crate::tuning::Tuning;

/// Horizontal pickup window around the player's center
const PICKUP_REACH_X: f32 = 24.0;
/// Vertical pickup window against the player's top edge
const PICKUP_REACH_Y: f32 = 40.0;
const PICKUP_SHAKE: u32 = 10;
const PISTOL_UPGRADE_AMMO: u32 = 6;
/// Debris pieces dropped by a trigger or a broken prop
const TRIGGER_DEBRIS: usize = 6;
/// Per-tick decay of a prop's cosmetic sway
const TWITCH_DECAY: f32 = 0.08;

/// Lateral push applied every tick in the windpass
pub const WIND_FORCE: f32 = 0.08;
/// Ticks the gauntlet spikes stay up
pub const CHASE_TICKS: u32 = 300;
/// Ticks between the canopy trigger and the collapse
pub const COLLAPSE_DELAY: u32 = 100;
/// Ticks between the collapse and the second wave
pub const COLLAPSE_WAVE_DELAY: u64 = 36;
const COLLAPSE_DEBRIS: usize = 12;
const COLLAPSE_SHAKE: u32 = 40;
/// Upper band of the broken overpass that reveals the secret
const OVERPASS_SECRET_BAND: f32 = 160.0;

/// Collect every item within reach. Returns the kinds picked this tick.
pub fn collect_items(room: &mut Room, player: &mut Player, tuning: &Tuning, cues: &mut Vec<Cue>) -> Vec<ItemKind> {
    let origin = room.origin();
    let center_x = player.center().x;
    let mut picked = Vec::new();

    for item in room.items.iter_mut().filter(|i| !i.picked) {
        let at = origin + item.pos;
        if (center_x - at.x).abs() < PICKUP_REACH_X && (player.pos.y - at.y).abs() < PICKUP_REACH_Y {
            item.picked = true;
            picked.push(item.kind);
        }
    }

    for &kind in &picked {
        apply_item(kind, room, player, tuning);
        player.shake_timer = player.shake_timer.max(PICKUP_SHAKE);
        cues.push(Cue::Pickup);
        log::info!("Picked up {:?} in room {}", kind, room.coord);
    }
    picked
}

fn apply_item(kind: ItemKind, room: &mut Room, player: &mut Player, tuning: &Tuning) {
    match kind {
        ItemKind::Sword => player.has_sword = true,
        ItemKind::Potion => player.heal(1),
        ItemKind::Pistol => {
            player.pistol.owned = true;
            player.refill_ammo();
            if let Some(pe) = room.pickup_encounter.as_mut().filter(|pe| pe.trigger == kind) {
                pe.arm();
            }
        }
        ItemKind::PistolUpgrade => {
            if player.pistol.max_ammo == 0 {
                player.pistol.max_ammo = tuning.pistol_max_ammo;
            }
            player.pistol.max_ammo += PISTOL_UPGRADE_AMMO;
            player.refill_ammo();
        }
        ItemKind::PistolAmmo => player.refill_ammo(),
        ItemKind::Core => player.cores += 1,
        ItemKind::Shrine => {
            player.shrines += 1;
            player.has_down_shot = true;
        }
        ItemKind::MomentumModule => room.flags.momentum_unlocked = true,
        ItemKind::MomentumDash => player.momentum_dash = true,
        ItemKind::TrapMarker => {}
    }
}

/// Spikes, fall triggers and breakable props
pub fn update_props(room: &mut Room, player: &mut Player, tuning: &Tuning, rng: &mut impl Rng, cues: &mut Vec<Cue>) {
    let origin = room.origin();
    let mut debris = Vec::new();
    let mut bits = Vec::new();
    let mut hurt = false;

    for prop in room.props.iter_mut() {
        prop.twitch = (prop.twitch - TWITCH_DECAY).max(0.0);
        let at = origin + prop.pos;
        match &mut prop.kind {
            PropKind::Spike { active: true } => {
                if overlaps(player.pos, player.size, at, prop.size) {
                    hurt = true;
                }
            }
            PropKind::FallTrigger { triggered } if !*triggered => {
                if overlaps(player.pos, player.size, at, prop.size) {
                    *triggered = true;
                    for _ in 0..TRIGGER_DEBRIS {
                        let x = prop.pos.x + rng.random::<f32>() * prop.size.x;
                        debris.push(Enemy::debris(rng, Vec2::new(x, 0.0)));
                    }
                    log::debug!("Fall trigger sprung in room {}", room.coord);
                }
            }
            PropKind::Breakable { broken } if !*broken => {
                // breakables are anchored at their horizontal center
                let left = at - Vec2::new(prop.size.x / 2.0, 0.0);
                if overlaps(player.pos, player.size, left, prop.size) {
                    *broken = true;
                    for _ in 0..TRIGGER_DEBRIS {
                        let x = prop.pos.x + (rng.random::<f32>() - 0.5) * prop.size.x;
                        let y = prop.pos.y + (rng.random::<f32>() - 0.5) * prop.size.y;
                        let d = Enemy::debris(rng, Vec2::new(x, y));
                        bits.push(Particle::new(ParticleKind::DebrisHint, d.pos, d.vel, 40, 3.0));
                        debris.push(d);
                    }
                }
            }
            _ => {}
        }
    }

    if hurt {
        player.take_damage(tuning, cues);
    }
    room.enemies.append(&mut debris);
    room.particles.append(&mut bits);
}

/// Per-kind ambient effects and set-pieces
pub fn update_room_kind(room: &mut Room, player: &mut Player, now: u64, rng: &mut impl Rng) {
    let origin = room.origin();
    let local = player.pos - origin;

    match room.kind {
        RoomKind::RuinedOutskirts => {
            if rng.random_bool(0.10) {
                let at = Vec2::new(rng.random::<f32>() * ROOM_W, rng.random::<f32>() * ROOM_H);
                let vel = Vec2::new((rng.random::<f32>() - 0.5) * 0.3, -0.1);
                room.particles.push(Particle::new(ParticleKind::Fog, at, vel, 200, 6.0));
            }
        }
        RoomKind::ForestTrap => {
            if rng.random_bool(0.05) {
                let at = Vec2::new(rng.random::<f32>() * ROOM_W, 0.0);
                let vel = Vec2::new(0.0, 1.0 + rng.random::<f32>());
                room.particles
                    .push(Particle::new(ParticleKind::DebrisHint, at, vel, 100, 2.0));
            }
            if rng.random_bool(0.01) {
                let at = Vec2::new(rng.random::<f32>() * ROOM_W, 0.0);
                let d = Enemy::debris(rng, at);
                room.enemies.push(d);
            }
        }
        RoomKind::Windpass => {
            player.vel.x += WIND_FORCE;
            if rng.random_bool(0.05) {
                let at = Vec2::new(rng.random::<f32>() * ROOM_W, rng.random::<f32>() * ROOM_H);
                let vel = Vec2::new(1.0 + rng.random::<f32>(), (rng.random::<f32>() - 0.5) * 0.5);
                room.particles.push(Particle::new(ParticleKind::Leaf, at, vel, 120, 2.0));
            }
            if rng.random_bool(0.01) {
                let x = local.x + player.facing * 200.0;
                let e = Enemy::swarm(rng, EnemyKind::FastSwarm, Vec2::new(x, 420.0));
                room.enemies.push(e);
            }
        }
        RoomKind::HangingCanopy => {
            if rng.random_bool(0.02) {
                let at = Vec2::new(rng.random::<f32>() * ROOM_W, rng.random::<f32>() * ROOM_H / 2.0);
                room.spawn_particle(rng, at, ParticleKind::Fog);
            }
        }
        RoomKind::BrokenOverpass => {
            if !room.flags.secret_found && local.y < OVERPASS_SECRET_BAND {
                room.flags.secret_found = true;
                room.items.push(Item::new(ItemKind::PistolUpgrade, 220.0, 140.0));
                log::info!("Secret found in room {}", room.coord);
            }
        }
        RoomKind::RunnerShrine => {
            let flags = &mut room.flags;
            if flags.momentum_unlocked && !flags.momentum_reward_spawned && room.enemies.is_empty() {
                flags.momentum_reward_spawned = true;
                for i in 0..8 {
                    let at = Vec2::new(120.0 + i as f32 * 60.0, 480.0);
                    room.enemies.push(Enemy::swarm(rng, EnemyKind::MiniSwarm, at));
                }
                log::info!("Runner shrine exit wave");
            }
        }
        RoomKind::OvergrownGauntlet => update_chase(room, local),
        RoomKind::CanopyBreak => update_collapse(room, player, local, now, rng),
        _ => {}
    }
}

fn set_spikes(room: &mut Room, on: bool) {
    for prop in room.props.iter_mut() {
        if let PropKind::Spike { active } = &mut prop.kind {
            *active = on;
        }
    }
}

fn update_chase(room: &mut Room, local: Vec2) {
    if !room.flags.chase_active && !room.flags.chase_done && local.x > ROOM_W / 2.0 {
        room.flags.chase_active = true;
        room.flags.chase_timer = 0;
        set_spikes(room, true);
        log::info!("Gauntlet chase started");
    }
    if room.flags.chase_active {
        room.flags.chase_timer += 1;
        if room.flags.chase_timer > CHASE_TICKS {
            room.flags.chase_active = false;
            room.flags.chase_done = true;
            set_spikes(room, false);
        }
    }
}

fn update_collapse(room: &mut Room, player: &mut Player, local: Vec2, now: u64, rng: &mut impl Rng) {
    match room.flags.collapse {
        CollapseStage::Dormant => {
            if local.x > ROOM_W / 3.0 && local.y < ROOM_H / 2.0 {
                room.flags.collapse = CollapseStage::Counting { timer: 0 };
                log::info!("Canopy collapse triggered");
            }
        }
        CollapseStage::Counting { timer } => {
            let timer = timer + 1;
            if timer > COLLAPSE_DELAY {
                room.flags.collapse = CollapseStage::Collapsed;
                for i in 0..COLLAPSE_DEBRIS {
                    let at = Vec2::new(120.0 + i as f32 * 60.0, 80.0);
                    room.enemies.push(Enemy::debris(rng, at));
                }
                player.shake_timer = player.shake_timer.max(COLLAPSE_SHAKE);
                schedule(room, now, COLLAPSE_WAVE_DELAY, ScheduledAction::SpawnEnemies(collapse_wave()));
            } else {
                room.flags.collapse = CollapseStage::Counting { timer };
            }
        }
        CollapseStage::Collapsed => {
            if room.pending.is_empty() && room.enemies.is_empty() {
                if let Some(item) = room.flags.set_piece_reward.take() {
                    log::info!("Collapse survived; {:?} revealed", item.kind);
                    room.items.push(item);
                }
            }
        }
    }
}

/// Second wave of the canopy collapse
fn collapse_wave() -> Vec<EnemySpec> {
    let mut wave = Vec::new();
    for i in 0..3 {
        wave.push(EnemySpec::of(EnemyKind::FastSwarm, 120.0 + i as f32 * 160.0, 520.0));
    }
    for i in 0..6 {
        wave.push(EnemySpec::of(EnemyKind::MiniSwarm, 80.0 + i as f32 * 80.0, 480.0));
    }
    wave.push(EnemySpec::new(EnemyKind::MiniBoss, 520.0, 440.0, 6));
    wave
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::director::{PickupEncounter, run_pending};
    use crate::sim::room::{Prop, RoomCoord};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn setup(kind: RoomKind) -> (Room, Player, Tuning, Pcg32) {
        let tuning = Tuning::default();
        let room = Room::new(RoomCoord::new(0, 0), kind);
        let player = Player::new(&tuning);
        (room, player, tuning, Pcg32::seed_from_u64(11))
    }

    #[test]
    fn test_items_picked_once() {
        let (mut room, mut player, tuning, _) = setup(RoomKind::Forest);
        player.pos = Vec2::new(150.0, 600.0);
        room.items.push(Item::new(ItemKind::Sword, 160.0, 610.0));
        room.items.push(Item::new(ItemKind::Core, 900.0, 610.0));
        let mut cues = Vec::new();
        assert_eq!(collect_items(&mut room, &mut player, &tuning, &mut cues), vec![ItemKind::Sword]);
        assert!(player.has_sword);
        assert_eq!(player.shake_timer, PICKUP_SHAKE);
        assert!(collect_items(&mut room, &mut player, &tuning, &mut cues).is_empty());
        assert_eq!(cues, vec![Cue::Pickup]);
        assert_eq!(player.cores, 0);
    }

    #[test]
    fn test_pistol_pickup_arms_encounter() {
        let (mut room, mut player, tuning, _) = setup(RoomKind::HunterClearing);
        room.items.push(Item::new(ItemKind::Pistol, 110.0, 300.0));
        room.pickup_encounter = Some(PickupEncounter::new(ItemKind::Pistol, vec![Vec::new()]));
        collect_items(&mut room, &mut player, &tuning, &mut Vec::new());
        assert!(player.pistol.owned);
        assert_eq!(player.pistol.ammo, tuning.pistol_max_ammo);
        assert!(room.pickup_encounter.as_ref().unwrap().armed);
    }

    #[test]
    fn test_shrine_unlocks_down_shot() {
        let (mut room, mut player, tuning, _) = setup(RoomKind::Forest);
        room.items.push(Item::new(ItemKind::Shrine, 110.0, 300.0));
        collect_items(&mut room, &mut player, &tuning, &mut Vec::new());
        assert!(player.has_down_shot);
        assert_eq!(player.shrines, 1);
    }

    #[test]
    fn test_active_spike_hurts_inactive_does_not() {
        let (mut room, mut player, tuning, mut rng) = setup(RoomKind::Forest);
        room.props
            .push(Prop::new(PropKind::Spike { active: false }, 90.0, 320.0, 40.0, 16.0));
        update_props(&mut room, &mut player, &tuning, &mut rng, &mut Vec::new());
        assert_eq!(player.hp, tuning.player_max_hp);

        room.props[0].kind = PropKind::Spike { active: true };
        update_props(&mut room, &mut player, &tuning, &mut rng, &mut Vec::new());
        assert_eq!(player.hp, tuning.player_max_hp - 1);
    }

    #[test]
    fn test_prop_twitch_settles() {
        let (mut room, mut player, tuning, mut rng) = setup(RoomKind::Forest);
        let mut trunk = Prop::new(PropKind::Trunk, 600.0, 0.0, 40.0, ROOM_H);
        trunk.twitch = 0.2;
        room.props.push(trunk);
        update_props(&mut room, &mut player, &tuning, &mut rng, &mut Vec::new());
        assert!((room.props[0].twitch - 0.12).abs() < 1e-6);
        for _ in 0..3 {
            update_props(&mut room, &mut player, &tuning, &mut rng, &mut Vec::new());
        }
        assert_eq!(room.props[0].twitch, 0.0);
    }

    #[test]
    fn test_fall_trigger_fires_once() {
        let (mut room, mut player, tuning, mut rng) = setup(RoomKind::HangingCanopy);
        room.props
            .push(Prop::new(PropKind::FallTrigger { triggered: false }, 90.0, 310.0, 40.0, 12.0));
        update_props(&mut room, &mut player, &tuning, &mut rng, &mut Vec::new());
        assert_eq!(room.enemies.len(), TRIGGER_DEBRIS);
        assert!(room.enemies.iter().all(|e| e.kind() == EnemyKind::Debris && e.pos.y == 0.0));
        update_props(&mut room, &mut player, &tuning, &mut rng, &mut Vec::new());
        assert_eq!(room.enemies.len(), TRIGGER_DEBRIS);
    }

    #[test]
    fn test_overpass_secret_revealed_once() {
        let (mut room, mut player, _, mut rng) = setup(RoomKind::BrokenOverpass);
        player.pos = Vec2::new(200.0, 100.0);
        update_room_kind(&mut room, &mut player, 0, &mut rng);
        update_room_kind(&mut room, &mut player, 1, &mut rng);
        assert_eq!(room.item_count(ItemKind::PistolUpgrade), 1);
    }

    #[test]
    fn test_gauntlet_chase_runs_once() {
        let (mut room, mut player, _, mut rng) = setup(RoomKind::OvergrownGauntlet);
        room.props
            .push(Prop::new(PropKind::Spike { active: false }, 400.0, 600.0, 200.0, 16.0));
        player.pos = Vec2::new(ROOM_W / 2.0 + 10.0, 500.0);
        update_room_kind(&mut room, &mut player, 0, &mut rng);
        assert!(room.flags.chase_active);
        assert_eq!(room.props[0].kind, PropKind::Spike { active: true });
        for t in 0..CHASE_TICKS {
            update_room_kind(&mut room, &mut player, t as u64, &mut rng);
        }
        assert!(!room.flags.chase_active);
        assert!(room.flags.chase_done);
        assert_eq!(room.props[0].kind, PropKind::Spike { active: false });
        update_room_kind(&mut room, &mut player, 999, &mut rng);
        assert!(!room.flags.chase_active);
    }

    #[test]
    fn test_canopy_collapse_sequence() {
        let (mut room, mut player, _, mut rng) = setup(RoomKind::CanopyBreak);
        room.flags.set_piece_reward = Some(Item::new(ItemKind::MomentumDash, 520.0, 140.0));
        player.pos = Vec2::new(ROOM_W / 2.0, 200.0);

        let mut now = 0;
        update_room_kind(&mut room, &mut player, now, &mut rng);
        assert_eq!(room.flags.collapse, CollapseStage::Counting { timer: 0 });
        for _ in 0..COLLAPSE_DELAY {
            now += 1;
            update_room_kind(&mut room, &mut player, now, &mut rng);
        }
        assert!(room.enemies.is_empty());
        now += 1;
        update_room_kind(&mut room, &mut player, now, &mut rng);
        assert_eq!(room.flags.collapse, CollapseStage::Collapsed);
        assert_eq!(room.enemies.len(), COLLAPSE_DEBRIS);
        assert_eq!(player.shake_timer, COLLAPSE_SHAKE);
        assert_eq!(room.pending.len(), 1);

        room.enemies.clear();
        assert_eq!(run_pending(&mut room, now + COLLAPSE_WAVE_DELAY, &mut rng), 1);
        assert_eq!(room.enemies.len(), 10);
        assert_eq!(room.enemies.iter().filter(|e| e.kind() == EnemyKind::MiniBoss).count(), 1);

        // reward waits for the wave to be cleared
        update_room_kind(&mut room, &mut player, now + 40, &mut rng);
        assert!(room.items.is_empty());
        room.enemies.clear();
        update_room_kind(&mut room, &mut player, now + 41, &mut rng);
        update_room_kind(&mut room, &mut player, now + 42, &mut rng);
        assert_eq!(room.item_count(ItemKind::MomentumDash), 1);
    }

    #[test]
    fn test_runner_shrine_exit_wave() {
        let (mut room, mut player, tuning, mut rng) = setup(RoomKind::RunnerShrine);
        update_room_kind(&mut room, &mut player, 0, &mut rng);
        assert!(room.enemies.is_empty());
        room.items.push(Item::new(ItemKind::MomentumModule, 110.0, 300.0));
        collect_items(&mut room, &mut player, &tuning, &mut Vec::new());
        update_room_kind(&mut room, &mut player, 1, &mut rng);
        assert_eq!(room.enemies.len(), 8);
        room.enemies.clear();
        update_room_kind(&mut room, &mut player, 2, &mut rng);
        assert!(room.enemies.is_empty());
    }
}
