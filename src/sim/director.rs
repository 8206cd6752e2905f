//! Encounter/Wave director
//!
//! Arena rooms lock when the player first enters, then feed their waves in
//! order, waiting for each to be cleared plus a settle delay. The pickup
//! variant starts when a trigger item is collected instead and has no
//! reward or lock. Delayed set-piece spawns go through the room's pending
//! action queue, keyed by tick count.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::EnemySpec;
use super::room::{Item, ItemKind, Particle, ParticleKind, Room, RoomCoord};
use crate::audio::Cue;

/// Ticks an arena waits after a wave is cleared
pub const SETTLE_TICKS: u32 = 120;
/// Ticks a pickup encounter waits between waves
pub const PICKUP_SETTLE_TICKS: u32 = 90;

/// One batch of enemies spawned together
pub type Wave = Vec<EnemySpec>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncounterStage {
    /// Player has not entered yet
    #[default]
    Dormant,
    /// Wave `wave` is live or settling
    Fighting { wave: usize },
    /// All waves done, reward granted
    Cleared,
}

/// Item granted when the last wave is cleared
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reward {
    pub item: Item,
    pub spawned: bool,
}

/// Room-entry arena encounter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encounter {
    pub waves: Vec<Wave>,
    pub stage: EncounterStage,
    pub wave_timer: u32,
    pub reward: Option<Reward>,
}

impl Encounter {
    pub fn new(waves: Vec<Wave>, reward: Option<Item>) -> Self {
        Self {
            waves,
            stage: EncounterStage::Dormant,
            wave_timer: 0,
            reward: reward.map(|item| Reward { item, spawned: false }),
        }
    }

    /// Current wave index; -1 before entry, -2 once cleared
    pub fn wave_index(&self) -> i32 {
        match self.stage {
            EncounterStage::Dormant => -1,
            EncounterStage::Fighting { wave } => wave as i32,
            EncounterStage::Cleared => -2,
        }
    }
}

/// Slow tutorial waves armed by picking up a trigger item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupEncounter {
    pub trigger: ItemKind,
    pub waves: Vec<Wave>,
    pub armed: bool,
    pub next_wave: usize,
    pub wave_timer: u32,
    pub exhausted: bool,
}

impl PickupEncounter {
    pub fn new(trigger: ItemKind, waves: Vec<Wave>) -> Self {
        Self {
            trigger,
            waves,
            armed: false,
            next_wave: 0,
            wave_timer: 0,
            exhausted: false,
        }
    }

    /// Start the encounter. Re-arming a running or finished one is ignored.
    pub fn arm(&mut self) {
        if !self.armed && !self.exhausted {
            self.armed = true;
            log::info!("Pickup encounter armed ({} waves)", self.waves.len());
        }
    }
}

/// Side effect queued for a future tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScheduledAction {
    SpawnEnemies(Vec<EnemySpec>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAction {
    /// Absolute tick at which the action runs
    pub due: u64,
    pub action: ScheduledAction,
}

/// Spawn a batch of enemies with an arrival burst each
pub fn spawn_wave(room: &mut Room, wave: &[EnemySpec], rng: &mut impl Rng) {
    for spec in wave {
        let enemy = spec.spawn(rng);
        room.particles
            .push(Particle::new(ParticleKind::Spawn, enemy.pos, Vec2::ZERO, 30, 3.0));
        room.enemies.push(enemy);
    }
    log::debug!("Spawned {} enemies in room {}", wave.len(), room.coord);
}

/// Advance the room's arena encounter, if it has one
pub fn update_encounter(room: &mut Room, player_room: RoomCoord, rng: &mut impl Rng, cues: &mut Vec<Cue>) {
    let Some(mut enc) = room.encounter.take() else {
        return;
    };

    match enc.stage {
        EncounterStage::Dormant => {
            if player_room == room.coord && !room.locked {
                room.locked = true;
                enc.stage = EncounterStage::Fighting { wave: 0 };
                enc.wave_timer = 0;
                if let Some(wave) = enc.waves.first() {
                    spawn_wave(room, wave, rng);
                    cues.push(Cue::Spawn);
                }
                log::info!("Encounter started in room {}", room.coord);
            }
        }
        EncounterStage::Fighting { wave } => {
            if room.enemies.is_empty() {
                enc.wave_timer += 1;
                if enc.wave_timer > SETTLE_TICKS {
                    enc.wave_timer = 0;
                    let next = wave + 1;
                    if let Some(batch) = enc.waves.get(next) {
                        spawn_wave(room, batch, rng);
                        cues.push(Cue::Spawn);
                        enc.stage = EncounterStage::Fighting { wave: next };
                        log::debug!("Room {} wave {}", room.coord, next + 1);
                    } else {
                        if let Some(reward) = enc.reward.as_mut().filter(|r| !r.spawned) {
                            room.items.push(reward.item.clone());
                            reward.spawned = true;
                        }
                        room.locked = false;
                        enc.stage = EncounterStage::Cleared;
                        log::info!("Encounter cleared in room {}", room.coord);
                    }
                }
            }
        }
        EncounterStage::Cleared => {}
    }

    room.encounter = Some(enc);
}

/// Advance an armed pickup encounter while its room is clear
pub fn update_pickup_encounter(room: &mut Room, rng: &mut impl Rng) {
    let Some(mut pe) = room.pickup_encounter.take() else {
        return;
    };

    if pe.armed && !pe.exhausted && room.enemies.is_empty() {
        pe.wave_timer += 1;
        if pe.wave_timer > PICKUP_SETTLE_TICKS {
            if let Some(wave) = pe.waves.get(pe.next_wave) {
                spawn_wave(room, wave, rng);
                pe.next_wave += 1;
                pe.wave_timer = 0;
            } else {
                pe.exhausted = true;
                log::info!("Pickup encounter in room {} exhausted", room.coord);
            }
        }
    }

    room.pickup_encounter = Some(pe);
}

/// Queue a side effect `delay` ticks after `now`
pub fn schedule(room: &mut Room, now: u64, delay: u64, action: ScheduledAction) {
    room.pending.push(PendingAction {
        due: now + delay,
        action,
    });
}

/// Run every pending action that is due. Returns how many ran.
pub fn run_pending(room: &mut Room, now: u64, rng: &mut impl Rng) -> usize {
    if room.pending.is_empty() {
        return 0;
    }
    let (due, later): (Vec<_>, Vec<_>) = std::mem::take(&mut room.pending)
        .into_iter()
        .partition(|p| p.due <= now);
    room.pending = later;

    for pending in &due {
        match &pending.action {
            ScheduledAction::SpawnEnemies(specs) => spawn_wave(room, specs, rng),
        }
    }
    due.len()
}
