//! Declarative world authoring
//!
//! Each room is described by a [`RoomPlan`]: tile fills, resident enemies,
//! items, props and optional encounters. [`build`] validates every plan and
//! assembles the [`World`]; authoring mistakes surface as [`BuildError`]
//! before the first tick.

use std::collections::BTreeSet;

use rand::Rng;
use thiserror::Error;

use super::director::{Encounter, PickupEncounter, Wave};
use super::entity::{EnemyKind, EnemySpec};
use super::room::{Item, ItemKind, Prop, PropKind, Room, RoomCoord, RoomKind, World};
use crate::consts::*;

const T: f32 = TILE_SIZE;

/// Authoring mistakes caught at world-build time
#[derive(Debug, Error, PartialEq)]
pub enum BuildError {
    #[error("room {0} is defined twice")]
    DuplicateRoom(RoomCoord),
    #[error("room {0} declares a reward but no waves")]
    RewardWithoutWaves(RoomCoord),
    #[error("room {coord} wave {wave} is empty")]
    EmptyWave { coord: RoomCoord, wave: usize },
    #[error("room {coord}: {kind:?} has non-positive hp {hp}")]
    NonPositiveHp { coord: RoomCoord, kind: EnemyKind, hp: i32 },
    #[error("room {coord}: pickup encounter trigger {trigger:?} is not placed in the room")]
    PickupTriggerMissing { coord: RoomCoord, trigger: ItemKind },
}

/// Rectangle of tiles set to one code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub val: u8,
}

/// Build instructions for one room
#[derive(Debug, Clone)]
pub struct RoomPlan {
    pub coord: RoomCoord,
    pub kind: RoomKind,
    pub fills: Vec<Fill>,
    pub enemies: Vec<EnemySpec>,
    pub items: Vec<Item>,
    pub props: Vec<Prop>,
    pub waves: Vec<Wave>,
    pub reward: Option<Item>,
    pub pickup: Option<(ItemKind, Vec<Wave>)>,
    pub set_piece_reward: Option<Item>,
}

impl RoomPlan {
    pub fn new(gx: i32, gy: i32, kind: RoomKind) -> Self {
        Self {
            coord: RoomCoord::new(gx, gy),
            kind,
            fills: Vec::new(),
            enemies: Vec::new(),
            items: Vec::new(),
            props: Vec::new(),
            waves: Vec::new(),
            reward: None,
            pickup: None,
            set_piece_reward: None,
        }
    }

    /// Solid ground over a tile rectangle
    pub fn fill(mut self, x: i32, y: i32, w: i32, h: i32) -> Self {
        self.fills.push(Fill { x, y, w, h, val: TILE_GROUND });
        self
    }

    /// Air over a tile rectangle (applied in order, so it cuts earlier fills)
    pub fn carve(mut self, x: i32, y: i32, w: i32, h: i32) -> Self {
        self.fills.push(Fill { x, y, w, h, val: TILE_AIR });
        self
    }

    pub fn enemy(mut self, kind: EnemyKind, x: f32, y: f32, hp: i32) -> Self {
        self.enemies.push(EnemySpec::new(kind, x, y, hp));
        self
    }

    /// Enemy with its kind's default hit points
    pub fn spawn(mut self, kind: EnemyKind, x: f32, y: f32) -> Self {
        self.enemies.push(EnemySpec::of(kind, x, y));
        self
    }

    pub fn item(mut self, kind: ItemKind, x: f32, y: f32) -> Self {
        self.items.push(Item::new(kind, x, y));
        self
    }

    pub fn prop(mut self, prop: Prop) -> Self {
        self.props.push(prop);
        self
    }

    pub fn wave(mut self, wave: Wave) -> Self {
        self.waves.push(wave);
        self
    }

    /// Item granted once every wave is cleared
    pub fn reward(mut self, kind: ItemKind, x: f32, y: f32) -> Self {
        self.reward = Some(Item::new(kind, x, y));
        self
    }

    /// Slow waves that start when `trigger` is picked up in this room
    pub fn pickup_encounter(mut self, trigger: ItemKind, waves: Vec<Wave>) -> Self {
        self.pickup = Some((trigger, waves));
        self
    }

    /// Item granted once the room's set-piece is survived
    pub fn set_piece_reward(mut self, kind: ItemKind, x: f32, y: f32) -> Self {
        self.set_piece_reward = Some(Item::new(kind, x, y));
        self
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        let coord = self.coord;
        if self.reward.is_some() && self.waves.is_empty() {
            return Err(BuildError::RewardWithoutWaves(coord));
        }
        if let Some(wave) = self.waves.iter().position(|w| w.is_empty()) {
            return Err(BuildError::EmptyWave { coord, wave });
        }
        let pickup_waves = self.pickup.iter().flat_map(|(_, waves)| waves.iter());
        let specs = self
            .enemies
            .iter()
            .chain(self.waves.iter().flatten())
            .chain(pickup_waves.flatten());
        for spec in specs {
            if spec.hp <= 0 {
                return Err(BuildError::NonPositiveHp {
                    coord,
                    kind: spec.kind,
                    hp: spec.hp,
                });
            }
        }
        if let Some((trigger, _)) = &self.pickup {
            if !self.items.iter().any(|i| i.kind == *trigger) {
                return Err(BuildError::PickupTriggerMissing {
                    coord,
                    trigger: *trigger,
                });
            }
        }
        Ok(())
    }

    /// Materialize the room: tiles, residents, then scenery
    pub fn into_room(self, rng: &mut impl Rng) -> Room {
        let mut room = Room::new(self.coord, self.kind);
        for f in &self.fills {
            room.fill_area(f.x, f.y, f.w, f.h, f.val);
        }
        room.enemies = self.enemies.iter().map(|s| s.spawn(rng)).collect();
        room.items = self.items;
        room.props = self.props;
        decorate(&mut room, rng);
        if !self.waves.is_empty() {
            room.encounter = Some(Encounter::new(self.waves, self.reward));
        }
        room.pickup_encounter = self
            .pickup
            .map(|(trigger, waves)| PickupEncounter::new(trigger, waves));
        room.flags.set_piece_reward = self.set_piece_reward;
        room
    }
}

/// Background scenery: buildings, ruins or tree trunks by room kind
fn decorate(room: &mut Room, rng: &mut impl Rng) {
    match room.kind {
        RoomKind::TownEdge | RoomKind::MiniBossRoom => {
            let count = if room.kind == RoomKind::MiniBossRoom { 8 } else { 15 };
            for _ in 0..count {
                let x = rng.random::<f32>() * ROOM_W;
                let w = 40.0 + rng.random::<f32>() * 50.0;
                room.props.push(Prop::new(PropKind::Building, x, 0.0, w, ROOM_H));
            }
        }
        RoomKind::RuinedOutskirts => {
            for _ in 0..12 {
                let x = rng.random::<f32>() * ROOM_W;
                let y = (30.0 + rng.random::<f32>() * 8.0) * T;
                let w = 50.0 + rng.random::<f32>() * 70.0;
                let h = 25.0 + rng.random::<f32>() * 45.0;
                room.props.push(Prop::new(PropKind::Ruin, x, y, w, h));
            }
        }
        kind => {
            let trunks = match kind {
                RoomKind::ForestTrap => 25,
                RoomKind::CombatIntro => 18,
                _ => 12,
            };
            for _ in 0..trunks {
                let x = rng.random::<f32>() * ROOM_W;
                let w = 30.0 + rng.random::<f32>() * 55.0;
                room.props.push(Prop::new(PropKind::Trunk, x, 0.0, w, ROOM_H));
            }
        }
    }
}

/// Validate every plan and assemble the world
pub fn build(plans: Vec<RoomPlan>, rng: &mut impl Rng) -> Result<World, BuildError> {
    let mut seen = BTreeSet::new();
    for plan in &plans {
        if !seen.insert(plan.coord) {
            return Err(BuildError::DuplicateRoom(plan.coord));
        }
        plan.validate()?;
    }

    let mut world = World::new();
    for plan in plans {
        world.insert(plan.into_room(rng));
    }
    log::info!("World built: {} rooms", world.len());
    Ok(world)
}

fn row(kind: EnemyKind, count: usize, x0: f32, dx: f32, y: f32) -> impl Iterator<Item = EnemySpec> {
    (0..count).map(move |i| EnemySpec::of(kind, x0 + i as f32 * dx, y))
}

fn with_row(mut plan: RoomPlan, kind: EnemyKind, count: usize, x0: f32, dx: f32, y: f32) -> RoomPlan {
    plan.enemies.extend(row(kind, count, x0, dx, y));
    plan
}

/// The authored world: the forest, the ruins beyond it and the set-piece
/// rooms along the eastern route
pub fn ancient_forest() -> Vec<RoomPlan> {
    use EnemyKind::*;
    use ItemKind::*;

    let mut plans = Vec::new();

    plans.push(
        RoomPlan::new(0, 0, RoomKind::Forest)
            .fill(0, 40, 80, 20)
            .fill(12, 32, 8, 2)
            .fill(30, 28, 10, 2)
            .fill(50, 35, 10, 2)
            .fill(65, 25, 10, 2)
            .item(Sword, 160.0, 610.0),
    );

    plans.push(
        RoomPlan::new(1, 0, RoomKind::CombatIntro)
            .fill(0, 42, 80, 18)
            .fill(20, 34, 12, 2)
            .fill(50, 30, 10, 2)
            .enemy(Crawler, 400.0, 500.0, 3)
            .enemy(Crawler, 700.0, 500.0, 3),
    );

    plans.push(
        RoomPlan::new(2, 0, RoomKind::RuinedOutskirts)
            .fill(0, 44, 80, 16)
            .fill(14, 36, 14, 2)
            .fill(44, 32, 12, 2)
            .fill(70, 26, 10, 2)
            .enemy(Flyer, 600.0, 300.0, 2),
    );

    plans.push(
        RoomPlan::new(3, 0, RoomKind::TownEdge)
            .fill(0, 45, 80, 15)
            .fill(10, 38, 10, 2)
            .fill(35, 34, 14, 2)
            .fill(65, 28, 12, 2),
    );

    plans.push(
        RoomPlan::new(4, 0, RoomKind::MiniBossRoom)
            .fill(0, 46, 80, 14)
            .fill(20, 38, 20, 2)
            .fill(55, 32, 12, 2)
            .enemy(RootTitan, 420.0, 240.0, 20)
            .enemy(GloomWeaver, 600.0, 400.0, 20),
    );

    plans.push(
        RoomPlan::new(0, 1, RoomKind::Forest)
            .fill(0, 44, 80, 16)
            .fill(8, 36, 10, 2)
            .fill(30, 30, 12, 2)
            .fill(55, 35, 10, 2),
    );

    plans.push(
        RoomPlan::new(1, 1, RoomKind::ForestTrap)
            .fill(0, 46, 80, 14)
            .fill(18, 38, 14, 2)
            .fill(42, 34, 14, 2)
            .fill(68, 30, 10, 2)
            .enemy(Crawler, 500.0, 520.0, 4)
            .enemy(Flyer, 720.0, 280.0, 3),
    );

    // broken gate passage
    plans.push(
        RoomPlan::new(5, 0, RoomKind::RuinedOutskirts)
            .fill(0, 46, 80, 14)
            .fill(18, 36, 20, 2)
            .fill(55, 28, 18, 2)
            .fill(10, 40, 6, 2)
            .fill(44, 34, 6, 2)
            .fill(70, 20, 4, 26)
            .fill(74, 24, 3, 22)
            .item(Core, 62.0 * T, 26.0 * T),
    );

    // flooded tunnels
    plans.push(
        RoomPlan::new(6, 0, RoomKind::ForestTrap)
            .fill(0, 48, 80, 12)
            .fill(8, 40, 10, 2)
            .fill(28, 36, 12, 2)
            .fill(50, 32, 12, 2)
            .fill(70, 28, 10, 2)
            .fill(0, 0, 80, 6)
            .carve(35, 49, 20, 1)
            .item(TrapMarker, 42.0 * T, 47.0 * T)
            .enemy(Crawler, 500.0, 520.0, 4)
            .enemy(Flyer, 750.0, 280.0, 3)
            .enemy(Flyer, 350.0, 250.0, 3),
    );

    // overgrown shrine
    plans.push(
        RoomPlan::new(7, 0, RoomKind::Forest)
            .fill(0, 46, 80, 14)
            .fill(20, 38, 40, 2)
            .fill(25, 20, 3, 26)
            .fill(52, 20, 3, 26)
            .fill(10, 30, 12, 2)
            .fill(68, 30, 12, 2)
            .fill(38, 28, 20, 2)
            .item(Shrine, 48.0 * T, 26.0 * T)
            .enemy(Crawler, 600.0, 520.0, 3),
    );

    plans.push(
        RoomPlan::new(8, 0, RoomKind::ForestSplit)
            .fill(0, 46, 80, 14)
            .fill(45, 32, 20, 2)
            .fill(55, 26, 15, 2)
            .fill(68, 20, 10, 2)
            .fill(8, 38, 15, 2)
            .fill(25, 34, 12, 2)
            .fill(35, 30, 2, 20)
            .fill(22, 40, 3, 2)
            .fill(40, 36, 3, 2)
            .fill(65, 32, 3, 2)
            .item(Core, 70.0 * T, 18.0 * T)
            .enemy(Flyer, 300.0, 350.0, 2)
            .enemy(Flyer, 500.0, 400.0, 2)
            .enemy(Flyer, 700.0, 320.0, 2)
            .enemy(Flyer, 850.0, 300.0, 2)
            .enemy(Flyer, 600.0, 500.0, 2)
            .enemy(Flyer, 900.0, 250.0, 3),
    );

    plans.push(
        RoomPlan::new(9, 0, RoomKind::ThornClimb)
            .fill(0, 48, 80, 12)
            .fill(10, 42, 12, 2)
            .fill(25, 36, 12, 2)
            .fill(40, 30, 12, 2)
            .fill(55, 24, 12, 2)
            .fill(70, 18, 12, 2)
            .fill(35, 38, 20, 2)
            .carve(8, 44, 3, 1)
            .carve(23, 38, 3, 1)
            .carve(38, 32, 3, 1)
            .carve(53, 26, 3, 1)
            .carve(68, 20, 3, 1)
            .item(Shrine, 75.0 * T, 16.0 * T)
            .enemy(Flyer, 300.0, 380.0, 3)
            .enemy(Flyer, 700.0, 250.0, 3)
            .enemy(Crawler, 400.0, 420.0, 2)
            .enemy(Crawler, 550.0, 350.0, 2)
            .enemy(Crawler, 750.0, 320.0, 2),
    );

    // wave arena
    plans.push(
        RoomPlan::new(10, 0, RoomKind::RuinedGate)
            .fill(0, 46, 80, 14)
            .fill(15, 36, 18, 2)
            .fill(55, 36, 18, 2)
            .fill(35, 30, 16, 2)
            .fill(80, 20, 3, 28)
            .fill(76, 24, 3, 24)
            .wave(vec![
                EnemySpec::new(Crawler, 200.0, 500.0, 1),
                EnemySpec::new(Crawler, 400.0, 520.0, 1),
                EnemySpec::new(Crawler, 600.0, 500.0, 1),
                EnemySpec::new(Crawler, 750.0, 520.0, 1),
                EnemySpec::new(Crawler, 850.0, 500.0, 1),
                EnemySpec::new(Crawler, 950.0, 520.0, 1),
            ])
            .wave(vec![
                EnemySpec::new(Flyer, 300.0, 350.0, 2),
                EnemySpec::new(Flyer, 500.0, 360.0, 2),
                EnemySpec::new(Flyer, 700.0, 340.0, 2),
                EnemySpec::new(Flyer, 400.0, 300.0, 3),
                EnemySpec::new(Flyer, 800.0, 290.0, 3),
            ])
            .wave(vec![EnemySpec::new(GloomWeaver, 600.0, 200.0, 8)])
            .reward(Core, 45.0 * T, 28.0 * T),
    );

    // pistol tutorial: nothing spawns until the pistol is taken
    let pistol_waves: Vec<Wave> = [(200.0, 350.0), (450.0, 600.0), (700.0, 820.0)]
        .into_iter()
        .map(|(a, b)| {
            vec![
                EnemySpec::new(Crawler, a, 500.0, 1),
                EnemySpec::new(Crawler, b, 520.0, 1),
            ]
        })
        .collect();
    plans.push(
        RoomPlan::new(11, 0, RoomKind::HunterClearing)
            .fill(0, 46, 80, 14)
            .prop(Prop::new(PropKind::Platform, 140.0, 480.0, 40.0, 8.0))
            .prop(Prop::new(PropKind::Platform, 300.0, 460.0, 40.0, 8.0))
            .prop(Prop::new(PropKind::Platform, 760.0, 460.0, 40.0, 8.0))
            .item(Pistol, 300.0, 440.0)
            .pickup_encounter(Pistol, pistol_waves),
    );

    plans.push(
        RoomPlan::new(12, 0, RoomKind::BrambleRange)
            .fill(0, 46, 80, 14)
            .fill(30, 36, 12, 2)
            .fill(90, 36, 12, 2)
            .fill(150, 36, 12, 2)
            .prop(Prop::spike(60.0, 520.0, 40.0, 12.0))
            .prop(Prop::spike(120.0, 520.0, 40.0, 12.0))
            .enemy(Crawler, 80.0, 500.0, 2)
            .enemy(Crawler, 360.0, 500.0, 2)
            .enemy(Crawler, 640.0, 500.0, 2)
            .enemy(Flyer, 240.0, 350.0, 2)
            .enemy(Flyer, 520.0, 320.0, 2),
    );

    plans.push(
        RoomPlan::new(13, 0, RoomKind::ShatteredWatchpost)
            .fill(0, 46, 80, 14)
            .fill(40, 36, 12, 2)
            .fill(80, 30, 12, 2)
            .fill(140, 26, 12, 2)
            .enemy(Watcher, 220.0, 320.0, 4)
            .enemy(Watcher, 720.0, 320.0, 4)
            .enemy(Crawler, 360.0, 500.0, 2)
            .enemy(Crawler, 640.0, 500.0, 2)
            .enemy(Flyer, 480.0, 300.0, 2)
            .item(PistolUpgrade, 480.0, 220.0),
    );

    let windpass = RoomPlan::new(14, 0, RoomKind::Windpass)
        .fill(0, 46, 80, 14)
        .fill(30, 36, 6, 2)
        .fill(70, 36, 6, 2)
        .fill(120, 36, 6, 2)
        .prop(Prop::new(PropKind::Platform, 200.0, 420.0, 36.0, 8.0))
        .prop(Prop::new(PropKind::Platform, 380.0, 420.0, 36.0, 8.0));
    plans.push(with_row(windpass, Swarm, 5, 100.0, 160.0, 500.0));

    let canopy = RoomPlan::new(15, 0, RoomKind::HangingCanopy)
        .fill(0, 38, 80, 22)
        .fill(10, 28, 10, 2)
        .fill(30, 22, 10, 2)
        .fill(50, 16, 10, 2)
        .fill(70, 10, 10, 2)
        .prop(Prop::new(PropKind::Vine, 40.0, 60.0, 6.0, 120.0))
        .prop(Prop::new(PropKind::Vine, 200.0, 120.0, 6.0, 120.0))
        .prop(Prop::new(PropKind::FallTrigger { triggered: false }, 60.0, 30.0, 40.0, 12.0))
        .prop(Prop::spike(120.0, 480.0, 40.0, 12.0))
        .spawn(Swarm, 240.0, 300.0)
        .spawn(Swarm, 560.0, 260.0)
        .item(PistolUpgrade, 480.0, 120.0);
    plans.push(with_row(canopy, MiniSwarm, 6, 80.0, 80.0, 380.0));

    let overpass = RoomPlan::new(16, 0, RoomKind::BrokenOverpass)
        .fill(0, 40, 80, 20)
        .fill(0, 20, 20, 2)
        .fill(30, 16, 40, 2)
        .fill(100, 12, 40, 2)
        .enemy(Watcher, 150.0, 120.0, 4)
        .enemy(Watcher, 520.0, 120.0, 4)
        .spawn(FastSwarm, 600.0, 480.0)
        .spawn(FastSwarm, 720.0, 480.0);
    let overpass = with_row(overpass, MiniSwarm, 4, 90.0, 80.0, 140.0);
    plans.push(with_row(overpass, Swarm, 6, 60.0, 90.0, 500.0));

    plans.push(
        RoomPlan::new(17, 0, RoomKind::RunnerShrine)
            .fill(0, 44, 80, 16)
            .fill(10, 40, 20, 4)
            .prop(Prop::new(PropKind::LowCeiling, 60.0, 360.0, 180.0, 20.0))
            .fill(220, 20, 2, 32)
            .fill(300, 20, 2, 32)
            .fill(380, 34, 8, 2)
            .item(MomentumModule, 420.0, 260.0),
    );

    // spike strips stay down until the chase starts
    let mut gauntlet = RoomPlan::new(18, 0, RoomKind::OvergrownGauntlet)
        .fill(0, 46, 80, 14)
        .fill(20, 36, 14, 2)
        .fill(70, 32, 14, 2)
        .fill(120, 36, 14, 2)
        .prop(Prop::new(PropKind::Wallrun, 40.0, 100.0, 16.0, 240.0))
        .prop(Prop::new(PropKind::Wallrun, 240.0, 100.0, 16.0, 240.0))
        .enemy(Watcher, 420.0, 180.0, 4)
        .enemy(Watcher, 640.0, 180.0, 4);
    for i in 0..4 {
        let x = 200.0 + i as f32 * 240.0;
        gauntlet = gauntlet.prop(Prop::new(PropKind::Spike { active: false }, x, 46.0 * T - 12.0, 80.0, 12.0));
    }
    let gauntlet = with_row(gauntlet, FastSwarm, 5, 80.0, 120.0, 480.0);
    plans.push(with_row(gauntlet, MiniSwarm, 6, 120.0, 80.0, 500.0));

    plans.push(
        RoomPlan::new(19, 0, RoomKind::CanopyBreak)
            .fill(0, 30, 80, 24)
            .fill(10, 24, 12, 2)
            .fill(40, 18, 12, 2)
            .fill(70, 12, 12, 2)
            .prop(Prop::new(PropKind::Fragile, 60.0, 120.0, 40.0, 8.0))
            .set_piece_reward(MomentumDash, 520.0, 140.0),
    );

    plans.push(
        RoomPlan::new(22, 0, RoomKind::EchoGrove)
            .fill(0, 44, 80, 16)
            .fill(20, 34, 24, 2)
            .fill(50, 30, 20, 2)
            .enemy(GloomWeaver, 500.0, 280.0, 18)
            .enemy(Flyer, 300.0, 340.0, 4)
            .enemy(Watcher, 700.0, 320.0, 6)
            .item(PistolAmmo, 48.0 * T, 26.0 * T),
    );

    plans.push(
        RoomPlan::new(23, 0, RoomKind::PistolArena)
            .fill(0, 42, 80, 18)
            .fill(10, 34, 16, 2)
            .fill(40, 28, 20, 2)
            .fill(70, 32, 14, 2)
            .fill(25, 18, 12, 2)
            .enemy(Watcher, 300.0, 300.0, 7)
            .enemy(Watcher, 600.0, 260.0, 7)
            .enemy(Flyer, 450.0, 180.0, 5)
            .enemy(Flyer, 750.0, 220.0, 5)
            .item(Core, 31.0 * T, 16.0 * T),
    );

    plans
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    /// Where a tile-aligned spawn lands in world space
    fn tile_to_world(coord: RoomCoord, tx: i32, ty: i32) -> Vec2 {
        coord.origin() + Vec2::new(tx as f32 * T, ty as f32 * T)
    }

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(42)
    }

    #[test]
    fn test_authored_world_builds() {
        let world = build(ancient_forest(), &mut rng()).unwrap();
        assert_eq!(world.len(), 24);
        assert!(world.contains(RoomCoord::new(0, 0)));
        assert!(world.contains(RoomCoord::new(23, 0)));
        assert!(!world.contains(RoomCoord::new(20, 0)));

        let spawn = world.get_room(0, 0).unwrap();
        assert_eq!(spawn.item_count(ItemKind::Sword), 1);
        assert!(world.is_solid(tile_to_world(spawn.coord, 0, 40)));
        assert!(!world.is_solid(tile_to_world(spawn.coord, 0, 39)));
    }

    #[test]
    fn test_boss_room_has_titan() {
        let world = build(ancient_forest(), &mut rng()).unwrap();
        let room = world.get_room(4, 0).unwrap();
        let titan = room
            .enemies
            .iter()
            .find(|e| e.kind() == EnemyKind::RootTitan)
            .unwrap();
        assert_eq!(titan.hp, 20);
        assert_eq!(titan.max_hp, 20);
        assert!(!room.locked);
    }

    #[test]
    fn test_arena_and_pickup_encounters_wired() {
        let world = build(ancient_forest(), &mut rng()).unwrap();
        let gate = world.get_room(10, 0).unwrap();
        let enc = gate.encounter.as_ref().unwrap();
        assert_eq!(enc.waves.len(), 3);
        assert!(enc.reward.is_some());
        assert!(gate.enemies.is_empty());

        let clearing = world.get_room(11, 0).unwrap();
        let pe = clearing.pickup_encounter.as_ref().unwrap();
        assert_eq!(pe.trigger, ItemKind::Pistol);
        assert!(!pe.armed);
        assert!(clearing.encounter.is_none());
    }

    #[test]
    fn test_carve_cuts_floor() {
        let world = build(ancient_forest(), &mut rng()).unwrap();
        let tunnels = world.get_room(6, 0).unwrap();
        assert_eq!(tunnels.tiles.get(40, 49), TILE_AIR);
        assert_eq!(tunnels.tiles.get(40, 50), TILE_GROUND);
    }

    #[test]
    fn test_duplicate_room_rejected() {
        let plans = vec![
            RoomPlan::new(0, 0, RoomKind::Forest),
            RoomPlan::new(0, 0, RoomKind::TownEdge),
        ];
        assert_eq!(
            build(plans, &mut rng()).unwrap_err(),
            BuildError::DuplicateRoom(RoomCoord::new(0, 0))
        );
    }

    #[test]
    fn test_reward_without_waves_rejected() {
        let plan = RoomPlan::new(2, 0, RoomKind::Forest).reward(ItemKind::Core, 0.0, 0.0);
        assert_eq!(
            plan.validate().unwrap_err(),
            BuildError::RewardWithoutWaves(RoomCoord::new(2, 0))
        );
    }

    #[test]
    fn test_bad_waves_rejected() {
        let empty = RoomPlan::new(1, 0, RoomKind::Forest)
            .wave(vec![EnemySpec::of(EnemyKind::Crawler, 0.0, 0.0)])
            .wave(Vec::new());
        assert!(matches!(empty.validate(), Err(BuildError::EmptyWave { wave: 1, .. })));

        let dead = RoomPlan::new(1, 0, RoomKind::Forest).wave(vec![EnemySpec::new(EnemyKind::Flyer, 0.0, 0.0, 0)]);
        assert!(matches!(dead.validate(), Err(BuildError::NonPositiveHp { hp: 0, .. })));
    }

    #[test]
    fn test_pickup_trigger_must_be_placed() {
        let plan = RoomPlan::new(11, 0, RoomKind::HunterClearing).pickup_encounter(ItemKind::Pistol, Vec::new());
        assert!(matches!(
            plan.validate(),
            Err(BuildError::PickupTriggerMissing {
                trigger: ItemKind::Pistol,
                ..
            })
        ));
    }

    #[test]
    fn test_same_seed_same_world() {
        let a = build(ancient_forest(), &mut rng()).unwrap();
        let b = build(ancient_forest(), &mut rng()).unwrap();
        for (ra, rb) in a.rooms().zip(b.rooms()) {
            assert_eq!(ra.coord, rb.coord);
            assert_eq!(ra.props.len(), rb.props.len());
            for (pa, pb) in ra.props.iter().zip(&rb.props) {
                assert_eq!(pa.pos, pb.pos);
            }
        }
    }
}
