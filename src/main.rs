//! Ancient Forest headless entry point
//!
//! Runs the simulation with a scripted input pattern and logs what happens.
//! Useful for soak runs and for dumping a frame view as JSON.

use std::error::Error;

use ancient_forest::audio::{AudioManager, LogBackend};
use ancient_forest::consts::TICKS_PER_SECOND;
use ancient_forest::sim::{GameState, TickInput, tick};
use ancient_forest::{Settings, Tuning};

const SETTINGS_PATH: &str = "settings.json";

/// Command line options
struct Args {
    seed: u64,
    ticks: u64,
    settings: String,
    tuning: Option<String>,
    dump: bool,
}

impl Args {
    fn parse() -> Result<Self, Box<dyn Error>> {
        let mut args = Self {
            seed: 0xF0_4E57,
            ticks: 60 * u64::from(TICKS_PER_SECOND),
            settings: SETTINGS_PATH.to_string(),
            tuning: None,
            dump: false,
        };
        let mut it = std::env::args().skip(1);
        while let Some(flag) = it.next() {
            match flag.as_str() {
                "--seed" => args.seed = it.next().ok_or("--seed needs a value")?.parse()?,
                "--ticks" => args.ticks = it.next().ok_or("--ticks needs a value")?.parse()?,
                "--settings" => args.settings = it.next().ok_or("--settings needs a path")?,
                "--tuning" => args.tuning = Some(it.next().ok_or("--tuning needs a path")?),
                "--dump" => args.dump = true,
                other => return Err(format!("unknown argument `{other}`").into()),
            }
        }
        Ok(args)
    }
}

/// Run right, hop now and then, swing at whatever is close
fn scripted_input(t: u64) -> TickInput {
    TickInput {
        right: t % 240 < 200,
        left: (220..235).contains(&(t % 240)),
        jump: t % 50 < 12,
        jump_pressed: t % 50 == 0,
        attack: t % 18 == 0,
        dash: t % 150 == 40,
        fire: t % 30 == 5,
        down_shot: t % 200 == 100,
        skip_cutscene: false,
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    log::info!("Ancient Forest (headless) starting...");

    let args = Args::parse()?;
    let settings = Settings::load(&args.settings)?;
    let tuning = match &args.tuning {
        Some(path) => Tuning::load(path)?,
        None => Tuning::default(),
    };

    let mut state = GameState::with_tuning(args.seed, tuning)?;
    if settings.skip_intro {
        state.skip_intro();
    }
    let mut audio = AudioManager::new(Box::new(LogBackend), &settings);

    let mut last_room = state.player_room();
    let mut shaken_ticks = 0u64;
    for t in 0..args.ticks {
        tick(&mut state, &scripted_input(t));
        audio.play_all(&mut state.cues);
        if settings.effective_screen_shake() && state.player.shake_timer > 0 {
            shaken_ticks += 1;
        }

        let room = state.player_room();
        if room != last_room {
            let zone = state.current_room().map_or("void", |r| r.kind.label());
            log::info!("Tick {}: entered {} ({})", state.time_ticks, room, zone);
            last_room = room;
        }
    }

    let (played, failed) = audio.stats();
    log::info!(
        "Finished after {} ticks in room {}: hp {}/{}, sword {}, cues {} played / {} dropped, {} shaken ticks",
        state.time_ticks,
        state.player_room(),
        state.player.hp,
        state.player.max_hp,
        state.player.has_sword,
        played,
        failed,
        shaken_ticks
    );

    if args.dump {
        println!("{}", serde_json::to_string_pretty(&state.view())?);
    }
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by a host page on the web; nothing to do here
}
