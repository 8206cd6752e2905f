//! Audio cue boundary
//!
//! The simulation emits discrete [`Cue`] values; whatever actually plays
//! them sits behind [`CueBackend`]. Backend failures are logged and
//! dropped here so they never reach gameplay.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::Settings;

/// Sound cues raised by simulation events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cue {
    /// Player or boss landed a hit
    Hit,
    /// Encounter wave arrived
    Spawn,
    /// Primary boss defeated
    BossDie,
    /// Item collected
    Pickup,
    /// Pistol or down-shot fired
    Fire,
}

impl Cue {
    /// Asset name used by backends
    pub fn name(self) -> &'static str {
        match self {
            Cue::Hit => "hit",
            Cue::Spawn => "spawn",
            Cue::BossDie => "boss_die",
            Cue::Pickup => "pickup",
            Cue::Fire => "fire",
        }
    }
}

/// Playback failure reported by a backend
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("playback blocked")]
    Blocked,
    #[error("missing asset `{0}`")]
    MissingAsset(&'static str),
}

/// Something that can actually play a cue
pub trait CueBackend {
    fn play(&mut self, cue: Cue, volume: f32) -> Result<(), AudioError>;
}

/// Backend that only logs cues (headless runs)
#[derive(Debug, Default)]
pub struct LogBackend;

impl CueBackend for LogBackend {
    fn play(&mut self, cue: Cue, volume: f32) -> Result<(), AudioError> {
        log::debug!("cue {} @ {:.2}", cue.name(), volume);
        Ok(())
    }
}

/// Audio manager for the game
pub struct AudioManager {
    backend: Box<dyn CueBackend>,
    volume: f32,
    played: u64,
    failed: u64,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(Box::new(LogBackend), &Settings::default())
    }
}

impl AudioManager {
    pub fn new(backend: Box<dyn CueBackend>, settings: &Settings) -> Self {
        Self {
            backend,
            volume: settings.effective_volume(),
            played: 0,
            failed: 0,
        }
    }

    /// Play a cue; failures are swallowed
    pub fn play(&mut self, cue: Cue) {
        if self.volume <= 0.0 {
            return;
        }
        match self.backend.play(cue, self.volume) {
            Ok(()) => self.played += 1,
            Err(e) => {
                self.failed += 1;
                log::warn!("Audio cue `{}` dropped: {}", cue.name(), e);
            }
        }
    }

    /// Play every cue in order, draining the queue
    pub fn play_all(&mut self, cues: &mut Vec<Cue>) {
        for cue in cues.drain(..) {
            self.play(cue);
        }
    }

    /// (played, failed) counters
    pub fn stats(&self) -> (u64, u64) {
        (self.played, self.failed)
    }
}
