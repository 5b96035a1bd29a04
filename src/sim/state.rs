//! Session state and core simulation types
//!
//! One [`SessionState`] exists per [`super::Session`]; the session is its only
//! writer.

use serde::{Deserialize, Serialize};

use super::events::{CountdownLabel, GameEvent};
use super::pattern::PatternEvent;
use super::registry::NoteRegistry;
use super::scheduler::SpawnScheduler;
use super::score::ScoreTracker;
use crate::catalog::Track;
use crate::settings::{Difficulty, Settings};

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Song select menu, no simulation
    Idle,
    /// 3-2-1-GO before play starts or resumes
    Countdown,
    /// Full simulation
    Playing,
    /// Simulation frozen, music paused
    Paused,
    /// Song over, results shown
    Finished,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "Idle",
            Phase::Countdown => "Countdown",
            Phase::Playing => "Playing",
            Phase::Paused => "Paused",
            Phase::Finished => "Finished",
        }
    }
}

/// What happens when a countdown completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountdownPurpose {
    /// Fresh run: reset score, clock and cursor, start the music
    Start,
    /// Resume after pause: keep everything, resume the music
    Resume,
}

/// Countdown timer driven by frame time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Countdown {
    pub purpose: CountdownPurpose,
    pub elapsed: f32,
    label: Option<CountdownLabel>,
}

impl Countdown {
    /// New countdown and the label to show immediately
    pub fn new(purpose: CountdownPurpose, settings: &Settings) -> (Self, CountdownLabel) {
        let label = Self::label_at(0.0, settings).unwrap_or(CountdownLabel::Go);
        (
            Self {
                purpose,
                elapsed: 0.0,
                label: Some(label),
            },
            label,
        )
    }

    /// Label showing at `elapsed`, or `None` once the countdown is over
    pub fn label_at(elapsed: f32, settings: &Settings) -> Option<CountdownLabel> {
        let ticks_secs = settings.countdown_ticks as f32 * settings.countdown_tick_secs;
        if elapsed < ticks_secs {
            let index = ((elapsed / settings.countdown_tick_secs) as u32)
                .min(settings.countdown_ticks.saturating_sub(1));
            Some(CountdownLabel::Number(settings.countdown_ticks - index))
        } else if elapsed < settings.countdown_secs() {
            Some(CountdownLabel::Go)
        } else {
            None
        }
    }

    /// Advance the timer. Returns the new label if it changed; `Some(None)`
    /// means the countdown just finished.
    pub fn advance(&mut self, dt: f32, settings: &Settings) -> Option<Option<CountdownLabel>> {
        self.elapsed += dt.max(0.0);
        let label = Self::label_at(self.elapsed, settings);
        if label != self.label {
            self.label = label;
            Some(label)
        } else {
            None
        }
    }

    pub fn label(&self) -> Option<CountdownLabel> {
        self.label
    }

    pub fn is_finished(&self) -> bool {
        self.label.is_none()
    }
}

/// The track and difficulty of the current run
#[derive(Debug, Clone)]
pub struct ActiveTrack {
    pub track: Track,
    pub difficulty: Difficulty,
}

/// All mutable state of a session
#[derive(Debug, Clone)]
pub struct SessionState {
    pub phase: Phase,
    /// Menu selection, not yet started
    pub selection: Option<(String, Difficulty)>,
    pub active: Option<ActiveTrack>,
    /// Song clock: seconds of Playing since the run started
    pub song_time: f32,
    pub score: ScoreTracker,
    pub pattern: Vec<PatternEvent>,
    pub scheduler: SpawnScheduler,
    pub registry: NoteRegistry,
    pub countdown: Option<Countdown>,
    /// Bumped on every restart / return to menu
    pub epoch: u32,
    /// Spawns that fell back to nominal depth this run
    pub spawn_fallbacks: u32,
    /// Pending side effects, drained by the host
    pub events: Vec<GameEvent>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            selection: None,
            active: None,
            song_time: 0.0,
            score: ScoreTracker::default(),
            pattern: Vec::new(),
            scheduler: SpawnScheduler::default(),
            registry: NoteRegistry::default(),
            countdown: None,
            epoch: 0,
            spawn_fallbacks: 0,
            events: Vec::new(),
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: impl Into<GameEvent>) {
        self.events.push(event.into());
    }

    /// Whether the pattern is used up and the track is empty
    pub fn is_song_complete(&self) -> bool {
        let Some(active) = &self.active else {
            return false;
        };
        self.scheduler.is_exhausted(&self.pattern)
            && self.registry.is_empty()
            && self.song_time > active.track.duration
    }
}
