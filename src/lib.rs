//! Beat Strike - rhythm game simulation core
//!
//! Core modules:
//! - `sim`: Deterministic gameplay simulation (patterns, spawning, hits, scoring, session flow)
//! - `settings`: Data-driven tuning and audio mix
//! - `catalog`: Track definitions
//!
//! Rendering, audio playback and input devices live outside this crate. The
//! simulation only consumes frame time and strike positions, and emits
//! [`sim::GameEvent`]s describing what the host should play or draw.

pub mod catalog;
pub mod error;
pub mod settings;
pub mod sim;

pub use catalog::{Catalog, Track};
pub use error::{Error, Result};
pub use settings::{Difficulty, Settings};

/// Reference tuning constants
pub mod consts {
    /// Note travel speed along the depth axis (units/s)
    pub const NOTE_SPEED: f32 = 14.0;
    /// Nominal spawn depth (far end of the track)
    pub const NOTE_SPAWN_DEPTH: f32 = -45.0;
    /// Depth at which a note is ideally struck
    pub const NOTE_HIT_ZONE_DEPTH: f32 = -1.8;
    /// Depth past which an unstruck note counts as a miss
    pub const NOTE_DESPAWN_DEPTH: f32 = 6.0;
    /// Total width of the random band around the nominal spawn depth
    pub const SPAWN_DEPTH_JITTER: f32 = 3.5;

    /// Lateral lane positions
    pub const LANES: [f32; 4] = [-1.8, -0.6, 0.6, 1.8];
    /// Random note height band (min, max)
    pub const NOTE_HEIGHT_MIN: f32 = 0.9;
    pub const NOTE_HEIGHT_MAX: f32 = 2.15;

    /// Depth keys are spawn depths rounded to this resolution
    pub const DEPTH_KEY_RESOLUTION: f32 = 0.1;
    /// Minimum distance between two occupied spawn-depth keys
    pub const MIN_DEPTH_SEPARATION: f32 = 1.6;
    /// Maximum live notes sharing one spawn-depth key
    pub const MAX_SAME_DEPTH: u32 = 2;
    /// Attempts at a constrained spawn depth before falling back to nominal
    pub const SPAWN_TRIALS: u32 = 20;

    /// Arrival window (seconds either side of the hit zone)
    pub const HIT_WINDOW: f32 = 0.5;
    /// Strike point to note distance that counts as contact
    pub const STRIKE_RADIUS: f32 = 0.95;
    /// Score for a hit at the edge of the window
    pub const MIN_HIT_SCORE: u32 = 50;
    /// Points per second of timing margin inside the window
    pub const HIT_SCORE_SCALE: f32 = 200.0;

    /// Largest frame delta the simulation accepts (stalled frames are clamped)
    pub const MAX_FRAME_DT: f32 = 0.05;

    /// Countdown: 3-2-1 then GO
    pub const COUNTDOWN_TICKS: u32 = 3;
    pub const COUNTDOWN_TICK_SECS: f32 = 0.9;
    pub const COUNTDOWN_GO_HOLD_SECS: f32 = 0.42;

    /// Pattern generation
    pub const PATTERN_LEAD_IN: f32 = 1.2;
    pub const PATTERN_BASE_GAP: f32 = 0.4;
    pub const PATTERN_GAP_SPREAD: f32 = 0.6;
    /// Patterns stop this many seconds before the end of the track
    pub const PATTERN_TAIL: f32 = 1.0;
    /// Longest accepted track (24 h)
    pub const MAX_TRACK_DURATION: f32 = 86_400.0;
}

/// Seconds a note needs to travel `distance` depth units at `speed`
#[inline]
pub fn travel_time(distance: f32, speed: f32) -> f32 {
    distance.abs() / speed
}
