//! Gameplay tuning and audio mix
//!
//! Defaults are the reference tuning in [`crate::consts`]. Hosts may override
//! any subset of fields from JSON.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::Result;

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "norm" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Pattern density scalar (>1 packs events tighter)
    pub fn density(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.8,
            Difficulty::Normal => 1.0,
            Difficulty::Hard => 1.4,
        }
    }
}

/// Volume levels requested from the audio host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioMix {
    pub music_volume: f32,
    pub hit_cue_volume: f32,
    pub miss_cue_volume: f32,
    /// Ambient bed while in menus / results
    pub ambient_menu: f32,
    /// Ambient bed ducked under the music
    pub ambient_playing: f32,
    /// Ambient bed while paused (raised above playing)
    pub ambient_paused: f32,
}

impl Default for AudioMix {
    fn default() -> Self {
        Self {
            music_volume: 0.85,
            hit_cue_volume: 1.0,
            miss_cue_volume: 0.6,
            ambient_menu: 0.4,
            ambient_playing: 0.12,
            ambient_paused: 0.18,
        }
    }
}

/// Simulation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Track geometry ===
    pub note_speed: f32,
    pub spawn_depth: f32,
    pub hit_zone_depth: f32,
    pub despawn_depth: f32,
    pub lanes: Vec<f32>,
    pub note_height_min: f32,
    pub note_height_max: f32,

    // === Spawn spacing ===
    pub spawn_jitter: f32,
    pub depth_key_resolution: f32,
    pub min_depth_separation: f32,
    pub max_same_depth: u32,
    pub spawn_trials: u32,

    // === Hit detection ===
    pub hit_window: f32,
    pub strike_radius: f32,

    // === Timing ===
    pub max_frame_dt: f32,
    pub countdown_ticks: u32,
    pub countdown_tick_secs: f32,
    pub countdown_go_hold_secs: f32,

    // === Pattern shape ===
    pub lead_in: f32,
    pub base_gap: f32,
    pub gap_spread: f32,

    pub audio: AudioMix,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            note_speed: NOTE_SPEED,
            spawn_depth: NOTE_SPAWN_DEPTH,
            hit_zone_depth: NOTE_HIT_ZONE_DEPTH,
            despawn_depth: NOTE_DESPAWN_DEPTH,
            lanes: LANES.to_vec(),
            note_height_min: NOTE_HEIGHT_MIN,
            note_height_max: NOTE_HEIGHT_MAX,

            spawn_jitter: SPAWN_DEPTH_JITTER,
            depth_key_resolution: DEPTH_KEY_RESOLUTION,
            min_depth_separation: MIN_DEPTH_SEPARATION,
            max_same_depth: MAX_SAME_DEPTH,
            spawn_trials: SPAWN_TRIALS,

            hit_window: HIT_WINDOW,
            strike_radius: STRIKE_RADIUS,

            max_frame_dt: MAX_FRAME_DT,
            countdown_ticks: COUNTDOWN_TICKS,
            countdown_tick_secs: COUNTDOWN_TICK_SECS,
            countdown_go_hold_secs: COUNTDOWN_GO_HOLD_SECS,

            lead_in: PATTERN_LEAD_IN,
            base_gap: PATTERN_BASE_GAP,
            gap_spread: PATTERN_GAP_SPREAD,

            audio: AudioMix::default(),
        }
    }
}

impl Settings {
    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        log::info!("Loaded settings from JSON");
        Ok(settings.sanitized())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Seconds for a note to travel from the nominal spawn depth to the hit zone
    pub fn travel_time(&self) -> f32 {
        crate::travel_time(self.hit_zone_depth - self.spawn_depth, self.note_speed)
    }

    /// Seconds the spawn scheduler looks ahead of the song clock
    pub fn look_ahead(&self) -> f32 {
        crate::travel_time(self.spawn_depth, self.note_speed)
    }

    /// Total countdown length (ticks plus the GO hold)
    pub fn countdown_secs(&self) -> f32 {
        self.countdown_ticks as f32 * self.countdown_tick_secs + self.countdown_go_hold_secs
    }

    pub fn lane_count(&self) -> usize {
        self.lanes.len()
    }

    /// Clamp out-of-range values back to something the simulation can run with
    pub fn sanitized(mut self) -> Self {
        let defaults = Settings::default();

        if !(self.note_speed > 0.0) {
            log::warn!("note_speed {} must be positive, using default", self.note_speed);
            self.note_speed = defaults.note_speed;
        }
        if !(self.max_frame_dt > 0.0) {
            log::warn!("max_frame_dt {} must be positive, using default", self.max_frame_dt);
            self.max_frame_dt = defaults.max_frame_dt;
        }
        if !(self.depth_key_resolution > 0.0) {
            log::warn!(
                "depth_key_resolution {} must be positive, using default",
                self.depth_key_resolution
            );
            self.depth_key_resolution = defaults.depth_key_resolution;
        }
        if self.lanes.is_empty() {
            log::warn!("lane list is empty, using default lanes");
            self.lanes = defaults.lanes;
        }
        if self.despawn_depth <= self.spawn_depth {
            log::warn!("despawn_depth must lie beyond spawn_depth, using defaults");
            self.spawn_depth = defaults.spawn_depth;
            self.despawn_depth = defaults.despawn_depth;
        }
        if self.note_height_max < self.note_height_min {
            std::mem::swap(&mut self.note_height_min, &mut self.note_height_max);
        }
        if self.max_same_depth == 0 {
            self.max_same_depth = 1;
        }
        for (name, secs, default) in [
            (
                "countdown_tick_secs",
                &mut self.countdown_tick_secs,
                defaults.countdown_tick_secs,
            ),
            (
                "countdown_go_hold_secs",
                &mut self.countdown_go_hold_secs,
                defaults.countdown_go_hold_secs,
            ),
        ] {
            if !(*secs >= 0.0) || !secs.is_finite() {
                log::warn!("{} {} must be non-negative, using default", name, secs);
                *secs = default;
            }
        }

        let audio = &mut self.audio;
        for vol in [
            &mut audio.music_volume,
            &mut audio.hit_cue_volume,
            &mut audio.miss_cue_volume,
            &mut audio.ambient_menu,
            &mut audio.ambient_playing,
            &mut audio.ambient_paused,
        ] {
            let clamped = vol.clamp(0.0, 1.0);
            if clamped != *vol {
                log::warn!("volume {} out of range, clamped to {}", vol, clamped);
                *vol = clamped;
            }
        }

        self
    }
}
