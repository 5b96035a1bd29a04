//! Hit detection
//!
//! Brute-force distance test between each live note and the two strike
//! points, gated by how close the note is to its ideal arrival time. Note
//! counts are in the tens, so no broad phase.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::registry::{Note, NoteRegistry};
use crate::consts::{HIT_SCORE_SCALE, MIN_HIT_SCORE};
use crate::settings::Settings;

/// Which strike point made contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Striker {
    Left,
    Right,
}

/// A credited hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub note: Note,
    pub score_delta: u32,
    pub time_to_arrival: f32,
    pub striker: Striker,
    /// Where to draw the hit effect (the crediting strike point)
    pub effect_position: Vec3,
}

/// Seconds until (or since) the note crosses the hit zone
#[inline]
pub fn time_to_arrival(note: &Note, settings: &Settings) -> f32 {
    crate::travel_time(note.depth() - settings.hit_zone_depth, settings.note_speed)
}

/// Whether a note is inside the arrival window (boundary inclusive)
#[inline]
pub fn in_window(note: &Note, settings: &Settings) -> bool {
    time_to_arrival(note, settings) <= settings.hit_window
}

/// Points for a hit `time_to_arrival` seconds from ideal
pub fn score_for(time_to_arrival: f32, hit_window: f32) -> u32 {
    let raw = ((hit_window - time_to_arrival) * HIT_SCORE_SCALE).floor();
    if raw > MIN_HIT_SCORE as f32 {
        raw as u32
    } else {
        MIN_HIT_SCORE
    }
}

/// Test one note against both strike points without touching any state
pub fn detect(note: &Note, strikes: &[Vec3; 2], settings: &Settings) -> Option<Hit> {
    if note.struck {
        return None;
    }
    let tta = time_to_arrival(note, settings);
    if tta > settings.hit_window {
        return None;
    }

    let left = strikes[0].distance(note.position);
    let right = strikes[1].distance(note.position);
    if left >= settings.strike_radius && right >= settings.strike_radius {
        return None;
    }

    // Closer strike point gets the effect; ties go left
    let (striker, effect_position) = if left <= right {
        (Striker::Left, strikes[0])
    } else {
        (Striker::Right, strikes[1])
    };

    Some(Hit {
        note: *note,
        score_delta: score_for(tta, settings.hit_window),
        time_to_arrival: tta,
        striker,
        effect_position,
    })
}

/// Find every note struck this frame and remove it from the registry.
///
/// Must run after the registry has applied this frame's motion and expiry.
pub fn evaluate(registry: &mut NoteRegistry, strikes: &[Vec3; 2], settings: &Settings) -> Vec<Hit> {
    let candidates: Vec<Hit> = registry
        .iter()
        .filter_map(|note| detect(note, strikes, settings))
        .collect();

    candidates
        .into_iter()
        .filter_map(|hit| {
            registry.strike(hit.note.id).map(|note| Hit { note, ..hit })
        })
        .collect()
}
