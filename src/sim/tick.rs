//! Per-frame simulation tick
//!
//! One call per rendered frame. While Playing the stages always run in this
//! order: spawn, motion/expiry, hit detection, scoring. A note that expires
//! in a frame is gone before hit detection looks at it.

use glam::Vec3;
use rand::Rng;

use super::events::{AudioRequest, PresentationEvent, RemovalReason};
use super::hit::{self, Hit};
use super::registry::{Note, NoteRegistry};
use super::scheduler::{self, DepthChoice};
use super::session::{ControlEvent, complete_countdown, emit_hud, finish};
use super::state::{Phase, SessionState};
use crate::settings::Settings;

/// Input for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// World positions of the two strike points (left, right)
    pub strike_points: [Vec3; 2],
    /// Control events received since the last frame, applied before simulating
    pub controls: Vec<ControlEvent>,
}

/// Clamp a raw frame delta into `[0, max_frame_dt]`
#[inline]
pub fn clamp_dt(dt: f32, max_frame_dt: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, max_frame_dt)
    } else {
        0.0
    }
}

/// Advance the session by one frame
pub fn tick<R: Rng + ?Sized>(
    state: &mut SessionState,
    settings: &Settings,
    rng: &mut R,
    input: &TickInput,
    dt: f32,
) {
    let dt = clamp_dt(dt, settings.max_frame_dt);

    match state.phase {
        Phase::Idle | Phase::Paused | Phase::Finished => return,
        Phase::Countdown => {
            tick_countdown(state, settings, dt);
            return;
        }
        Phase::Playing => {}
    }

    state.song_time += dt;

    // --- SPAWN ---
    let spawned = spawn_due(state, settings, rng);
    for (note, choice) in spawned {
        if choice.fallback {
            state.spawn_fallbacks += 1;
        }
        state.emit(PresentationEvent::NoteSpawned(note));
    }

    // --- MOTION / EXPIRY ---
    let misses = move_notes(&mut state.registry, settings, dt);

    // --- HIT DETECTION ---
    let hits = hit::evaluate(&mut state.registry, &input.strike_points, settings);

    // --- SCORING ---
    apply_results(state, settings, misses, hits);

    if state.is_song_complete() {
        finish(state, settings);
    }
}

fn tick_countdown(state: &mut SessionState, settings: &Settings, dt: f32) {
    let Some(countdown) = state.countdown.as_mut() else {
        // Countdown phase without a timer: treat as already elapsed
        complete_countdown(state, settings);
        return;
    };
    match countdown.advance(dt, settings) {
        Some(Some(label)) => state.emit(PresentationEvent::Countdown(Some(label))),
        Some(None) => complete_countdown(state, settings),
        None => {}
    }
}

/// Release due pattern events and spawn their notes
fn spawn_due<R: Rng + ?Sized>(
    state: &mut SessionState,
    settings: &Settings,
    rng: &mut R,
) -> Vec<(Note, DepthChoice)> {
    let due = state
        .scheduler
        .take_due(&state.pattern, state.song_time, settings.look_ahead())
        .to_vec();

    let mut spawned = Vec::with_capacity(due.len());
    for event in due {
        let (placement, choice) =
            scheduler::place_note(rng, event.lane, state.registry.occupancy(), settings);
        spawned.push((state.registry.spawn(placement), choice));
    }
    spawned
}

/// Move every live note; returns the notes that expired as misses
fn move_notes(registry: &mut NoteRegistry, settings: &Settings, dt: f32) -> Vec<Note> {
    registry.advance(dt, settings.note_speed, settings.despawn_depth)
}

/// Apply this frame's misses then hits to the score and queue their effects.
///
/// Results for notes from an earlier epoch are dropped.
fn apply_results(state: &mut SessionState, settings: &Settings, misses: Vec<Note>, hits: Vec<Hit>) {
    let epoch = state.epoch;
    let mut changed = false;

    for note in misses {
        if note.id.epoch != epoch {
            log::debug!("Dropping stale miss for {:?}", note.id);
            continue;
        }
        state.score.record_miss();
        changed = true;
        state.emit(AudioRequest::MissCue {
            volume: settings.audio.miss_cue_volume,
        });
        state.emit(PresentationEvent::NoteRemoved {
            note,
            reason: RemovalReason::Miss,
        });
    }

    for hit in hits {
        if hit.note.id.epoch != epoch {
            log::debug!("Dropping stale hit for {:?}", hit.note.id);
            continue;
        }
        state.score.record_hit(hit.score_delta);
        changed = true;
        state.emit(PresentationEvent::HitEffect {
            position: hit.effect_position,
        });
        state.emit(AudioRequest::HitCue {
            volume: settings.audio.hit_cue_volume,
        });
        state.emit(PresentationEvent::NoteRemoved {
            note: hit.note,
            reason: RemovalReason::Hit,
        });
    }

    if changed {
        emit_hud(state);
    }
}
