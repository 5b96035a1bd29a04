//! Side-effect requests emitted by the simulation
//!
//! The simulation never plays audio or draws anything. It queues
//! [`GameEvent`]s; the host drains them each frame and routes them to its
//! audio and presentation layers, usually through [`dispatch`].

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::registry::Note;
use super::state::Phase;

/// Why a note left the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalReason {
    Hit,
    Miss,
    /// Cleared by restart / return to menu
    Cleared,
}

/// Countdown display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountdownLabel {
    Number(u32),
    Go,
}

impl std::fmt::Display for CountdownLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CountdownLabel::Number(n) => write!(f, "{}", n),
            CountdownLabel::Go => write!(f, "GO"),
        }
    }
}

/// Menu overlays the host should show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Overlay {
    SongSelect,
    Pause,
    Results { score: u64, max_combo: u32 },
    /// No menu; gameplay view only
    Hidden,
}

/// Requests for the audio host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AudioRequest {
    HitCue { volume: f32 },
    MissCue { volume: f32 },
    StartMusic { track_id: String, volume: f32 },
    SetMusicVolume(f32),
    PauseMusic,
    ResumeMusic,
    StopMusic,
    SetAmbientVolume(f32),
}

/// Facts for the presentation host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PresentationEvent {
    NoteSpawned(Note),
    NoteRemoved { note: Note, reason: RemovalReason },
    HitEffect { position: Vec3 },
    /// `None` hides the countdown
    Countdown(Option<CountdownLabel>),
    Overlay(Overlay),
    Hud { score: u64, combo: u32 },
    PhaseChanged { from: Phase, to: Phase },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Audio(AudioRequest),
    Presentation(PresentationEvent),
}

impl From<AudioRequest> for GameEvent {
    fn from(request: AudioRequest) -> Self {
        GameEvent::Audio(request)
    }
}

impl From<PresentationEvent> for GameEvent {
    fn from(event: PresentationEvent) -> Self {
        GameEvent::Presentation(event)
    }
}

/// Audio host. Every method defaults to a no-op so a host can ignore cues
/// it has no asset for.
pub trait AudioSink {
    fn play_hit_cue(&mut self, _volume: f32) {}
    fn play_miss_cue(&mut self, _volume: f32) {}
    fn start_music(&mut self, _track_id: &str, _volume: f32) {}
    fn set_music_volume(&mut self, _volume: f32) {}
    fn pause_music(&mut self) {}
    fn resume_music(&mut self) {}
    fn stop_music(&mut self) {}
    fn set_ambient_volume(&mut self, _volume: f32) {}
}

/// Presentation host
pub trait PresentationSink {
    fn on_note_spawned(&mut self, _note: &Note) {}
    fn on_note_removed(&mut self, _note: &Note, _reason: RemovalReason) {}
    fn on_hit_effect(&mut self, _position: Vec3) {}
    fn on_countdown(&mut self, _label: Option<CountdownLabel>) {}
    fn on_overlay(&mut self, _overlay: Overlay) {}
    fn on_hud(&mut self, _score: u64, _combo: u32) {}
    fn on_phase_changed(&mut self, _from: Phase, _to: Phase) {}
}

/// Route drained events to their sinks, in order
pub fn dispatch<'a>(
    events: impl IntoIterator<Item = &'a GameEvent>,
    audio: &mut dyn AudioSink,
    presentation: &mut dyn PresentationSink,
) {
    for event in events {
        match event {
            GameEvent::Audio(request) => match request {
                AudioRequest::HitCue { volume } => audio.play_hit_cue(*volume),
                AudioRequest::MissCue { volume } => audio.play_miss_cue(*volume),
                AudioRequest::StartMusic { track_id, volume } => {
                    audio.start_music(track_id, *volume)
                }
                AudioRequest::SetMusicVolume(v) => audio.set_music_volume(*v),
                AudioRequest::PauseMusic => audio.pause_music(),
                AudioRequest::ResumeMusic => audio.resume_music(),
                AudioRequest::StopMusic => audio.stop_music(),
                AudioRequest::SetAmbientVolume(v) => audio.set_ambient_volume(*v),
            },
            GameEvent::Presentation(fact) => match fact {
                PresentationEvent::NoteSpawned(note) => presentation.on_note_spawned(note),
                PresentationEvent::NoteRemoved { note, reason } => {
                    presentation.on_note_removed(note, *reason)
                }
                PresentationEvent::HitEffect { position } => presentation.on_hit_effect(*position),
                PresentationEvent::Countdown(label) => presentation.on_countdown(*label),
                PresentationEvent::Overlay(overlay) => presentation.on_overlay(*overlay),
                PresentationEvent::Hud { score, combo } => presentation.on_hud(*score, *combo),
                PresentationEvent::PhaseChanged { from, to } => {
                    presentation.on_phase_changed(*from, *to)
                }
            },
        }
    }
}
