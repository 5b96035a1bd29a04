//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Frame time is clamped before use
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No audio, rendering or platform dependencies; side effects leave as
//!   [`GameEvent`]s

pub mod autoplay;
pub mod events;
pub mod hit;
pub mod pattern;
pub mod registry;
pub mod scheduler;
pub mod score;
pub mod session;
pub mod state;
pub mod tick;

pub use events::{
    AudioRequest, AudioSink, CountdownLabel, GameEvent, Overlay, PresentationEvent,
    PresentationSink, RemovalReason, dispatch,
};
pub use hit::{Hit, Striker};
pub use pattern::{PatternEvent, PatternShape};
pub use registry::{DepthKey, DepthOccupancy, Note, NoteId, NoteRegistry, SpawnPlacement};
pub use scheduler::{DepthChoice, SpawnScheduler};
pub use score::ScoreTracker;
pub use session::{ControlEvent, Session};
pub use state::{ActiveTrack, Countdown, CountdownPurpose, Phase, SessionState};
pub use tick::{TickInput, tick};
