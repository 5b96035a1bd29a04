//! Session state machine
//!
//! Idle → Countdown → Playing ⇄ (Paused → Countdown) → Finished, plus
//! restart and return-to-menu from anywhere. The session is the only writer
//! of [`SessionState`] and the only gate on whether a frame simulates.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::events::{AudioRequest, GameEvent, Overlay, PresentationEvent, RemovalReason};
use super::pattern::{self, PatternShape};
use super::registry::{Note, NoteRegistry};
use super::state::{ActiveTrack, Countdown, CountdownPurpose, Phase, SessionState};
use super::tick::{TickInput, tick};
use crate::catalog::{Catalog, Track};
use crate::error::{Error, Result};
use crate::settings::{Difficulty, Settings};

/// Discrete control input from menus and controllers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlEvent {
    SelectTrack { id: String, difficulty: Difficulty },
    Start,
    Pause,
    Resume,
    /// Pause if playing, resume if paused (controller grip)
    TogglePause,
    Restart,
    ReturnToMenu,
}

/// A rhythm game session: catalog, tuning, RNG and the single session state
#[derive(Debug, Clone)]
pub struct Session {
    catalog: Catalog,
    settings: Settings,
    seed: u64,
    rng: Pcg32,
    state: SessionState,
}

impl Session {
    /// Create a session at the song select menu. `settings` are sanitized
    /// first.
    pub fn new(catalog: Catalog, settings: Settings, seed: u64) -> Self {
        let mut session = Self {
            catalog,
            settings: settings.sanitized(),
            seed,
            rng: Pcg32::seed_from_u64(seed),
            state: SessionState::new(),
        };
        let ambient = session.settings.audio.ambient_menu;
        session.state.emit(AudioRequest::SetAmbientVolume(ambient));
        session.state.emit(PresentationEvent::Overlay(Overlay::SongSelect));
        log::info!(
            "Session created with {} tracks, seed {}",
            session.catalog.len(),
            seed
        );
        session
    }

    // === Control input ===

    pub fn handle(&mut self, control: ControlEvent) -> Result<()> {
        match control {
            ControlEvent::SelectTrack { id, difficulty } => self.select_track(&id, difficulty),
            ControlEvent::Start => self.start(),
            ControlEvent::Pause => {
                self.pause();
                Ok(())
            }
            ControlEvent::Resume => {
                self.resume();
                Ok(())
            }
            ControlEvent::TogglePause => {
                match self.state.phase {
                    Phase::Playing => self.pause(),
                    Phase::Paused => self.resume(),
                    _ => {}
                }
                Ok(())
            }
            ControlEvent::Restart => self.restart(),
            ControlEvent::ReturnToMenu => {
                self.return_to_menu();
                Ok(())
            }
        }
    }

    /// Choose the track and difficulty the next `start()` will play
    pub fn select_track(&mut self, id: &str, difficulty: Difficulty) -> Result<()> {
        if self.catalog.find(id).is_none() {
            log::warn!("Rejected selection of unknown track {:?}", id);
            return Err(Error::UnknownTrack(id.to_string()));
        }
        self.state.selection = Some((id.to_string(), difficulty));
        log::debug!("Selected {} ({})", id, difficulty.as_str());
        Ok(())
    }

    /// Idle → Countdown with a freshly generated pattern
    pub fn start(&mut self) -> Result<()> {
        if self.state.phase != Phase::Idle {
            log::debug!("start() ignored in {}", self.state.phase.as_str());
            return Ok(());
        }
        let (id, difficulty) = self.state.selection.clone().ok_or_else(|| {
            log::warn!("start() with no track selected");
            Error::NoTrackSelected
        })?;
        let track = self.resolve(&id)?;
        self.begin_run(track, difficulty);
        Ok(())
    }

    /// Playing → Paused
    pub fn pause(&mut self) {
        if self.state.phase != Phase::Playing {
            log::debug!("pause() ignored in {}", self.state.phase.as_str());
            return;
        }
        let ambient = self.settings.audio.ambient_paused;
        let state = &mut self.state;
        state.emit(AudioRequest::PauseMusic);
        state.emit(AudioRequest::SetAmbientVolume(ambient));
        state.emit(PresentationEvent::Overlay(Overlay::Pause));
        set_phase(state, Phase::Paused);
    }

    /// Paused → Countdown; play resumes when the countdown ends
    pub fn resume(&mut self) {
        if self.state.phase != Phase::Paused {
            log::debug!("resume() ignored in {}", self.state.phase.as_str());
            return;
        }
        self.state.emit(PresentationEvent::Overlay(Overlay::Hidden));
        enter_countdown(&mut self.state, &self.settings, CountdownPurpose::Resume);
    }

    /// Playing | Paused | Finished → Countdown on the same track and difficulty
    pub fn restart(&mut self) -> Result<()> {
        match self.state.phase {
            Phase::Playing | Phase::Paused | Phase::Finished => {}
            Phase::Countdown => {
                log::debug!("restart() ignored during countdown");
                return Ok(());
            }
            Phase::Idle => {
                log::warn!("restart() with no active track");
                return Err(Error::NoTrackSelected);
            }
        }
        let Some(active) = &self.state.active else {
            log::warn!("restart() with no active track");
            return Err(Error::NoTrackSelected);
        };
        let (id, difficulty) = (active.track.id.clone(), active.difficulty);
        let track = self.resolve(&id)?;
        self.begin_run(track, difficulty);
        Ok(())
    }

    /// Any phase → Idle: clear the track, stop the music, reset the score
    pub fn return_to_menu(&mut self) {
        let ambient = self.settings.audio.ambient_menu;
        let state = &mut self.state;
        clear_run(state);
        state.active = None;
        state.pattern.clear();
        state.countdown = None;
        state.emit(AudioRequest::StopMusic);
        state.emit(AudioRequest::SetAmbientVolume(ambient));
        state.emit(PresentationEvent::Countdown(None));
        state.emit(PresentationEvent::Overlay(Overlay::SongSelect));
        emit_hud(state);
        set_phase(state, Phase::Idle);
    }

    // === Frame ===

    /// Run one frame with the current strike positions
    pub fn advance(&mut self, dt: f32, strike_points: [Vec3; 2]) {
        let input = TickInput {
            strike_points,
            ..Default::default()
        };
        self.tick(&input, dt);
    }

    /// Run one frame: apply queued controls, then simulate
    pub fn tick(&mut self, input: &TickInput, dt: f32) {
        for control in &input.controls {
            if let Err(e) = self.handle(control.clone()) {
                log::warn!("Control {:?} rejected: {}", control, e);
            }
        }
        tick(&mut self.state, &self.settings, &mut self.rng, input, dt);
    }

    /// Take all side effects queued since the last drain.
    ///
    /// The queue is unbounded; hosts drain it once per frame, after
    /// [`Session::advance`] or [`Session::tick`]. Events queued by
    /// [`Session::new`] and by control calls wait here until then.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.state.events)
    }

    // === Read-only views ===

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn score(&self) -> u64 {
        self.state.score.score()
    }

    pub fn combo(&self) -> u32 {
        self.state.score.combo()
    }

    pub fn max_combo(&self) -> u32 {
        self.state.score.max_combo()
    }

    pub fn song_time(&self) -> f32 {
        self.state.song_time
    }

    pub fn live_notes(&self) -> &[Note] {
        self.state.registry.notes()
    }

    pub fn registry(&self) -> &NoteRegistry {
        &self.state.registry
    }

    pub fn active_track(&self) -> Option<&ActiveTrack> {
        self.state.active.as_ref()
    }

    pub fn pattern(&self) -> &[pattern::PatternEvent] {
        &self.state.pattern
    }

    pub fn pattern_cursor(&self) -> usize {
        self.state.scheduler.cursor()
    }

    pub fn countdown(&self) -> Option<&Countdown> {
        self.state.countdown.as_ref()
    }

    pub fn spawn_fallbacks(&self) -> u32 {
        self.state.spawn_fallbacks
    }

    pub fn epoch(&self) -> u32 {
        self.state.epoch
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    // === Internals ===

    fn resolve(&self, id: &str) -> Result<Track> {
        self.catalog
            .find(id)
            .cloned()
            .ok_or_else(|| Error::UnknownTrack(id.to_string()))
    }

    /// Clear the previous run, generate a new pattern and start the countdown
    fn begin_run(&mut self, track: Track, difficulty: Difficulty) {
        let state = &mut self.state;
        clear_run(state);
        if state.active.is_some() {
            state.emit(AudioRequest::StopMusic);
        }

        let shape = PatternShape::from_settings(&self.settings);
        state.pattern = pattern::generate(&mut self.rng, &shape, track.duration, difficulty.density());
        log::info!(
            "Starting {} ({}) with {} notes",
            track.id,
            difficulty.as_str(),
            state.pattern.len()
        );
        state.active = Some(ActiveTrack { track, difficulty });

        state.emit(PresentationEvent::Overlay(Overlay::Hidden));
        emit_hud(state);
        enter_countdown(state, &self.settings, CountdownPurpose::Start);
    }
}

/// Change phase and announce it
pub(crate) fn set_phase(state: &mut SessionState, to: Phase) {
    let from = state.phase;
    if from == to {
        return;
    }
    state.phase = to;
    log::info!("Phase {} -> {}", from.as_str(), to.as_str());
    state.emit(PresentationEvent::PhaseChanged { from, to });
}

pub(crate) fn emit_hud(state: &mut SessionState) {
    let (score, combo) = (state.score.score(), state.score.combo());
    state.emit(PresentationEvent::Hud { score, combo });
}

/// Drop every live note and reset all per-run counters under a new epoch.
///
/// Anything still referring to the previous epoch is ignored afterwards.
fn clear_run(state: &mut SessionState) {
    state.epoch = state.epoch.wrapping_add(1);
    let cleared = state.registry.begin_epoch(state.epoch);
    for note in cleared {
        state.emit(PresentationEvent::NoteRemoved {
            note,
            reason: RemovalReason::Cleared,
        });
    }
    state.scheduler.reset();
    state.score.reset();
    state.song_time = 0.0;
    state.spawn_fallbacks = 0;
}

fn enter_countdown(state: &mut SessionState, settings: &Settings, purpose: CountdownPurpose) {
    let (countdown, label) = Countdown::new(purpose, settings);
    state.countdown = Some(countdown);
    state.emit(PresentationEvent::Countdown(Some(label)));
    set_phase(state, Phase::Countdown);
}

/// Countdown finished: Countdown → Playing
pub(crate) fn complete_countdown(state: &mut SessionState, settings: &Settings) {
    let Some(countdown) = state.countdown.take() else {
        return;
    };
    match countdown.purpose {
        CountdownPurpose::Start => {
            state.scheduler.reset();
            state.score.reset();
            state.song_time = 0.0;
            if let Some(active) = &state.active {
                let track_id = active.track.id.clone();
                state.emit(AudioRequest::StartMusic {
                    track_id,
                    volume: settings.audio.music_volume,
                });
            }
            emit_hud(state);
        }
        CountdownPurpose::Resume => {
            state.emit(AudioRequest::ResumeMusic);
        }
    }
    state.emit(AudioRequest::SetAmbientVolume(settings.audio.ambient_playing));
    state.emit(PresentationEvent::Countdown(None));
    set_phase(state, Phase::Playing);
}

/// Song over: Playing → Finished
pub(crate) fn finish(state: &mut SessionState, settings: &Settings) {
    let (score, max_combo) = (state.score.score(), state.score.max_combo());
    log::info!("Song finished: score {}, max combo {}", score, max_combo);
    state.emit(AudioRequest::StopMusic);
    state.emit(AudioRequest::SetAmbientVolume(settings.audio.ambient_menu));
    state.emit(PresentationEvent::Overlay(Overlay::Results { score, max_combo }));
    set_phase(state, Phase::Finished);
}
