//! Beat Strike headless demo
//!
//! Plays one song with the autoplay strike source and logs everything the
//! simulation asks the host to play or draw.
//!
//! Usage: `beat-strike [track-id] [difficulty] [seed] [settings.json]`

use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use beat_strike::sim::{
    AudioSink, ControlEvent, CountdownLabel, Note, Overlay, Phase, PresentationSink,
    RemovalReason, Session, TickInput, autoplay, dispatch,
};
use beat_strike::{Catalog, Difficulty, Error, Result, Settings};
use glam::Vec3;

/// Host frame time
const FRAME_DT: f32 = 1.0 / 60.0;
/// Safety stop for the frame loop (10 minutes of frames)
const MAX_FRAMES: u32 = 60 * 600;

/// Logs audio requests instead of playing them
struct LogAudio;

impl AudioSink for LogAudio {
    fn play_miss_cue(&mut self, volume: f32) {
        log::debug!("audio: miss cue ({:.2})", volume);
    }

    fn start_music(&mut self, track_id: &str, volume: f32) {
        log::info!("audio: start music {} ({:.2})", track_id, volume);
    }

    fn pause_music(&mut self) {
        log::info!("audio: pause music");
    }

    fn resume_music(&mut self) {
        log::info!("audio: resume music");
    }

    fn stop_music(&mut self) {
        log::info!("audio: stop music");
    }

    fn set_ambient_volume(&mut self, volume: f32) {
        log::debug!("audio: ambient volume {:.2}", volume);
    }
}

/// Tallies what a renderer would have drawn
#[derive(Default)]
struct Tally {
    spawned: u32,
    hits: u32,
    misses: u32,
    effects: u32,
}

impl PresentationSink for Tally {
    fn on_note_spawned(&mut self, _note: &Note) {
        self.spawned += 1;
    }

    fn on_note_removed(&mut self, _note: &Note, reason: RemovalReason) {
        match reason {
            RemovalReason::Hit => self.hits += 1,
            RemovalReason::Miss => self.misses += 1,
            RemovalReason::Cleared => {}
        }
    }

    fn on_hit_effect(&mut self, _position: Vec3) {
        self.effects += 1;
    }

    fn on_countdown(&mut self, label: Option<CountdownLabel>) {
        if let Some(label) = label {
            log::info!("countdown: {}", label);
        }
    }

    fn on_overlay(&mut self, overlay: Overlay) {
        if let Overlay::Results { score, max_combo } = overlay {
            log::info!("results: score {}, max combo {}", score, max_combo);
        }
    }
}

struct Args {
    track_id: Option<String>,
    difficulty: Difficulty,
    seed: u64,
    settings_path: Option<String>,
}

fn parse_args() -> Args {
    let mut args = std::env::args().skip(1);
    let track_id = args.next();
    let difficulty = args
        .next()
        .map(|s| {
            Difficulty::from_str(&s).unwrap_or_else(|| {
                log::warn!("Unknown difficulty {:?}, using Normal", s);
                Difficulty::Normal
            })
        })
        .unwrap_or_default();
    let seed = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(clock_seed);
    let settings_path = args.next();

    Args {
        track_id,
        difficulty,
        seed,
        settings_path,
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn load_settings(path: Option<&str>) -> Result<Settings> {
    match path {
        Some(path) => Settings::from_json(&std::fs::read_to_string(path)?),
        None => Ok(Settings::default()),
    }
}

fn run(args: Args) -> Result<()> {
    let settings = load_settings(args.settings_path.as_deref())?;
    let catalog = Catalog::builtin();
    let track_id = match args.track_id {
        Some(id) => id,
        None => catalog
            .first()
            .map(|t| t.id.clone())
            .ok_or(Error::NoTrackSelected)?,
    };

    let mut session = Session::new(catalog, settings, args.seed);
    log::info!("Seed {}", session.seed());

    let mut audio = LogAudio;
    let mut tally = Tally::default();

    session.select_track(&track_id, args.difficulty)?;
    session.start()?;

    let mut input = TickInput::default();
    let mut paused_once = false;
    for _ in 0..MAX_FRAMES {
        input.strike_points =
            autoplay::strike_points(session.registry(), session.settings(), autoplay::AIM_WINDOW);
        session.tick(&input, FRAME_DT);
        input.controls.clear();

        dispatch(&session.drain_events(), &mut audio, &mut tally);

        match session.phase() {
            Phase::Playing
                if !paused_once && session.pattern_cursor() * 2 >= session.pattern().len() =>
            {
                // Show off pause/resume halfway through
                paused_once = true;
                input.controls.push(ControlEvent::Pause);
            }
            Phase::Paused => input.controls.push(ControlEvent::Resume),
            Phase::Finished => {
                log::info!(
                    "Done: {} notes spawned, {} hits, {} misses, {} effects, {} depth fallbacks",
                    tally.spawned,
                    tally.hits,
                    tally.misses,
                    tally.effects,
                    session.spawn_fallbacks()
                );
                return Ok(());
            }
            _ => {}
        }
    }

    log::warn!("Stopped after {} frames without finishing", MAX_FRAMES);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Beat Strike (headless) starting...");

    match run(parse_args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
