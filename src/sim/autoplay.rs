//! Demo mode - the game plays itself
//!
//! Produces strike positions from the live notes: each hand waits at a rest
//! pose and snaps onto the note on its side once that note is close enough
//! to its ideal arrival. Overdue notes go first so none expire.

use glam::Vec3;

use super::hit::{in_window, time_to_arrival};
use super::registry::NoteRegistry;
use crate::settings::Settings;

/// Strike once a note is this close (seconds) to the hit zone
pub const AIM_WINDOW: f32 = 0.05;

/// Rest poses, below the lowest note height so they never touch a note
pub const REST_LEFT: Vec3 = Vec3::new(-0.4, -1.0, 0.0);
pub const REST_RIGHT: Vec3 = Vec3::new(0.4, -1.0, 0.0);

/// Strike positions for this frame
pub fn strike_points(registry: &NoteRegistry, settings: &Settings, aim_window: f32) -> [Vec3; 2] {
    let mut left: Option<(f32, Vec3)> = None;
    let mut right: Option<(f32, Vec3)> = None;

    for note in registry.iter() {
        if note.struck || !in_window(note, settings) {
            continue;
        }
        // Signed: negative once the note is past the hit zone
        let tta = time_to_arrival(note, settings);
        let urgency = if note.depth() > settings.hit_zone_depth { -tta } else { tta };
        if urgency > aim_window {
            continue;
        }
        let slot = if note.position.x < 0.0 { &mut left } else { &mut right };
        if slot.is_none_or(|(best, _)| urgency < best) {
            *slot = Some((urgency, note.position));
        }
    }

    [
        left.map(|(_, p)| p).unwrap_or(REST_LEFT),
        right.map(|(_, p)| p).unwrap_or(REST_RIGHT),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::settings::Difficulty;
    use crate::sim::registry::{DepthKey, SpawnPlacement};
    use crate::sim::{Phase, Session};

    fn spawn(reg: &mut NoteRegistry, lateral: f32, depth: f32) {
        reg.spawn(SpawnPlacement {
            lane: 0,
            lateral,
            height: 1.5,
            depth,
            depth_key: DepthKey::from_depth(depth, 0.1),
        });
    }

    #[test]
    fn test_rest_when_nothing_is_close() {
        let settings = Settings::default();
        let mut reg = NoteRegistry::new();
        spawn(&mut reg, -1.8, -30.0);
        assert_eq!(strike_points(&reg, &settings, AIM_WINDOW), [REST_LEFT, REST_RIGHT]);
    }

    #[test]
    fn test_each_hand_takes_its_side() {
        let settings = Settings::default();
        let mut reg = NoteRegistry::new();
        spawn(&mut reg, -1.8, -2.0);
        spawn(&mut reg, 0.6, -2.1);
        let [l, r] = strike_points(&reg, &settings, AIM_WINDOW);
        assert_eq!(l, Vec3::new(-1.8, 1.5, -2.0));
        assert_eq!(r, Vec3::new(0.6, 1.5, -2.1));
    }

    #[test]
    fn test_autoplay_clears_a_song() {
        let mut session = Session::new(Catalog::builtin(), Settings::default(), 99);
        session.select_track("pollo_mago", Difficulty::Hard).unwrap();
        session.start().unwrap();

        let dt = 1.0 / 60.0;
        let mut frames = 0;
        while session.phase() != Phase::Finished {
            let strikes = strike_points(session.registry(), session.settings(), AIM_WINDOW);
            session.advance(dt, strikes);
            frames += 1;
            assert!(frames < 60 * 120, "song never finished");
        }

        let notes = session.pattern().len() as u32;
        assert!(notes > 0);
        assert_eq!(session.max_combo(), notes);
        assert!(session.score() >= notes as u64 * 50);
        assert!(session.registry().occupancy().is_empty());
    }
}
