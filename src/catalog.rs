//! Track catalog
//!
//! A static list of playable tracks, supplied by the host and read-only to
//! the simulation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::consts::MAX_TRACK_DURATION;
use crate::error::{Error, Result};
use crate::settings::Difficulty;

/// Star rating per difficulty (display only)
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StarRatings {
    pub easy: u8,
    pub normal: u8,
    pub hard: u8,
}

impl StarRatings {
    pub fn for_difficulty(&self, difficulty: Difficulty) -> u8 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Normal => self.normal,
            Difficulty::Hard => self.hard,
        }
    }
}

/// An immutable track definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artist: String,
    /// Track length in seconds
    pub duration: f32,
    #[serde(default)]
    pub stars: StarRatings,
}

impl Track {
    pub fn new(id: &str, name: &str, artist: &str, duration: f32, stars: StarRatings) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            artist: artist.to_string(),
            duration,
            stars,
        }
    }

    /// Duration formatted as m:ss
    pub fn duration_label(&self) -> String {
        let total = self.duration.max(0.0).round() as u32;
        format!("{}:{:02}", total / 60, total % 60)
    }

    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::InvalidTrack {
                id: self.id.clone(),
                reason: "empty id".to_string(),
            });
        }
        if !(self.duration > 0.0) || !self.duration.is_finite() {
            return Err(Error::InvalidTrack {
                id: self.id.clone(),
                reason: format!("duration must be positive, got {}", self.duration),
            });
        }
        if self.duration > MAX_TRACK_DURATION {
            return Err(Error::InvalidTrack {
                id: self.id.clone(),
                reason: format!(
                    "duration {} exceeds the {} s limit",
                    self.duration, MAX_TRACK_DURATION
                ),
            });
        }
        Ok(())
    }
}

/// The list of tracks a session may select from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub tracks: Vec<Track>,
}

impl Catalog {
    /// Build a catalog, rejecting invalid or duplicate tracks
    pub fn new(tracks: Vec<Track>) -> Result<Self> {
        let mut seen = HashSet::new();
        for track in &tracks {
            track.validate()?;
            if !seen.insert(track.id.as_str()) {
                return Err(Error::InvalidTrack {
                    id: track.id.clone(),
                    reason: "duplicate id".to_string(),
                });
            }
        }
        Ok(Self { tracks })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Catalog = serde_json::from_str(json)?;
        let catalog = Self::new(raw.tracks)?;
        log::info!("Loaded catalog with {} tracks", catalog.len());
        Ok(catalog)
    }

    /// The demo tracks shipped with the game
    pub fn builtin() -> Self {
        Self {
            tracks: vec![
                Track::new(
                    "capibara_candidata",
                    "Capibara candidata",
                    "Gemini",
                    99.0,
                    StarRatings { easy: 2, normal: 3, hard: 5 },
                ),
                Track::new(
                    "capibara_mistica",
                    "Capibara mística",
                    "Gemini",
                    35.0,
                    StarRatings { easy: 1, normal: 3, hard: 4 },
                ),
                Track::new(
                    "pollo_mago",
                    "Pollo mago",
                    "Gemini",
                    30.0,
                    StarRatings { easy: 2, normal: 3, hard: 5 },
                ),
            ],
        }
    }

    pub fn find(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn first(&self) -> Option<&Track> {
        self.tracks.first()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_is_valid() {
        let builtin = Catalog::builtin();
        let checked = Catalog::new(builtin.tracks.clone()).unwrap();
        assert_eq!(checked.len(), 3);
        assert_eq!(checked.find("pollo_mago").map(|t| t.duration), Some(30.0));
        assert!(checked.find("missing").is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let t = Track::new("a", "A", "", 10.0, StarRatings::default());
        let err = Catalog::new(vec![t.clone(), t]).unwrap_err();
        assert!(matches!(err, Error::InvalidTrack { .. }));
    }

    #[test]
    fn test_from_json_validates_duration() {
        let err = Catalog::from_json(r#"{ "tracks": [ { "id": "x", "name": "X", "duration": 0 } ] }"#)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTrack { .. }));

        let ok = Catalog::from_json(r#"{ "tracks": [ { "id": "x", "name": "X", "duration": 42.5 } ] }"#)
            .unwrap();
        assert_eq!(ok.first().map(|t| t.artist.as_str()), Some(""));
    }

    #[test]
    fn test_oversize_duration_rejected() {
        let err = Catalog::from_json(r#"{ "tracks": [ { "id": "x", "name": "X", "duration": 1e12 } ] }"#)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTrack { ref id, .. } if id == "x"));

        let day = Track::new("day", "Day", "", MAX_TRACK_DURATION, StarRatings::default());
        assert!(Catalog::new(vec![day]).is_ok());
    }

    #[test]
    fn test_duration_label() {
        let t = Track::new("a", "A", "", 99.0, StarRatings::default());
        assert_eq!(t.duration_label(), "1:39");
        assert_eq!(Catalog::builtin().tracks[2].stars.for_difficulty(Difficulty::Hard), 5);
    }
}
