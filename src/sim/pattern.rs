//! Pattern generation
//!
//! A pattern is the list of (time, lane) targets for one track at one
//! difficulty. It is generated once per selection and only ever replaced.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_TRACK_DURATION;
use crate::settings::Settings;

/// One scheduled target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternEvent {
    /// Seconds from song start at which the note should reach the hit zone
    pub time_offset: f32,
    /// Lane index in `[0, lane_count)`
    pub lane: usize,
}

/// Shape parameters for [`generate`]
#[derive(Debug, Clone, Copy)]
pub struct PatternShape {
    pub lead_in: f32,
    pub base_gap: f32,
    pub gap_spread: f32,
    pub tail: f32,
    pub lane_count: usize,
}

impl PatternShape {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            lead_in: settings.lead_in,
            base_gap: settings.base_gap,
            gap_spread: settings.gap_spread,
            tail: crate::consts::PATTERN_TAIL,
            lane_count: settings.lane_count(),
        }
    }
}

/// Smallest cursor step, so degenerate tunings still terminate
const MIN_STEP: f32 = 1e-3;
/// Upper bound on the up-front allocation
const MAX_CAPACITY_HINT: usize = 4096;

/// Generate a pattern for a track of `duration` seconds.
///
/// The cursor starts at the lead-in and advances by
/// `base_gap + uniform(0, gap_spread) / density` until it reaches
/// `duration - tail`. Offsets are non-decreasing by construction.
pub fn generate<R: Rng + ?Sized>(
    rng: &mut R,
    shape: &PatternShape,
    duration: f32,
    density: f32,
) -> Vec<PatternEvent> {
    let density = if density > 0.0 && density.is_finite() {
        density
    } else {
        log::warn!("Pattern density {} is not positive, using 1.0", density);
        1.0
    };
    if shape.lane_count == 0 {
        return Vec::new();
    }
    let duration = if duration > MAX_TRACK_DURATION {
        log::warn!("Track duration {} clamped to {}", duration, MAX_TRACK_DURATION);
        MAX_TRACK_DURATION
    } else {
        duration
    };

    let end = duration - shape.tail;
    let expected = ((end - shape.lead_in) / (shape.base_gap + shape.gap_spread * 0.5 / density))
        .max(0.0) as usize;
    let mut pattern = Vec::with_capacity(expected.min(MAX_CAPACITY_HINT));

    let mut cursor = shape.lead_in;
    while cursor < end {
        let lane = rng.random_range(0..shape.lane_count);
        pattern.push(PatternEvent {
            time_offset: cursor,
            lane,
        });
        let step = shape.base_gap + rng.random::<f32>() * shape.gap_spread / density;
        cursor += step.max(MIN_STEP);
    }

    log::debug!(
        "Generated {} pattern events (duration={}, density={})",
        pattern.len(),
        duration,
        density
    );
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn shape() -> PatternShape {
        PatternShape::from_settings(&Settings::default())
    }

    fn mean_len(duration: f32, density: f32, runs: u64) -> f32 {
        let total: usize = (0..runs)
            .map(|seed| {
                let mut rng = Pcg32::seed_from_u64(seed);
                generate(&mut rng, &shape(), duration, density).len()
            })
            .sum();
        total as f32 / runs as f32
    }

    #[test]
    fn test_thirty_second_track_count() {
        // Mean gap is 0.4 + 0.3 = 0.7s over 28.8s of usable track
        for seed in 0..20 {
            let mut rng = Pcg32::seed_from_u64(seed);
            let len = generate(&mut rng, &shape(), 30.0, 1.0).len();
            assert!((29..=73).contains(&len), "seed {seed}: {len} events");
        }
        let mean = mean_len(30.0, 1.0, 100);
        assert!((36.0..=46.0).contains(&mean), "mean {mean}");
    }

    #[test]
    fn test_density_increases_event_count() {
        let easy = mean_len(60.0, 0.8, 100);
        let normal = mean_len(60.0, 1.0, 100);
        let hard = mean_len(60.0, 1.4, 100);
        assert!(easy <= normal, "{easy} > {normal}");
        assert!(normal <= hard, "{normal} > {hard}");
    }

    #[test]
    fn test_short_track_is_empty() {
        let mut rng = Pcg32::seed_from_u64(1);
        assert!(generate(&mut rng, &shape(), 2.0, 1.0).is_empty());
    }

    #[test]
    fn test_same_seed_same_pattern() {
        let a = generate(&mut Pcg32::seed_from_u64(7), &shape(), 45.0, 1.4);
        let b = generate(&mut Pcg32::seed_from_u64(7), &shape(), 45.0, 1.4);
        assert_eq!(a, b);
    }

    #[test]
    fn test_non_positive_density_falls_back() {
        let mut rng = Pcg32::seed_from_u64(3);
        let pattern = generate(&mut rng, &shape(), 20.0, 0.0);
        assert!(!pattern.is_empty());
    }

    #[test]
    fn test_oversize_duration_is_clamped() {
        let s = PatternShape {
            base_gap: 2.0,
            gap_spread: 0.0,
            ..shape()
        };
        let mut rng = Pcg32::seed_from_u64(9);
        let pattern = generate(&mut rng, &s, 1e12, 1.0);
        let last = pattern.last().map(|e| e.time_offset).unwrap_or(0.0);
        assert!(last < MAX_TRACK_DURATION - s.tail);
        // ~43k events at a fixed 2s gap
        assert!((43_000..=43_200).contains(&pattern.len()), "{} events", pattern.len());
    }

    proptest! {
        #[test]
        fn prop_offsets_ordered_and_in_range(
            seed in any::<u64>(),
            duration in 0.0f32..240.0,
            density in 0.1f32..4.0,
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let s = shape();
            let pattern = generate(&mut rng, &s, duration, density);

            if let Some(first) = pattern.first() {
                prop_assert!(first.time_offset >= s.lead_in);
            }
            for pair in pattern.windows(2) {
                prop_assert!(pair[0].time_offset <= pair[1].time_offset);
            }
            for event in &pattern {
                prop_assert!(event.lane < s.lane_count);
                prop_assert!(event.time_offset < duration - s.tail);
            }
        }
    }
}
