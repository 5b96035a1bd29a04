//! Score and combo tracking

use serde::{Deserialize, Serialize};

/// Score, combo and best combo for one run.
///
/// Only hits and misses move these values; callers read them through the
/// accessors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTracker {
    score: u64,
    combo: u32,
    max_combo: u32,
}

impl ScoreTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn max_combo(&self) -> u32 {
        self.max_combo
    }

    /// Credit a hit worth `delta` points
    pub fn record_hit(&mut self, delta: u32) {
        self.score = self.score.saturating_add(delta as u64);
        self.combo = self.combo.saturating_add(1);
        self.max_combo = self.max_combo.max(self.combo);
    }

    /// A note expired unstruck
    pub fn record_miss(&mut self) {
        self.combo = 0;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
