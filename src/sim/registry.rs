//! Live note registry
//!
//! Owns every live note and the spawn-depth occupancy census. Both are only
//! ever changed together, so the census always matches the live set.

use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Note identity; `epoch` ties the note to the session run that spawned it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoteId {
    pub epoch: u32,
    pub serial: u32,
}

/// Spawn depth rounded to the key resolution, in resolution units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DepthKey(pub i32);

impl DepthKey {
    pub fn from_depth(depth: f32, resolution: f32) -> Self {
        DepthKey((depth / resolution).round() as i32)
    }

    pub fn to_depth(self, resolution: f32) -> f32 {
        self.0 as f32 * resolution
    }
}

/// A live note
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub lane: usize,
    /// World position; `z` is the current depth
    pub position: Vec3,
    pub spawn_depth: f32,
    pub depth_key: DepthKey,
    pub struck: bool,
}

impl Note {
    #[inline]
    pub fn depth(&self) -> f32 {
        self.position.z
    }
}

/// Where to place a new note
#[derive(Debug, Clone, Copy)]
pub struct SpawnPlacement {
    pub lane: usize,
    pub lateral: f32,
    pub height: f32,
    pub depth: f32,
    pub depth_key: DepthKey,
}

/// Count of live notes per spawn-depth key. Keys with no notes are absent.
#[derive(Debug, Clone, Default)]
pub struct DepthOccupancy {
    counts: BTreeMap<DepthKey, u32>,
}

impl DepthOccupancy {
    pub fn count(&self, key: DepthKey) -> u32 {
        self.counts.get(&key).copied().unwrap_or(0)
    }

    /// True if any occupied key lies strictly closer than `min_separation` keys
    pub fn has_neighbor_within(&self, key: DepthKey, min_separation: i32) -> bool {
        if min_separation <= 0 {
            return false;
        }
        let lo = DepthKey(key.0.saturating_sub(min_separation - 1));
        let hi = DepthKey(key.0.saturating_add(min_separation - 1));
        self.counts.range(lo..=hi).next().is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = DepthKey> + '_ {
        self.counts.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DepthKey, u32)> + '_ {
        self.counts.iter().map(|(k, c)| (*k, *c))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    fn acquire(&mut self, key: DepthKey) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    fn release(&mut self, key: DepthKey) {
        if let Some(count) = self.counts.get_mut(&key) {
            if *count <= 1 {
                self.counts.remove(&key);
            } else {
                *count -= 1;
            }
        }
    }

    fn clear(&mut self) {
        self.counts.clear();
    }
}

/// Owner of the live-note set
#[derive(Debug, Clone, Default)]
pub struct NoteRegistry {
    /// Live notes, in spawn order
    notes: Vec<Note>,
    occupancy: DepthOccupancy,
    epoch: u32,
    next_serial: u32,
}

impl NoteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    /// Drop every live note and start accepting notes for `epoch` only
    pub fn begin_epoch(&mut self, epoch: u32) -> Vec<Note> {
        let cleared = self.clear();
        self.epoch = epoch;
        self.next_serial = 0;
        cleared
    }

    /// Create a note and register its depth key
    pub fn spawn(&mut self, placement: SpawnPlacement) -> Note {
        let id = NoteId {
            epoch: self.epoch,
            serial: self.next_serial,
        };
        self.next_serial = self.next_serial.wrapping_add(1);

        let note = Note {
            id,
            lane: placement.lane,
            position: Vec3::new(placement.lateral, placement.height, placement.depth),
            spawn_depth: placement.depth,
            depth_key: placement.depth_key,
            struck: false,
        };
        self.notes.push(note);
        self.occupancy.acquire(note.depth_key);
        note
    }

    /// Move every note toward the player and expire the ones past `despawn_depth`.
    ///
    /// Returns the expired notes (misses), already removed.
    pub fn advance(&mut self, dt: f32, speed: f32, despawn_depth: f32) -> Vec<Note> {
        let step = (speed * dt).max(0.0);
        let mut missed = Vec::new();
        let occupancy = &mut self.occupancy;

        self.notes.retain_mut(|note| {
            note.position.z += step;
            if note.position.z > despawn_depth {
                occupancy.release(note.depth_key);
                missed.push(*note);
                false
            } else {
                true
            }
        });

        missed
    }

    /// Remove a note by id.
    ///
    /// Returns `None` if the note is already gone or belongs to an older epoch,
    /// so repeated or stale removals never touch the census twice.
    pub fn remove(&mut self, id: NoteId) -> Option<Note> {
        if id.epoch != self.epoch {
            log::debug!("Ignoring removal of stale note {:?} (epoch {})", id, self.epoch);
            return None;
        }
        let index = self.notes.iter().position(|n| n.id == id)?;
        let note = self.notes.remove(index);
        self.occupancy.release(note.depth_key);
        Some(note)
    }

    /// Mark a note struck and remove it. `None` if it was already struck or removed.
    pub fn strike(&mut self, id: NoteId) -> Option<Note> {
        let note = self.notes.iter_mut().find(|n| n.id == id && !n.struck)?;
        note.struck = true;
        self.remove(id)
    }

    /// Remove all live notes; leaves the occupancy census empty
    pub fn clear(&mut self) -> Vec<Note> {
        self.occupancy.clear();
        std::mem::take(&mut self.notes)
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn occupancy(&self) -> &DepthOccupancy {
        &self.occupancy
    }

    /// True if the occupancy census equals the live notes grouped by key
    pub fn census_matches(&self) -> bool {
        let mut expected: BTreeMap<DepthKey, u32> = BTreeMap::new();
        for note in &self.notes {
            *expected.entry(note.depth_key).or_insert(0) += 1;
        }
        expected == self.occupancy.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RES: f32 = 0.1;

    fn placement(lane: usize, depth: f32) -> SpawnPlacement {
        SpawnPlacement {
            lane,
            lateral: 0.0,
            height: 1.2,
            depth,
            depth_key: DepthKey::from_depth(depth, RES),
        }
    }

    #[test]
    fn test_depth_key_rounding() {
        assert_eq!(DepthKey::from_depth(-45.0, RES), DepthKey(-450));
        assert_eq!(DepthKey::from_depth(-44.96, RES), DepthKey(-450));
        assert_eq!(DepthKey::from_depth(-44.94, RES), DepthKey(-449));
        assert!((DepthKey(-450).to_depth(RES) + 45.0).abs() < 1e-4);
    }

    #[test]
    fn test_spawn_and_remove_update_census() {
        let mut reg = NoteRegistry::new();
        let a = reg.spawn(placement(0, -45.0));
        let b = reg.spawn(placement(1, -45.0));
        let c = reg.spawn(placement(2, -43.0));
        assert_eq!(reg.occupancy().count(DepthKey(-450)), 2);
        assert_eq!(reg.occupancy().count(DepthKey(-430)), 1);
        assert!(reg.census_matches());

        assert!(reg.remove(a.id).is_some());
        assert_eq!(reg.occupancy().count(DepthKey(-450)), 1);
        assert!(reg.remove(b.id).is_some());
        // Key deleted once empty
        assert_eq!(reg.occupancy().len(), 1);
        assert!(reg.remove(c.id).is_some());
        assert!(reg.occupancy().is_empty());
        assert!(reg.census_matches());
    }

    #[test]
    fn test_double_remove_is_idempotent() {
        let mut reg = NoteRegistry::new();
        let a = reg.spawn(placement(0, -45.0));
        reg.spawn(placement(1, -45.0));

        assert!(reg.remove(a.id).is_some());
        assert!(reg.remove(a.id).is_none());
        assert_eq!(reg.occupancy().count(DepthKey(-450)), 1);
        assert!(reg.census_matches());
    }

    #[test]
    fn test_strike_only_once() {
        let mut reg = NoteRegistry::new();
        let a = reg.spawn(placement(0, -10.0));
        let struck = reg.strike(a.id).unwrap();
        assert!(struck.struck);
        assert!(reg.strike(a.id).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn test_advance_moves_and_expires() {
        let mut reg = NoteRegistry::new();
        let near = reg.spawn(placement(0, 5.5));
        let far = reg.spawn(placement(1, -45.0));

        let missed = reg.advance(0.05, 14.0, 6.0);
        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].id, near.id);
        assert_eq!(reg.len(), 1);
        let moved = reg.get(far.id).unwrap();
        assert!((moved.depth() - (-45.0 + 0.7)).abs() < 1e-4);
        assert_eq!(moved.spawn_depth, -45.0);
        assert!(reg.census_matches());
    }

    #[test]
    fn test_advance_negative_dt_never_moves_backwards() {
        let mut reg = NoteRegistry::new();
        let a = reg.spawn(placement(0, -20.0));
        reg.advance(-1.0, 14.0, 6.0);
        assert_eq!(reg.get(a.id).unwrap().depth(), -20.0);
    }

    #[test]
    fn test_clear_empties_census() {
        let mut reg = NoteRegistry::new();
        for lane in 0..4 {
            reg.spawn(placement(lane, -45.0 + lane as f32 * 2.0));
        }
        let cleared = reg.clear();
        assert_eq!(cleared.len(), 4);
        assert!(reg.is_empty());
        assert!(reg.occupancy().is_empty());
    }

    #[test]
    fn test_stale_epoch_removal_ignored() {
        let mut reg = NoteRegistry::new();
        let old = reg.spawn(placement(0, -45.0));
        reg.begin_epoch(1);
        let fresh = reg.spawn(placement(0, -45.0));
        assert_eq!(fresh.id.epoch, 1);
        // Same serial, older epoch
        assert_eq!(old.id.serial, fresh.id.serial);
        assert!(reg.remove(old.id).is_none());
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.occupancy().count(DepthKey(-450)), 1);
    }

    #[test]
    fn test_neighbor_query_is_strict() {
        let mut reg = NoteRegistry::new();
        reg.spawn(placement(0, -45.0));
        let occ = reg.occupancy();
        assert!(occ.has_neighbor_within(DepthKey(-450), 16));
        assert!(occ.has_neighbor_within(DepthKey(-435), 16));
        assert!(!occ.has_neighbor_within(DepthKey(-434), 16));
        assert!(!occ.has_neighbor_within(DepthKey(-466), 16));
        assert!(occ.has_neighbor_within(DepthKey(-465), 16));
    }
}
