//! Circular track queue
//!
//! Snapshot of a playlist's active tracks in play order. Index arithmetic is
//! always modulo the queue length, so navigation never reaches an end.

use crate::catalog::Track;
use crate::error::{Error, Result};
use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub struct TrackQueue {
    tracks: Vec<Track>,
}

impl TrackQueue {
    /// Build a queue from catalog tracks
    ///
    /// Inactive tracks are dropped and the rest ordered by sort key, then
    /// creation time, then name (missing keys last). Fails with
    /// `EmptyQueue` when nothing is left.
    pub fn new(playlist: impl Into<String>, tracks: Vec<Track>) -> Result<Self> {
        let playlist = playlist.into();
        let mut tracks: Vec<Track> = tracks.into_iter().filter(|t| t.active).collect();

        if tracks.is_empty() {
            return Err(Error::EmptyQueue { playlist });
        }

        tracks.sort_by(play_order);
        Ok(Self { tracks })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Always false; an empty queue cannot be constructed
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Track at `index` (wrapped)
    pub fn get(&self, index: usize) -> &Track {
        &self.tracks[index % self.tracks.len()]
    }

    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.tracks.len()
    }

    pub fn prev_index(&self, index: usize) -> usize {
        let len = self.tracks.len();
        (index % len + len - 1) % len
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }
}

fn play_order(a: &Track, b: &Track) -> Ordering {
    none_last(&a.sort_key, &b.sort_key)
        .then_with(|| none_last(&a.created_at, &b.created_at))
        .then_with(|| a.name.cmp(&b.name))
}

fn none_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
