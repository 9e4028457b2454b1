//! In-memory catalog
//!
//! Holds tracks in a vector. Used by tests and for running without a
//! database; can be switched into a failing mode to exercise error paths.

use crate::catalog::{CatalogProvider, PlaylistSummary, Track};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryCatalog {
    tracks: Mutex<Vec<Track>>,
    failing: AtomicBool,
}

impl MemoryCatalog {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks: Mutex::new(tracks),
            failing: AtomicBool::new(false),
        }
    }

    /// Replace all tracks
    pub fn set_tracks(&self, tracks: Vec<Track>) {
        if let Ok(mut guard) = self.tracks.lock() {
            *guard = tracks;
        }
    }

    /// Make every query fail with `CatalogFetchFailed`
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn snapshot(&self) -> Result<Vec<Track>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::CatalogFetchFailed("catalog unavailable".to_string()));
        }
        self.tracks
            .lock()
            .map(|t| t.clone())
            .map_err(|_| Error::Internal("catalog lock poisoned".to_string()))
    }
}

#[async_trait]
impl CatalogProvider for MemoryCatalog {
    async fn active_tracks(&self, playlist: &str) -> Result<Vec<Track>> {
        Ok(self
            .snapshot()?
            .into_iter()
            .filter(|t| t.active && t.playlist == playlist)
            .collect())
    }

    async fn playlists(&self) -> Result<Vec<PlaylistSummary>> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for track in self.snapshot()? {
            let count = counts.entry(track.playlist.clone()).or_default();
            if track.active {
                *count += 1;
            }
        }
        Ok(counts
            .into_iter()
            .map(|(name, track_count)| PlaylistSummary { name, track_count })
            .collect())
    }
}
