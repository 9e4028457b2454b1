//! Track catalog
//!
//! Read-only source of tracks for a playlist, the circular queue built from
//! them, and locator resolution against the configured audio base.

pub mod locator;
pub mod memory;
pub mod queue;
pub mod sqlite;

pub use locator::{resolve_locator, AudioBase, AudioSource};
pub use memory::MemoryCatalog;
pub use queue::TrackQueue;
pub use sqlite::SqliteCatalog;

use crate::error::Result;
use ambient_common::db::TrackRow;
use async_trait::async_trait;
use serde::Serialize;

/// Catalog track
///
/// Immutable once part of a queue; reloading a playlist replaces the queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    /// URL or path relative to the audio base
    pub locator: String,
    pub kind: String,
    pub active: bool,
    pub playlist: String,
    /// Explicit ordering key; tracks without one sort last
    pub sort_key: Option<i64>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<TrackRow> for Track {
    fn from(row: TrackRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            locator: row.url,
            kind: row.kind,
            active: row.active,
            playlist: row.playlist,
            sort_key: row.sort_order,
            created_at: row.created_at,
        }
    }
}

/// Playlist listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistSummary {
    pub name: String,
    /// Active tracks in the playlist
    pub track_count: usize,
}

/// Source of playlist tracks
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Active tracks for `playlist`
    ///
    /// Ordering is re-applied by [`TrackQueue`], so providers may return
    /// tracks in any order. Failures map to `Error::CatalogFetchFailed`.
    async fn active_tracks(&self, playlist: &str) -> Result<Vec<Track>>;

    /// Available playlists, sorted by name
    async fn playlists(&self) -> Result<Vec<PlaylistSummary>>;
}
