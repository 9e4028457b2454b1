//! SQLite catalog provider
//!
//! Reads the `tracks` table created by `ambient_common::db::init`.

use crate::catalog::{CatalogProvider, PlaylistSummary, Track};
use crate::error::{Error, Result};
use ambient_common::db::TrackRow;
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, error};

pub struct SqliteCatalog {
    pool: SqlitePool,
    /// Always listed, even with no tracks
    default_playlist: String,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool, default_playlist: impl Into<String>) -> Self {
        Self {
            pool,
            default_playlist: default_playlist.into(),
        }
    }
}

fn fetch_failed(e: sqlx::Error) -> Error {
    error!("Catalog query failed: {}", e);
    Error::CatalogFetchFailed(e.to_string())
}

#[async_trait]
impl CatalogProvider for SqliteCatalog {
    async fn active_tracks(&self, playlist: &str) -> Result<Vec<Track>> {
        let rows: Vec<TrackRow> = sqlx::query_as(
            r#"
            SELECT id, name, url, type, active, playlist, sort_order, created_at
            FROM tracks
            WHERE active = 1 AND playlist = ?
            ORDER BY sort_order IS NULL, sort_order ASC, created_at IS NULL, created_at ASC, name ASC
            "#,
        )
        .bind(playlist)
        .fetch_all(&self.pool)
        .await
        .map_err(fetch_failed)?;

        debug!("Fetched {} active tracks for playlist '{}'", rows.len(), playlist);
        Ok(rows.into_iter().map(Track::from).collect())
    }

    async fn playlists(&self) -> Result<Vec<PlaylistSummary>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT playlist, SUM(CASE WHEN active = 1 THEN 1 ELSE 0 END)
            FROM tracks
            GROUP BY playlist
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(fetch_failed)?;

        let mut playlists: Vec<PlaylistSummary> = rows
            .into_iter()
            .map(|(name, count)| PlaylistSummary {
                name,
                track_count: count.max(0) as usize,
            })
            .collect();

        if !playlists.iter().any(|p| p.name == self.default_playlist) {
            playlists.push(PlaylistSummary {
                name: self.default_playlist.clone(),
                track_count: 0,
            });
        }
        playlists.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(playlists)
    }
}
