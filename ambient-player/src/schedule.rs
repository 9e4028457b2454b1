//! Schedule/config playlist resolution
//!
//! Decides which playlist is active right now. Resolution order:
//! 1. First active `playlist_schedule` row (by id) whose hour range contains
//!    the current local hour
//! 2. Persisted `current_playlist` setting
//! 3. Configured default playlist
//!
//! Hour ranges are `[start, end)`. A range with `start > end` crosses
//! midnight; `start == end` covers the whole day.

use crate::error::{Error, Result};
use ambient_common::db::{settings, ScheduleRow};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Timelike, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

/// Produces the playlist name to load when none is given
#[async_trait]
pub trait PlaylistResolver: Send + Sync {
    async fn resolve(&self) -> Result<String>;
}

/// Always resolves to the same playlist
#[derive(Debug, Clone)]
pub struct FixedPlaylist(pub String);

#[async_trait]
impl PlaylistResolver for FixedPlaylist {
    async fn resolve(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Whether `hour` falls inside a `[start, end)` schedule range
pub fn hour_in_range(hour: u32, start: u32, end: u32) -> bool {
    if start < end {
        hour >= start && hour < end
    } else if start > end {
        hour >= start || hour < end
    } else {
        true
    }
}

/// Local wall-clock hour for a fixed UTC offset
pub fn local_hour(now: DateTime<Utc>, utc_offset_hours: i32) -> u32 {
    match FixedOffset::east_opt(utc_offset_hours * 3600) {
        Some(offset) => now.with_timezone(&offset).hour(),
        None => now.hour(),
    }
}

/// First active row matching `hour`, in id order
pub fn match_schedule(rows: &[ScheduleRow], hour: u32) -> Option<&ScheduleRow> {
    let mut active: Vec<&ScheduleRow> = rows.iter().filter(|r| r.active).collect();
    active.sort_by_key(|r| r.id);
    active.into_iter().find(|r| {
        let start = r.start_hour.clamp(0, 24) as u32;
        let end = r.end_hour.clamp(0, 24) as u32;
        hour_in_range(hour, start, end)
    })
}

/// Resolver backed by the `playlist_schedule` and `settings` tables
pub struct ScheduleResolver {
    pool: SqlitePool,
    utc_offset_hours: i32,
    default_playlist: String,
}

impl ScheduleResolver {
    pub fn new(pool: SqlitePool, utc_offset_hours: i32, default_playlist: impl Into<String>) -> Self {
        Self {
            pool,
            utc_offset_hours,
            default_playlist: default_playlist.into(),
        }
    }

    /// Resolve for an explicit instant
    pub async fn resolve_at(&self, now: DateTime<Utc>) -> Result<String> {
        let hour = local_hour(now, self.utc_offset_hours);

        let schedule_failed = match self.schedule_rows().await {
            Ok(rows) => {
                if let Some(row) = match_schedule(&rows, hour) {
                    info!(
                        "Schedule selects playlist '{}' (hour {}, range {}-{})",
                        row.playlist, hour, row.start_hour, row.end_hour
                    );
                    return Ok(row.playlist.clone());
                }
                debug!("No schedule entry for hour {}", hour);
                false
            }
            Err(e) => {
                warn!("Schedule query failed, falling back to settings: {}", e);
                true
            }
        };

        match settings::get_current_playlist(&self.pool).await {
            Ok(Some(playlist)) => {
                info!("Using persisted current playlist '{}'", playlist);
                Ok(playlist)
            }
            Ok(None) => {
                info!("Using default playlist '{}'", self.default_playlist);
                Ok(self.default_playlist.clone())
            }
            Err(e) if schedule_failed => Err(Error::CatalogFetchFailed(format!(
                "schedule and settings queries failed: {}",
                e
            ))),
            Err(e) => {
                warn!(
                    "Settings query failed, using default playlist '{}': {}",
                    self.default_playlist, e
                );
                Ok(self.default_playlist.clone())
            }
        }
    }

    async fn schedule_rows(&self) -> std::result::Result<Vec<ScheduleRow>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, playlist, start_hour, end_hour, active FROM playlist_schedule ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
    }
}

#[async_trait]
impl PlaylistResolver for ScheduleResolver {
    async fn resolve(&self) -> Result<String> {
        self.resolve_at(Utc::now()).await
    }
}
