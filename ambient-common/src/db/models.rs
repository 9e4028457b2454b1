//! Database models

use serde::{Deserialize, Serialize};

/// Row of the `tracks` table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrackRow {
    pub id: String,
    pub name: String,
    /// Absolute URL or path relative to the configured audio base
    pub url: String,
    /// Content category ("music", "spot", ...)
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub active: bool,
    pub playlist: String,
    pub sort_order: Option<i64>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Row of the `playlist_schedule` table
///
/// Hours are local wall-clock hours (0-23). `end_hour` is exclusive.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScheduleRow {
    pub id: i64,
    pub playlist: String,
    pub start_hour: i64,
    pub end_hour: i64,
    pub active: bool,
}

/// Key-value row of the `settings` table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Setting {
    pub key: String,
    pub value: Option<String>,
}
