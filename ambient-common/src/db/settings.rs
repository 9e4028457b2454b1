//! Settings database access
//!
//! Read/write settings from the settings table (key-value store).

use crate::{Error, Result};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Key holding the persisted "current playlist" fallback
pub const CURRENT_PLAYLIST: &str = "current_playlist";

/// Get the persisted current playlist, if one is set
///
/// NULL and empty values both mean "not set".
pub async fn get_current_playlist(db: &SqlitePool) -> Result<Option<String>> {
    let value = get_setting::<String>(db, CURRENT_PLAYLIST).await?;
    Ok(value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
}

pub async fn set_current_playlist(db: &SqlitePool, playlist: &str) -> Result<()> {
    set_setting(db, CURRENT_PLAYLIST, playlist).await
}

/// Generic setting getter
///
/// Returns `None` when the key is missing or its value is NULL.
pub async fn get_setting<T: FromStr>(db: &SqlitePool, key: &str) -> Result<Option<T>> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(db)
            .await?;

    match value.flatten() {
        Some(s) => match s.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::InvalidSetting {
                key: key.to_string(),
                value: s,
            }),
        },
        None => Ok(None),
    }
}

/// Generic setting setter
///
/// Inserts or updates setting in database.
pub async fn set_setting<T: ToString>(db: &SqlitePool, key: &str, value: T) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await?;

    Ok(())
}
