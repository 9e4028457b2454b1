//! SQLite catalog and schedule resolver tests
//!
//! Run against a real database file created by `init_database`.

use ambient_common::db::{init_database, settings};
use ambient_player::catalog::{CatalogProvider, SqliteCatalog, TrackQueue};
use ambient_player::schedule::{PlaylistResolver, ScheduleResolver};
use ambient_player::Error;
use chrono::{TimeZone, Utc};
use sqlx::SqlitePool;
use tempfile::TempDir;

async fn setup() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().unwrap();
    let pool = init_database(&dir.path().join("ambient.db")).await.unwrap();
    (dir, pool)
}

async fn insert_track(
    pool: &SqlitePool,
    id: &str,
    playlist: &str,
    sort_order: Option<i64>,
    created_at: &str,
    active: bool,
) {
    sqlx::query(
        "INSERT INTO tracks (id, name, url, active, playlist, sort_order, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(format!("Track {}", id))
    .bind(format!("{}/{}.mp3", playlist, id))
    .bind(active)
    .bind(playlist)
    .bind(sort_order)
    .bind(created_at)
    .execute(pool)
    .await
    .unwrap();
}

async fn insert_schedule(pool: &SqlitePool, playlist: &str, start: i64, end: i64, active: bool) {
    sqlx::query(
        "INSERT INTO playlist_schedule (playlist, start_hour, end_hour, active) VALUES (?, ?, ?, ?)",
    )
    .bind(playlist)
    .bind(start)
    .bind(end)
    .bind(active)
    .execute(pool)
    .await
    .unwrap();
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn test_active_tracks_filtered_and_ordered() {
    let (_dir, pool) = setup().await;
    insert_track(&pool, "late", "loja", None, "2024-01-01 08:00:00", true).await;
    insert_track(&pool, "second", "loja", Some(2), "2024-01-01 09:00:00", true).await;
    insert_track(&pool, "first", "loja", Some(1), "2024-01-02 09:00:00", true).await;
    insert_track(&pool, "off", "loja", Some(0), "2024-01-01 09:00:00", false).await;
    insert_track(&pool, "elsewhere", "natal", Some(0), "2024-01-01 09:00:00", true).await;

    let catalog = SqliteCatalog::new(pool, "loja");
    let tracks = catalog.active_tracks("loja").await.unwrap();
    let ids: Vec<&str> = tracks.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second", "late"]);
    assert_eq!(tracks[0].locator, "loja/first.mp3");
    assert_eq!(tracks[0].kind, "music");
    assert!(tracks[0].created_at.is_some());

    let queue = TrackQueue::new("loja", tracks).unwrap();
    assert_eq!(queue.len(), 3);
}

#[tokio::test]
async fn test_unknown_playlist_is_empty_queue() {
    let (_dir, pool) = setup().await;
    let catalog = SqliteCatalog::new(pool, "loja");

    let tracks = catalog.active_tracks("missing").await.unwrap();
    assert!(tracks.is_empty());
    assert!(matches!(
        TrackQueue::new("missing", tracks),
        Err(Error::EmptyQueue { .. })
    ));
}

#[tokio::test]
async fn test_playlists_include_default() {
    let (_dir, pool) = setup().await;
    insert_track(&pool, "a", "natal", Some(1), "2024-01-01 09:00:00", true).await;
    insert_track(&pool, "b", "natal", Some(2), "2024-01-01 09:00:00", false).await;

    let catalog = SqliteCatalog::new(pool, "loja");
    let playlists = catalog.playlists().await.unwrap();

    assert_eq!(playlists.len(), 2);
    assert_eq!(playlists[0].name, "loja");
    assert_eq!(playlists[0].track_count, 0);
    assert_eq!(playlists[1].name, "natal");
    assert_eq!(playlists[1].track_count, 1);
}

#[tokio::test]
async fn test_closed_pool_is_fetch_failure() {
    let (_dir, pool) = setup().await;
    let catalog = SqliteCatalog::new(pool.clone(), "loja");
    pool.close().await;

    assert!(matches!(
        catalog.active_tracks("loja").await,
        Err(Error::CatalogFetchFailed(_))
    ));
}

// ============================================================================
// Schedule resolver
// ============================================================================

#[tokio::test]
async fn test_schedule_match_wins() {
    let (_dir, pool) = setup().await;
    insert_schedule(&pool, "manha", 6, 12, true).await;
    insert_schedule(&pool, "noite", 18, 6, true).await;
    settings::set_current_playlist(&pool, "natal").await.unwrap();

    let resolver = ScheduleResolver::new(pool, -3, "loja");

    // 12:00 UTC is 09:00 at UTC-3
    let morning = Utc.with_ymd_and_hms(2024, 12, 24, 12, 0, 0).unwrap();
    assert_eq!(resolver.resolve_at(morning).await.unwrap(), "manha");

    // 04:00 UTC is 01:00 local, inside the overnight range
    let night = Utc.with_ymd_and_hms(2024, 12, 24, 4, 0, 0).unwrap();
    assert_eq!(resolver.resolve_at(night).await.unwrap(), "noite");
}

#[tokio::test]
async fn test_persisted_playlist_when_no_schedule_matches() {
    let (_dir, pool) = setup().await;
    insert_schedule(&pool, "manha", 6, 12, true).await;
    insert_schedule(&pool, "tarde", 12, 18, false).await;
    settings::set_current_playlist(&pool, "natal").await.unwrap();

    let resolver = ScheduleResolver::new(pool, 0, "loja");
    let afternoon = Utc.with_ymd_and_hms(2024, 12, 24, 14, 0, 0).unwrap();
    assert_eq!(resolver.resolve_at(afternoon).await.unwrap(), "natal");
}

#[tokio::test]
async fn test_default_playlist_fallback() {
    let (_dir, pool) = setup().await;
    let resolver = ScheduleResolver::new(pool, 0, "loja");
    assert_eq!(resolver.resolve().await.unwrap(), "loja");
}

#[tokio::test]
async fn test_resolver_fails_when_database_unavailable() {
    let (_dir, pool) = setup().await;
    let resolver = ScheduleResolver::new(pool.clone(), 0, "loja");
    pool.close().await;

    assert!(matches!(
        resolver.resolve().await,
        Err(Error::CatalogFetchFailed(_))
    ));
}
