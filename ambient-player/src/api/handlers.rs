//! HTTP request handlers
//!
//! Every player intent goes through the [`EngineHandle`]; successful
//! commands answer with the snapshot published after the command ran.
//!
//! [`EngineHandle`]: crate::playback::EngineHandle

use crate::api::server::AppContext;
use crate::audio::AudioOutput;
use crate::catalog::PlaylistSummary;
use crate::error::Error;
use ambient_common::PlayerSnapshot;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
    git_hash: String,
    build_timestamp: String,
    build_profile: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    /// 0.0-1.0; out-of-range values are clamped
    volume: f32,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlaylistRequest {
    /// Playlist to load; the schedule resolver decides when absent
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlaylistsResponse {
    playlists: Vec<PlaylistSummary>,
}

#[derive(Debug, Serialize)]
pub struct DeviceListResponse {
    devices: Vec<String>,
}

type ApiError = (StatusCode, Json<StatusResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

/// Map an engine error to a status code and `{status, message}` body
pub fn api_error(err: Error) -> ApiError {
    let code = match &err {
        Error::NotReady(_) | Error::PlaybackRejected(_) => StatusCode::CONFLICT,
        Error::EmptyQueue { .. } => StatusCode::NOT_FOUND,
        Error::CatalogFetchFailed(_) => StatusCode::BAD_GATEWAY,
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if code.is_server_error() {
        warn!("Request failed: {}", err);
    }

    (
        code,
        Json(StatusResponse {
            status: "error".to_string(),
            message: err.to_string(),
        }),
    )
}

fn snapshot_response(ctx: &AppContext) -> ApiResult<PlayerSnapshot> {
    Ok(Json(ctx.engine.snapshot()))
}

// ============================================================================
// Health
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "ambient-player".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
        build_profile: env!("BUILD_PROFILE").to_string(),
    })
}

// ============================================================================
// Player
// ============================================================================

/// GET /player/state
pub async fn get_state(State(ctx): State<AppContext>) -> Json<PlayerSnapshot> {
    Json(ctx.engine.snapshot())
}

/// POST /player/play-pause
pub async fn play_pause(State(ctx): State<AppContext>) -> ApiResult<PlayerSnapshot> {
    ctx.engine.play_pause().await.map_err(api_error)?;
    snapshot_response(&ctx)
}

/// POST /player/next
pub async fn next(State(ctx): State<AppContext>) -> ApiResult<PlayerSnapshot> {
    ctx.engine.next().await.map_err(api_error)?;
    snapshot_response(&ctx)
}

/// POST /player/previous
pub async fn previous(State(ctx): State<AppContext>) -> ApiResult<PlayerSnapshot> {
    ctx.engine.previous().await.map_err(api_error)?;
    snapshot_response(&ctx)
}

/// POST /player/volume
pub async fn set_volume(
    State(ctx): State<AppContext>,
    Json(req): Json<VolumeRequest>,
) -> ApiResult<PlayerSnapshot> {
    ctx.engine.set_volume(req.volume).await.map_err(api_error)?;
    snapshot_response(&ctx)
}

/// POST /player/playlist
pub async fn load_playlist(
    State(ctx): State<AppContext>,
    Json(req): Json<PlaylistRequest>,
) -> ApiResult<PlayerSnapshot> {
    info!(
        "Load playlist requested: {}",
        req.name.as_deref().unwrap_or("(scheduled)")
    );
    ctx.engine.load_playlist(req.name).await.map_err(api_error)?;
    snapshot_response(&ctx)
}

// ============================================================================
// Catalog
// ============================================================================

/// GET /playlists
pub async fn list_playlists(State(ctx): State<AppContext>) -> ApiResult<PlaylistsResponse> {
    let playlists = ctx.catalog.playlists().await.map_err(api_error)?;
    Ok(Json(PlaylistsResponse { playlists }))
}

// ============================================================================
// Audio
// ============================================================================

/// GET /audio/devices
///
/// Names usable as `playback.audio_device` in the config file.
pub async fn list_audio_devices() -> ApiResult<DeviceListResponse> {
    let devices = AudioOutput::list_devices().map_err(api_error)?;
    info!("Found {} audio devices", devices.len());
    Ok(Json(DeviceListResponse { devices }))
}
