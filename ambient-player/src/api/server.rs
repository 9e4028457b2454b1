//! HTTP server setup and routing
//!
//! Control endpoints and the SSE stream, served by axum.

use crate::api::{handlers, sse};
use crate::catalog::CatalogProvider;
use crate::error::{Error, Result};
use crate::playback::EngineHandle;
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub engine: EngineHandle,
    pub catalog: Arc<dyn CatalogProvider>,
}

/// Build the router with all routes attached
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/player/state", get(handlers::get_state))
        .route("/player/play-pause", post(handlers::play_pause))
        .route("/player/next", post(handlers::next))
        .route("/player/previous", post(handlers::previous))
        .route("/player/volume", post(handlers::set_volume))
        .route("/player/playlist", post(handlers::load_playlist))
        .route("/playlists", get(handlers::list_playlists))
        .route("/audio/devices", get(handlers::list_audio_devices))
        .route("/events", get(sse::event_stream))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve until `shutdown` resolves
pub async fn run<F>(bind_address: &str, port: u16, ctx: AppContext, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", bind_address, port);
    let app = create_router(ctx);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
