//! Ambient Player - Main entry point
//!
//! Continuous background-music player: two playback slots crossfading
//! through a circular playlist, controlled over HTTP with an SSE event
//! stream.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use ambient_common::EventBus;
use ambient_player::api::{self, AppContext};
use ambient_player::audio::{AudioHost, TrackLoader};
use ambient_player::catalog::{AudioBase, CatalogProvider, SqliteCatalog};
use ambient_player::config::{CliOverrides, Config, LoggingConfig};
use ambient_player::playback::{EngineService, PlaybackEngine};
use ambient_player::schedule::{PlaylistResolver, ScheduleResolver};
use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const EVENT_BUS_CAPACITY: usize = 256;

/// Command-line arguments for ambient-player
#[derive(Parser, Debug)]
#[command(name = "ambient-player")]
#[command(about = "Continuous crossfading background music player")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "AMBIENT_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "AMBIENT_PORT")]
    port: Option<u16>,

    /// SQLite database path
    #[arg(short, long, env = "AMBIENT_DATABASE")]
    database: Option<PathBuf>,

    /// Directory or base URL for relative track locators
    #[arg(long, env = "AMBIENT_AUDIO_BASE")]
    audio_base: Option<String>,

    /// Load this playlist at startup instead of the scheduled one
    #[arg(long, env = "AMBIENT_PLAYLIST")]
    playlist: Option<String>,
}

impl Args {
    fn overrides(self) -> CliOverrides {
        CliOverrides {
            config: self.config,
            port: self.port,
            database: self.database,
            audio_base: self.audio_base,
            playlist: self.playlist,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(args.overrides()).context("Failed to load configuration")?;
    init_logging(&config.logging)?;

    info!(
        "Starting Ambient Player v{} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );
    info!("Database: {}", config.database_path.display());
    info!("Audio base: {}", config.audio_base);

    let pool = ambient_common::db::init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let catalog: Arc<dyn CatalogProvider> = Arc::new(SqliteCatalog::new(
        pool.clone(),
        config.default_playlist.clone(),
    ));
    let resolver: Arc<dyn PlaylistResolver> = Arc::new(ScheduleResolver::new(
        pool.clone(),
        config.utc_offset_hours,
        config.default_playlist.clone(),
    ));

    let device = config.playback.audio_device.clone();
    let host = tokio::task::spawn_blocking(move || AudioHost::start(device))
        .await
        .context("Audio host startup task failed")?
        .context("Failed to open audio output")?;

    let loader = Arc::new(TrackLoader::new(
        AudioBase::parse(&config.audio_base),
        host.sample_rate(),
    )?);

    let (slot_tx, slot_rx) = mpsc::unbounded_channel();
    let (slot_a, slot_b) = host.slots(loader, slot_tx, config.progress_interval());

    let engine = PlaybackEngine::new(
        Box::new(slot_a),
        Box::new(slot_b),
        Arc::clone(&catalog),
        resolver,
        EventBus::new(EVENT_BUS_CAPACITY),
        config.engine_settings(),
    );
    let (handle, engine_task) = EngineService::spawn(engine, slot_rx, config.render_interval());

    if let Err(e) = handle.load_playlist(config.startup_playlist.clone()).await {
        // The snapshot already carries the error; the API stays up for retries
        warn!("Initial playlist load failed: {}", e);
    }

    let ctx = AppContext {
        engine: handle.clone(),
        catalog,
    };
    api::run(&config.bind_address, config.port, ctx, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    handle.shutdown().await;
    if let Err(e) = engine_task.await {
        warn!("Engine task ended abnormally: {}", e);
    }
    drop(host);
    pool.close().await;

    info!("Shutdown complete");
    Ok(())
}

/// Install the tracing subscriber
///
/// `RUST_LOG` wins over the configured level when set.
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "ambient_player={level},ambient_common={level},tower_http={level}",
            level = logging.level
        )
        .into()
    });

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
