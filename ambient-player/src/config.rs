//! Configuration for the ambient player
//!
//! Bootstrap settings come from a TOML file (all keys optional, built-in
//! defaults otherwise) with command-line overrides on top:
//!
//! 1. Command-line arguments / environment (`--port`, `--database`, ...)
//! 2. TOML configuration file
//! 3. Built-in defaults
//!
//! The persisted `current_playlist` setting lives in the database and is
//! read by the schedule resolver, not here.

use crate::error::{Error, Result};
use crate::playback::EngineSettings;
use ambient_common::config::{default_database_path, load_toml, resolve_config_file};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// SQLite database file; platform data dir when unset
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Directory or base URL that relative track locators resolve against
    #[serde(default = "default_audio_base")]
    pub audio_base: String,

    /// Playlist used when neither the schedule nor the persisted setting
    /// names one
    #[serde(default = "default_playlist")]
    pub default_playlist: String,

    /// Fixed offset used to evaluate schedule hours
    #[serde(default = "default_utc_offset")]
    pub utc_offset_hours: i32,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            port: default_port(),
            bind_address: default_bind_address(),
            audio_base: default_audio_base(),
            default_playlist: default_playlist(),
            utc_offset_hours: default_utc_offset(),
            logging: LoggingConfig::default(),
            playback: PlaybackConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path; stderr when unset
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Engine timing
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_crossfade_seconds")]
    pub crossfade_seconds: f64,

    #[serde(default = "default_completion_margin_ms")]
    pub completion_margin_ms: u64,

    #[serde(default = "default_volume_ramp_ms")]
    pub volume_ramp_ms: u64,

    /// Gain automation tick while a ramp is running
    #[serde(default = "default_render_interval_ms")]
    pub render_interval_ms: u64,

    /// How often each playing slot reports elapsed time
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,

    #[serde(default = "default_initial_volume")]
    pub initial_volume: f32,

    #[serde(default = "default_autoplay")]
    pub autoplay: bool,

    /// Output device name; system default when unset
    #[serde(default)]
    pub audio_device: Option<String>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            crossfade_seconds: default_crossfade_seconds(),
            completion_margin_ms: default_completion_margin_ms(),
            volume_ramp_ms: default_volume_ramp_ms(),
            render_interval_ms: default_render_interval_ms(),
            progress_interval_ms: default_progress_interval_ms(),
            initial_volume: default_initial_volume(),
            autoplay: default_autoplay(),
            audio_device: None,
        }
    }
}

fn default_port() -> u16 {
    5780
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_audio_base() -> String {
    "audio".to_string()
}

fn default_playlist() -> String {
    "loja".to_string()
}

fn default_utc_offset() -> i32 {
    -3
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_crossfade_seconds() -> f64 {
    2.0
}

fn default_completion_margin_ms() -> u64 {
    30
}

fn default_volume_ramp_ms() -> u64 {
    80
}

fn default_render_interval_ms() -> u64 {
    10
}

fn default_progress_interval_ms() -> u64 {
    250
}

fn default_initial_volume() -> f32 {
    1.0
}

fn default_autoplay() -> bool {
    true
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub port: Option<u16>,
    pub database: Option<PathBuf>,
    pub audio_base: Option<String>,
    pub playlist: Option<String>,
}

/// Resolved application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub port: u16,
    pub bind_address: String,
    pub audio_base: String,
    pub default_playlist: String,
    /// Playlist forced from the command line; skips the resolver at startup
    pub startup_playlist: Option<String>,
    pub utc_offset_hours: i32,
    pub logging: LoggingConfig,
    pub playback: PlaybackConfig,
}

impl Config {
    /// Discover, load and validate configuration
    ///
    /// A missing config file is not an error; built-in defaults apply.
    pub fn load(cli: CliOverrides) -> Result<Self> {
        let toml_config = match resolve_config_file(cli.config.as_deref()) {
            Some(path) if path.exists() => {
                let config: TomlConfig = load_toml(&path)?;
                info!("Loaded configuration from {}", path.display());
                config
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using built-in defaults",
                    path.display()
                );
                TomlConfig::default()
            }
            None => {
                info!("No config file found, using built-in defaults");
                TomlConfig::default()
            }
        };

        Self::from_toml(toml_config, cli)
    }

    /// Apply overrides to a parsed TOML config and validate
    pub fn from_toml(toml_config: TomlConfig, cli: CliOverrides) -> Result<Self> {
        let config = Self {
            database_path: cli
                .database
                .or(toml_config.database_path)
                .unwrap_or_else(default_database_path),
            port: cli.port.unwrap_or(toml_config.port),
            bind_address: toml_config.bind_address,
            audio_base: cli.audio_base.unwrap_or(toml_config.audio_base),
            default_playlist: toml_config.default_playlist,
            startup_playlist: cli.playlist.filter(|p| !p.trim().is_empty()),
            utc_offset_hours: toml_config.utc_offset_hours,
            logging: toml_config.logging,
            playback: toml_config.playback,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let playback = &self.playback;

        if !playback.crossfade_seconds.is_finite() || playback.crossfade_seconds <= 0.0 {
            return Err(Error::Config(format!(
                "playback.crossfade_seconds must be positive, got {}",
                playback.crossfade_seconds
            )));
        }
        if Duration::from_millis(playback.completion_margin_ms) >= self.crossfade_window() {
            return Err(Error::Config(format!(
                "playback.completion_margin_ms ({}) must be shorter than the crossfade window",
                playback.completion_margin_ms
            )));
        }
        if !(0.0..=1.0).contains(&playback.initial_volume) {
            return Err(Error::Config(format!(
                "playback.initial_volume must be within [0, 1], got {}",
                playback.initial_volume
            )));
        }
        if playback.render_interval_ms == 0 || playback.progress_interval_ms == 0 {
            return Err(Error::Config(
                "playback render and progress intervals must be non-zero".to_string(),
            ));
        }
        if !(-12..=14).contains(&self.utc_offset_hours) {
            return Err(Error::Config(format!(
                "utc_offset_hours must be within -12..=14, got {}",
                self.utc_offset_hours
            )));
        }
        if self.default_playlist.trim().is_empty() {
            return Err(Error::Config("default_playlist must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn crossfade_window(&self) -> Duration {
        Duration::from_secs_f64(self.playback.crossfade_seconds)
    }

    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.playback.render_interval_ms)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.playback.progress_interval_ms)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            crossfade_window: self.crossfade_window(),
            completion_margin: Duration::from_millis(self.playback.completion_margin_ms),
            volume_ramp: Duration::from_millis(self.playback.volume_ramp_ms),
            initial_volume: self.playback.initial_volume,
            autoplay: self.playback.autoplay,
        }
    }
}
