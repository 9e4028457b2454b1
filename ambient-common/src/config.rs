//! Configuration file discovery and loading
//!
//! Bootstrap configuration is a TOML file found in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`AMBIENT_CONFIG`)
//! 3. User config directory (`~/.config/ambient/config.toml` on Linux)
//! 4. System config (`/etc/ambient/config.toml`, Linux only)
//!
//! A missing file is not an error; callers fall back to compiled defaults.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "AMBIENT_CONFIG";

const APP_DIR: &str = "ambient";
const CONFIG_FILE: &str = "config.toml";

/// Locate the bootstrap config file
///
/// An explicit path (CLI or environment) is returned even when it does not
/// exist so the caller can report it; discovered locations are only returned
/// when present.
pub fn resolve_config_file(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join(APP_DIR).join(CONFIG_FILE));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILE);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    debug!("No config file found, using compiled defaults");
    None
}

/// Read and deserialize a TOML file
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::ConfigFile {
        path: path.to_path_buf(),
        reason: format!("read failed: {}", e),
    })?;

    toml::from_str(&content).map_err(|e| Error::ConfigFile {
        path: path.to_path_buf(),
        reason: format!("parse failed: {}", e),
    })
}

/// OS-dependent default location of the catalog database
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./ambient_data"))
        .join("ambient.db")
}
