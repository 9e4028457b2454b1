//! Failures from the shared storage and configuration layers
//!
//! Covers opening and migrating the SQLite file, reading typed values out of
//! the `settings` table, and locating or parsing the TOML config file.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Connecting, creating the schema, or a settings query
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Creating the database directory
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file unreadable or not valid TOML for the target type
    #[error("Config file {}: {reason}", path.display())]
    ConfigFile { path: PathBuf, reason: String },

    /// Stored setting that does not parse as the requested type
    #[error("Setting '{key}' has unusable value '{value}'")]
    InvalidSetting { key: String, value: String },
}
