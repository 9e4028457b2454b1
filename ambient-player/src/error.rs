//! Error types for ambient-player
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use crate::playback::slot::PlayRejection;
use ambient_common::PlayerStatus;
use thiserror::Error;

/// Main error type for the player
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Catalog or schedule query failed; no automatic retry
    #[error("could not load tracks: {0}")]
    CatalogFetchFailed(String),

    /// Playlist resolved but has zero active tracks
    #[error("no active tracks for playlist \"{playlist}\"")]
    EmptyQueue { playlist: String },

    /// Host refused to start audio; waits for an explicit play intent
    #[error("playback rejected: {0}")]
    PlaybackRejected(#[from] PlayRejection),

    /// Standby slot failed to start during an armed crossfade
    ///
    /// Recovered by a hard switch; logged, never returned to callers.
    #[error("crossfade to index {to_index} aborted: {reason}")]
    CrossfadeAbort { to_index: usize, reason: String },

    /// Intent refused because no queue is ready
    #[error("player not ready (status: {0})")]
    NotReady(PlayerStatus),

    /// Invalid request parameter or locator
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// HTTP server or fetch errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using the player Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<ambient_common::Error> for Error {
    fn from(err: ambient_common::Error) -> Self {
        match err {
            ambient_common::Error::Database(e) => Error::Database(e),
            ambient_common::Error::Io(e) => Error::Io(e),
            err @ ambient_common::Error::ConfigFile { .. } => Error::Config(err.to_string()),
            err @ ambient_common::Error::InvalidSetting { .. } => Error::Config(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_queue_message_names_playlist() {
        let err = Error::EmptyQueue {
            playlist: "natal".to_string(),
        };
        assert!(err.to_string().contains("\"natal\""));
    }

    #[test]
    fn test_common_config_error_maps_to_config() {
        let err: Error = ambient_common::Error::InvalidSetting {
            key: "volume".to_string(),
            value: "loud".to_string(),
        }
        .into();
        assert!(matches!(err, Error::Config(ref m) if m.contains("'volume'")));
    }

    #[test]
    fn test_rejection_converts() {
        let err: Error = PlayRejection::GestureRequired.into();
        assert!(matches!(err, Error::PlaybackRejected(PlayRejection::GestureRequired)));
    }
}
