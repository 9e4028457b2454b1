//! Player state type definitions
//!
//! Supporting types for playback state and the presentation snapshot.

use serde::{Deserialize, Serialize};

/// Playback state enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Audio playing
    Playing,
    /// Audio paused (user intent or rejected autoplay)
    Paused,
}

impl PlaybackState {
    pub fn from_playing(is_playing: bool) -> Self {
        if is_playing {
            PlaybackState::Playing
        } else {
            PlaybackState::Paused
        }
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
        }
    }
}

/// Engine status as seen by the presentation layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    /// Catalog fetch in progress; playback intents are refused
    #[default]
    Loading,
    /// Last playlist load failed (empty queue or catalog error)
    Error,
    /// Queue loaded, intents accepted
    Ready,
}

impl std::fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerStatus::Loading => write!(f, "loading"),
            PlayerStatus::Error => write!(f, "error"),
            PlayerStatus::Ready => write!(f, "ready"),
        }
    }
}

/// How a track became the active one
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransitionVia {
    /// Gain-automated overlap with the previous track
    Crossfade,
    /// Immediate switch (playlist load, navigation, aborted crossfade)
    HardSwitch,
}

/// Read-only view of engine state for rendering
///
/// Published after every state change. `index` and `total` are zero when no
/// queue is loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerSnapshot {
    pub status: PlayerStatus,
    pub playlist: Option<String>,
    pub track_id: Option<String>,
    pub current_track_name: Option<String>,
    pub index: usize,
    pub total: usize,
    pub is_playing: bool,
    /// User volume (0.0-1.0)
    pub volume: f32,
    pub error_message: Option<String>,
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            status: PlayerStatus::Loading,
            playlist: None,
            track_id: None,
            current_track_name: None,
            index: 0,
            total: 0,
            is_playing: false,
            volume: 1.0,
            error_message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&PlayerStatus::Ready).unwrap(), "\"ready\"");
        assert_eq!(serde_json::to_string(&PlayerStatus::Loading).unwrap(), "\"loading\"");
        assert_eq!(PlayerStatus::Error.to_string(), "error");
    }

    #[test]
    fn test_transition_via_snake_case() {
        assert_eq!(
            serde_json::to_string(&TransitionVia::HardSwitch).unwrap(),
            "\"hard_switch\""
        );
    }

    #[test]
    fn test_default_snapshot_is_loading() {
        let snapshot = PlayerSnapshot::default();
        assert_eq!(snapshot.status, PlayerStatus::Loading);
        assert_eq!(snapshot.total, 0);
        assert!(snapshot.error_message.is_none());
    }
}
