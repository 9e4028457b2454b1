//! Event types for the ambient player event system
//!
//! Provides the shared event definitions and the EventBus used by the
//! playback engine and the HTTP/SSE surface.

mod player_types;

pub use player_types::{PlaybackState, PlayerSnapshot, PlayerStatus, TransitionVia};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Player event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
/// The SSE event name is the variant name (see [`PlayerEvent::event_type`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// Presentation snapshot changed
    ///
    /// Triggers:
    /// - SSE: Re-render track name, play/pause control, volume, status
    SnapshotChanged {
        snapshot: PlayerSnapshot,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playlist queue fetched and installed
    PlaylistLoaded {
        playlist: String,
        /// Number of active tracks in the queue
        track_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playlist load failed (catalog error or no active tracks)
    PlaylistLoadFailed {
        /// Playlist requested or resolved (None if resolution itself failed)
        playlist: Option<String>,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A track became the active one
    TrackStarted {
        track_id: String,
        name: String,
        /// Position in the queue (0-based)
        index: usize,
        total: usize,
        via: TransitionVia,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Crossfade began: standby slot started, gain ramps scheduled
    CrossfadeStarted {
        from_index: usize,
        to_index: usize,
        duration_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Standby slot refused to start during an armed crossfade
    ///
    /// Recovered internally by a hard switch to `to_index`.
    CrossfadeAborted {
        to_index: usize,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback state changed (Playing ↔ Paused)
    PlaybackStateChanged {
        old_state: PlaybackState,
        new_state: PlaybackState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Host refused to start audio; waiting for an explicit play intent
    PlaybackRejected {
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// User volume changed
    VolumeChanged {
        old_volume: f32,
        new_volume: f32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback progress of the active slot
    ///
    /// Emitted at the slot progress cadence. Not persisted.
    PlaybackProgress {
        track_id: String,
        position_ms: u64,
        duration_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PlayerEvent {
    /// Event name used for the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            PlayerEvent::SnapshotChanged { .. } => "SnapshotChanged",
            PlayerEvent::PlaylistLoaded { .. } => "PlaylistLoaded",
            PlayerEvent::PlaylistLoadFailed { .. } => "PlaylistLoadFailed",
            PlayerEvent::TrackStarted { .. } => "TrackStarted",
            PlayerEvent::CrossfadeStarted { .. } => "CrossfadeStarted",
            PlayerEvent::CrossfadeAborted { .. } => "CrossfadeAborted",
            PlayerEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            PlayerEvent::PlaybackRejected { .. } => "PlaybackRejected",
            PlayerEvent::VolumeChanged { .. } => "VolumeChanged",
            PlayerEvent::PlaybackProgress { .. } => "PlaybackProgress",
        }
    }
}

/// Central event distribution bus
///
/// Wraps a tokio broadcast channel. Every subscriber receives every event
/// emitted after it subscribed; slow subscribers lose the oldest events once
/// `capacity` is exceeded.
///
/// # Examples
///
/// ```
/// use ambient_common::events::{EventBus, PlayerEvent};
///
/// let bus = EventBus::new(100);
/// let mut rx = bus.subscribe();
///
/// bus.emit_lossy(PlayerEvent::PlaybackRejected {
///     reason: "gesture required".to_string(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(PlayerEvent::PlaybackRejected { .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlayerEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PlayerEvent,
    ) -> Result<usize, broadcast::error::SendError<PlayerEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PlayerEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
