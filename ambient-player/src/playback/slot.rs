//! Playback slot contract
//!
//! A slot is one audio output unit: it loads a track locator, plays, pauses
//! and reports progress. Two slots (A and B) alternate the active role so one
//! can fade out while the other fades in.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Slot identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotId {
    A,
    B,
}

impl SlotId {
    /// Get the other slot
    pub fn other(self) -> Self {
        match self {
            SlotId::A => SlotId::B,
            SlotId::B => SlotId::A,
        }
    }

    /// Array index (A = 0, B = 1)
    pub fn index(self) -> usize {
        match self {
            SlotId::A => 0,
            SlotId::B => 1,
        }
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotId::A => write!(f, "A"),
            SlotId::B => write!(f, "B"),
        }
    }
}

/// Reasons a slot refuses to start
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayRejection {
    /// Host autoplay policy requires a user gesture
    #[error("user gesture required to start audio")]
    GestureRequired,

    /// Locator is empty, unresolvable or unreachable
    #[error("invalid locator: {0}")]
    InvalidLocator(String),

    /// Audio could not be decoded
    #[error("media error: {0}")]
    Media(String),
}

/// Signals pushed by slots to the engine
///
/// Every event carries the load generation it was produced under. The engine
/// drops events whose generation no longer matches the slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotEvent {
    /// Periodic position report while playing
    Progress {
        slot: SlotId,
        generation: u64,
        elapsed: Duration,
        /// Zero when not yet known
        duration: Duration,
    },
    /// Loaded track played out to the end
    Ended { slot: SlotId, generation: u64 },
}

impl SlotEvent {
    pub fn slot(&self) -> SlotId {
        match self {
            SlotEvent::Progress { slot, .. } | SlotEvent::Ended { slot, .. } => *slot,
        }
    }

    pub fn generation(&self) -> u64 {
        match self {
            SlotEvent::Progress { generation, .. } | SlotEvent::Ended { generation, .. } => {
                *generation
            }
        }
    }
}

/// A single playback output unit
///
/// Implementations deliver [`SlotEvent`]s on the channel they were built
/// with. `generation()` must change on every `load` of a new locator and on
/// every `seek_to_start`, so events from an earlier playthrough can be told
/// apart.
#[async_trait]
pub trait PlaybackSlot: Send {
    fn id(&self) -> SlotId;

    /// Load a locator
    ///
    /// Idempotent when the locator is unchanged and the slot is not playing.
    fn load(&mut self, locator: &str);

    /// Start or resume playback of the loaded locator
    async fn play(&mut self) -> std::result::Result<(), PlayRejection>;

    fn pause(&mut self);

    fn seek_to_start(&mut self);

    /// Set effective output gain (0.0-1.0)
    fn set_gain(&mut self, gain: f32);

    /// Locator currently loaded, if any
    fn locator(&self) -> Option<&str>;

    fn generation(&self) -> u64;
}
