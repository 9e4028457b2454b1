//! # Ambient Player Library
//!
//! Continuous background-music playback with equal-gain crossfades between
//! two playback slots.
//!
//! **Architecture:** a single engine task owns both slots, the gain
//! automation and the transition state machine. Tracks come from a catalog
//! (SQLite in production), the active playlist from a time-of-day schedule,
//! and audio is decoded with symphonia, resampled with rubato and mixed to
//! a cpal output stream. An axum server exposes control endpoints and an
//! SSE event stream.

pub mod api;
pub mod audio;
pub mod catalog;
pub mod config;
pub mod error;
pub mod playback;
pub mod schedule;

pub use error::{Error, Result};
pub use playback::{EngineHandle, EngineService, PlaybackEngine};
