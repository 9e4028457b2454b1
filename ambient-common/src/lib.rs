//! # Ambient Common Library
//!
//! Shared code for the ambient player service and its tooling:
//! - Catalog database models, schema initialization and settings access
//! - Event types (PlayerEvent enum) and the EventBus
//! - Presentation snapshot types
//! - Configuration file discovery

pub mod config;
pub mod db;
pub mod error;
pub mod events;

pub use error::{Error, Result};
pub use events::{EventBus, PlayerEvent, PlayerSnapshot, PlayerStatus};
