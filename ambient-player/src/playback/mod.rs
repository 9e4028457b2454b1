//! Continuous playback: slots, gain automation, transitions and the engine

pub mod engine;
pub mod gain;
pub mod service;
pub mod slot;
pub mod transition;

pub use engine::{EngineSettings, PlaybackEngine};
pub use gain::{GainAutomation, GainParam};
pub use service::{EngineCommand, EngineHandle, EngineService};
pub use slot::{PlayRejection, PlaybackSlot, SlotEvent, SlotId};
pub use transition::{Crossfade, TransitionController, TransitionState};
