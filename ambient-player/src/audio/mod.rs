//! Audio subsystem
//!
//! Decoding (symphonia), resampling (rubato) and device output (cpal), plus
//! the device-backed playback slots the engine drives.

pub mod decoder;
pub mod device_slot;
pub mod host;
pub mod loader;
pub mod output;
pub mod resampler;
pub mod types;
pub mod voice;

pub use decoder::{DecodedAudio, SimpleDecoder};
pub use device_slot::DeviceSlot;
pub use host::AudioHost;
pub use loader::TrackLoader;
pub use output::AudioOutput;
pub use resampler::Resampler;
pub use types::{AudioFrame, PcmBuffer};
pub use voice::{Mixer, SharedVoice, Voice};
