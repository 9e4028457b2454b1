//! Core audio data types
//!
//! Decoded track buffers and the stereo frame handed to the output callback.

use std::time::Duration;

/// Decoded, resampled track audio ready for playback
///
/// **Format:**
/// - Samples are f32 (floating point -1.0 to 1.0)
/// - Stereo interleaved: [L, R, L, R, ...]
/// - Sample rate matches the output device
#[derive(Debug, Clone)]
pub struct PcmBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    /// Number of stereo frames (samples.len() / 2)
    pub frames: usize,
}

impl PcmBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        let frames = samples.len() / 2;
        Self {
            samples,
            sample_rate,
            frames,
        }
    }

    pub fn duration(&self) -> Duration {
        frames_to_duration(self.frames, self.sample_rate)
    }

    /// Frame at `index`, if in range
    pub fn frame(&self, index: usize) -> Option<AudioFrame> {
        let i = index * 2;
        match (self.samples.get(i), self.samples.get(i + 1)) {
            (Some(&left), Some(&right)) => Some(AudioFrame { left, right }),
            _ => None,
        }
    }
}

/// Convert a frame count to wall time
pub fn frames_to_duration(frames: usize, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(frames as f64 / sample_rate as f64)
}

/// Single stereo audio frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AudioFrame {
    pub left: f32,
    pub right: f32,
}

impl AudioFrame {
    /// Silent frame
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn scaled(self, gain: f32) -> Self {
        Self {
            left: self.left * gain,
            right: self.right * gain,
        }
    }

    /// Add another frame to this one
    pub fn add(&mut self, other: AudioFrame) {
        self.left += other.left;
        self.right += other.right;
    }
}
