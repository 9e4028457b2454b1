//! Per-slot voice and the two-voice mixer
//!
//! A [`Voice`] is the audio-thread view of one playback slot: the decoded
//! buffer, a frame cursor, a play flag and a gain. Gain changes arrive at
//! the engine's render tick rate, so the voice slews toward the target one
//! sample at a time to avoid zipper noise.

use crate::audio::types::{frames_to_duration, AudioFrame, PcmBuffer};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Time for the applied gain to cross the full 0..1 range
const GAIN_SLEW_TIME: Duration = Duration::from_millis(5);

/// Voice shared between a slot and the audio thread
pub type SharedVoice = Arc<Mutex<Voice>>;

#[derive(Debug, Default)]
pub struct Voice {
    buffer: Option<Arc<PcmBuffer>>,
    cursor: usize,
    playing: bool,
    target_gain: f32,
    applied_gain: f32,
    generation: u64,
}

impl Voice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedVoice {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Replace the buffer and rewind; playback stays paused
    ///
    /// Returns the previous buffer. Callers drop it after releasing the
    /// voice lock so freeing a whole track never stalls the output callback.
    pub fn set_buffer(&mut self, buffer: Arc<PcmBuffer>) -> Option<Arc<PcmBuffer>> {
        self.cursor = 0;
        self.playing = false;
        self.buffer.replace(buffer)
    }

    /// Remove the buffer and stop; see [`Voice::set_buffer`] on dropping it
    pub fn take_buffer(&mut self) -> Option<Arc<PcmBuffer>> {
        self.cursor = 0;
        self.playing = false;
        self.buffer.take()
    }

    pub fn has_buffer(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Gain the voice slews toward; clamped to [0, 1]
    pub fn set_gain(&mut self, gain: f32) {
        self.target_gain = if gain.is_finite() {
            gain.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    pub fn target_gain(&self) -> f32 {
        self.target_gain
    }

    pub fn applied_gain(&self) -> f32 {
        self.applied_gain
    }

    pub fn set_generation(&mut self, generation: u64) {
        self.generation = generation;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn position(&self) -> Duration {
        match &self.buffer {
            Some(buffer) => frames_to_duration(self.cursor.min(buffer.frames), buffer.sample_rate),
            None => Duration::ZERO,
        }
    }

    pub fn duration(&self) -> Duration {
        self.buffer
            .as_ref()
            .map(|b| b.duration())
            .unwrap_or(Duration::ZERO)
    }

    /// Cursor reached the end of a loaded buffer
    pub fn is_finished(&self) -> bool {
        match &self.buffer {
            Some(buffer) => self.cursor >= buffer.frames,
            None => false,
        }
    }

    /// Produce the next output frame and advance
    ///
    /// `slew` is the largest gain change allowed per frame. A paused or
    /// finished voice yields silence and keeps its cursor.
    pub fn next_frame(&mut self, slew: f32) -> AudioFrame {
        let delta = self.target_gain - self.applied_gain;
        self.applied_gain += delta.clamp(-slew, slew);

        if !self.playing {
            return AudioFrame::zero();
        }
        let Some(buffer) = &self.buffer else {
            return AudioFrame::zero();
        };
        match buffer.frame(self.cursor) {
            Some(frame) => {
                self.cursor += 1;
                frame.scaled(self.applied_gain)
            }
            None => AudioFrame::zero(),
        }
    }
}

/// Sums the A and B voices for the output callback
pub struct Mixer {
    voices: [SharedVoice; 2],
    slew: f32,
}

impl Mixer {
    pub fn new(voices: [SharedVoice; 2], sample_rate: u32) -> Self {
        let slew_frames = (sample_rate as f32 * GAIN_SLEW_TIME.as_secs_f32()).max(1.0);
        Self {
            voices,
            slew: 1.0 / slew_frames,
        }
    }

    pub fn next_frame(&mut self) -> AudioFrame {
        let mut out = AudioFrame::zero();
        for voice in &self.voices {
            // A poisoned voice contributes silence rather than killing the stream
            if let Ok(mut voice) = voice.lock() {
                out.add(voice.next_frame(self.slew));
            }
        }
        out
    }
}
