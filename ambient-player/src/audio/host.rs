//! Audio host thread
//!
//! Owns the cpal output stream on a dedicated thread (streams are not
//! `Send` everywhere) and mixes the A and B voices into it. The host hands
//! out the two [`DeviceSlot`]s that drive those voices.

use crate::audio::device_slot::DeviceSlot;
use crate::audio::loader::TrackLoader;
use crate::audio::output::AudioOutput;
use crate::audio::voice::{Mixer, SharedVoice, Voice};
use crate::error::{Error, Result};
use crate::playback::{SlotEvent, SlotId};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

pub struct AudioHost {
    voices: [SharedVoice; 2],
    sample_rate: u32,
    shutdown: Option<std_mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl AudioHost {
    /// Open the device and start mixing
    ///
    /// Blocks until the stream is running or has failed to start.
    pub fn start(device_name: Option<String>) -> Result<Self> {
        let voices = [Voice::shared(), Voice::shared()];
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<u32>>();
        let (shutdown_tx, shutdown_rx) = std_mpsc::channel::<()>();

        let thread_voices = voices.clone();
        let thread = std::thread::Builder::new()
            .name("audio-output".to_string())
            .spawn(move || {
                let mut output = match AudioOutput::new(device_name.as_deref()) {
                    Ok(output) => output,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                let sample_rate = output.sample_rate();
                let mut mixer = Mixer::new(thread_voices, sample_rate);
                if let Err(e) = output.start(move || mixer.next_frame()) {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
                let _ = ready_tx.send(Ok(sample_rate));

                // Runs until stop() or the host is dropped
                let _ = shutdown_rx.recv();
                if let Err(e) = output.stop() {
                    warn!("Failed to stop audio output: {}", e);
                }
            })?;

        let sample_rate = ready_rx
            .recv()
            .map_err(|_| Error::AudioOutput("audio thread exited during startup".to_string()))??;

        info!("Audio host running at {}Hz", sample_rate);

        Ok(Self {
            voices,
            sample_rate,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Build the A and B slots bound to this host's voices
    pub fn slots(
        &self,
        loader: Arc<TrackLoader>,
        events: mpsc::UnboundedSender<SlotEvent>,
        progress_interval: Duration,
    ) -> (DeviceSlot, DeviceSlot) {
        let [a, b] = self.voices.clone();
        (
            DeviceSlot::new(
                SlotId::A,
                a,
                Arc::clone(&loader),
                events.clone(),
                progress_interval,
            ),
            DeviceSlot::new(SlotId::B, b, loader, events, progress_interval),
        )
    }

    /// Stop the stream and join the audio thread
    pub fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Audio thread panicked");
            }
            info!("Audio host stopped");
        }
    }
}

impl Drop for AudioHost {
    fn drop(&mut self) {
        self.stop();
    }
}
