//! Device-backed playback slot
//!
//! [`DeviceSlot`] implements [`PlaybackSlot`] over a [`Voice`] mixed by the
//! audio host. `load` starts fetching and decoding in the background; `play`
//! waits for that to finish, so a bad locator or undecodable file surfaces
//! as a [`PlayRejection`] exactly where the engine expects it.
//!
//! While playing, a progress task reports elapsed time on the slot event
//! channel and sends `Ended` once the voice runs out of frames.

use crate::audio::loader::{rejection_for, TrackLoader};
use crate::audio::types::PcmBuffer;
use crate::audio::voice::{SharedVoice, Voice};
use crate::error::Result;
use crate::playback::{PlayRejection, PlaybackSlot, SlotEvent, SlotId};
use async_trait::async_trait;
use std::sync::{Arc, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct DeviceSlot {
    id: SlotId,
    voice: SharedVoice,
    loader: Arc<TrackLoader>,
    events: mpsc::UnboundedSender<SlotEvent>,
    progress_interval: Duration,
    locator: Option<String>,
    generation: u64,
    pending: Option<JoinHandle<Result<PcmBuffer>>>,
    failed: Option<PlayRejection>,
    progress: Option<JoinHandle<()>>,
}

impl DeviceSlot {
    pub fn new(
        id: SlotId,
        voice: SharedVoice,
        loader: Arc<TrackLoader>,
        events: mpsc::UnboundedSender<SlotEvent>,
        progress_interval: Duration,
    ) -> Self {
        Self {
            id,
            voice,
            loader,
            events,
            progress_interval,
            locator: None,
            generation: 0,
            pending: None,
            failed: None,
            progress: None,
        }
    }

    fn voice(&self) -> Option<MutexGuard<'_, Voice>> {
        match self.voice.lock() {
            Ok(guard) => Some(guard),
            Err(_) => {
                warn!("Slot {} voice lock poisoned", self.id);
                None
            }
        }
    }

    fn bump_generation(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        if let Some(mut voice) = self.voice() {
            voice.set_generation(generation);
        }
    }

    fn stop_progress(&mut self) {
        if let Some(task) = self.progress.take() {
            task.abort();
        }
    }

    fn start_progress(&mut self) {
        self.stop_progress();

        let voice = Arc::clone(&self.voice);
        let events = self.events.clone();
        let slot = self.id;
        let interval = self.progress_interval;

        self.progress = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let (generation, elapsed, duration, finished) = match voice.lock() {
                    Ok(v) => (v.generation(), v.position(), v.duration(), v.is_finished()),
                    Err(_) => break,
                };

                if finished {
                    let _ = events.send(SlotEvent::Ended { slot, generation });
                    break;
                }

                let progress = SlotEvent::Progress {
                    slot,
                    generation,
                    elapsed,
                    duration,
                };
                if events.send(progress).is_err() {
                    break;
                }
            }
        }));
    }

    /// Wait for the background load, installing the buffer on success
    async fn finish_load(&mut self) -> std::result::Result<(), PlayRejection> {
        let Some(task) = self.pending.take() else {
            return Ok(());
        };

        let outcome = match task.await {
            Ok(Ok(pcm)) => Ok(pcm),
            Ok(Err(e)) => Err(rejection_for(&e)),
            Err(e) => Err(PlayRejection::Media(format!("load task failed: {}", e))),
        };

        match outcome {
            Ok(pcm) => {
                let previous = self
                    .voice()
                    .and_then(|mut voice| voice.set_buffer(Arc::new(pcm)));
                drop(previous);
                Ok(())
            }
            Err(rejection) => {
                warn!("Slot {} failed to load: {}", self.id, rejection);
                self.failed = Some(rejection.clone());
                Err(rejection)
            }
        }
    }
}

#[async_trait]
impl PlaybackSlot for DeviceSlot {
    fn id(&self) -> SlotId {
        self.id
    }

    fn load(&mut self, locator: &str) {
        if self.locator.as_deref() == Some(locator) && self.failed.is_none() {
            return;
        }

        debug!("Slot {} loading {}", self.id, locator);
        self.stop_progress();
        if let Some(task) = self.pending.take() {
            task.abort();
        }
        // Released outside the lock; the output callback shares it
        let previous = self.voice().and_then(|mut voice| voice.take_buffer());
        drop(previous);
        self.failed = None;
        self.locator = Some(locator.to_string());
        self.bump_generation();

        let loader = Arc::clone(&self.loader);
        let locator = locator.to_string();
        self.pending = Some(tokio::spawn(async move { loader.load(&locator).await }));
    }

    async fn play(&mut self) -> std::result::Result<(), PlayRejection> {
        if let Some(rejection) = &self.failed {
            return Err(rejection.clone());
        }
        self.finish_load().await?;

        match self.voice() {
            Some(mut voice) if voice.has_buffer() => voice.play(),
            Some(_) => {
                return Err(PlayRejection::InvalidLocator("no track loaded".to_string()));
            }
            None => return Err(PlayRejection::Media("voice unavailable".to_string())),
        }

        self.start_progress();
        Ok(())
    }

    fn pause(&mut self) {
        self.stop_progress();
        if let Some(mut voice) = self.voice() {
            voice.pause();
        }
    }

    fn seek_to_start(&mut self) {
        let playing = match self.voice() {
            Some(mut voice) => {
                voice.rewind();
                voice.is_playing()
            }
            None => false,
        };
        self.bump_generation();
        if playing {
            self.start_progress();
        }
    }

    fn set_gain(&mut self, gain: f32) {
        if let Some(mut voice) = self.voice() {
            voice.set_gain(gain);
        }
    }

    fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }

    fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for DeviceSlot {
    fn drop(&mut self) {
        self.stop_progress();
        if let Some(task) = self.pending.take() {
            task.abort();
        }
    }
}
