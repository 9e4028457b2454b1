//! Continuous playback engine
//!
//! Owns the two playback slots, the gain automation and the transition
//! controller, and exposes the public playback contract: load a playlist,
//! play/pause, next/previous and volume. Every state change is published as
//! a [`PlayerSnapshot`] on a watch channel and as events on the [`EventBus`].
//!
//! The engine is driven by a single task (see `playback::service`): user
//! commands, slot events, the crossfade deadline and the gain render tick are
//! all delivered to `&mut self`, so there is no internal locking.

use crate::catalog::{CatalogProvider, TrackQueue};
use crate::error::{Error, Result};
use crate::playback::gain::GainAutomation;
use crate::playback::slot::{PlayRejection, PlaybackSlot, SlotEvent, SlotId};
use crate::playback::transition::{Crossfade, TransitionController, TransitionState};
use crate::schedule::PlaylistResolver;
use ambient_common::events::{PlaybackState, TransitionVia};
use ambient_common::{EventBus, PlayerEvent, PlayerSnapshot, PlayerStatus};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Engine timing and startup behavior
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Crossfade length; also the arming threshold before track end
    pub crossfade_window: Duration,
    /// Completion fires this long before the ramps finish
    pub completion_margin: Duration,
    /// Master gain ramp applied on volume changes
    pub volume_ramp: Duration,
    pub initial_volume: f32,
    /// Initial play intent
    pub autoplay: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            crossfade_window: Duration::from_secs(2),
            completion_margin: Duration::from_millis(30),
            volume_ramp: Duration::from_millis(80),
            initial_volume: 1.0,
            autoplay: true,
        }
    }
}

pub struct PlaybackEngine {
    slots: [Box<dyn PlaybackSlot>; 2],
    gains: GainAutomation,
    transition: TransitionController,
    catalog: Arc<dyn CatalogProvider>,
    resolver: Arc<dyn PlaylistResolver>,
    events: EventBus,
    snapshot_tx: watch::Sender<PlayerSnapshot>,
    settings: EngineSettings,

    status: PlayerStatus,
    error_message: Option<String>,
    playlist: Option<String>,
    queue: Option<TrackQueue>,
    current_index: usize,
    active: SlotId,
    is_playing: bool,
    volume: f32,
}

impl PlaybackEngine {
    /// Create an engine over two slots
    ///
    /// `slot_a` and `slot_b` must report ids A and B respectively.
    pub fn new(
        slot_a: Box<dyn PlaybackSlot>,
        slot_b: Box<dyn PlaybackSlot>,
        catalog: Arc<dyn CatalogProvider>,
        resolver: Arc<dyn PlaylistResolver>,
        events: EventBus,
        settings: EngineSettings,
    ) -> Self {
        debug_assert_eq!(slot_a.id(), SlotId::A);
        debug_assert_eq!(slot_b.id(), SlotId::B);

        let volume = settings.initial_volume.clamp(0.0, 1.0);
        let transition =
            TransitionController::new(settings.crossfade_window, settings.completion_margin);

        let mut engine = Self {
            slots: [slot_a, slot_b],
            gains: GainAutomation::new(volume),
            transition,
            catalog,
            resolver,
            events,
            snapshot_tx: watch::channel(PlayerSnapshot::default()).0,
            is_playing: settings.autoplay,
            settings,
            status: PlayerStatus::Loading,
            error_message: None,
            playlist: None,
            queue: None,
            current_index: 0,
            active: SlotId::A,
            volume,
        };

        engine.snapshot_tx.send_replace(engine.snapshot());
        engine.render_gains(Instant::now());
        engine
    }

    // ========================================================================
    // Public contract
    // ========================================================================

    /// Load a playlist and start it from the first track
    ///
    /// With `None` (or a blank name) the playlist resolver picks one. Resets
    /// index, active slot and transition state; the play intent carries
    /// over. An autoplay rejection here is recovered (paused, status ready).
    pub async fn load_playlist(&mut self, name: Option<String>) -> Result<()> {
        self.stop_all(Instant::now());
        self.status = PlayerStatus::Loading;
        self.error_message = None;
        self.publish();

        let requested = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let playlist = match requested {
            Some(name) => name,
            None => match self.resolver.resolve().await {
                Ok(name) => name,
                Err(e) => return Err(self.fail_load(None, e)),
            },
        };
        info!("Loading playlist '{}'", playlist);

        let tracks = match self.catalog.active_tracks(&playlist).await {
            Ok(tracks) => tracks,
            Err(e) => return Err(self.fail_load(Some(playlist), e)),
        };

        let queue = match TrackQueue::new(playlist.clone(), tracks) {
            Ok(queue) => queue,
            Err(e) => return Err(self.fail_load(Some(playlist), e)),
        };

        info!("Playlist '{}' loaded with {} tracks", playlist, queue.len());
        self.events.emit_lossy(PlayerEvent::PlaylistLoaded {
            playlist: playlist.clone(),
            track_count: queue.len(),
            timestamp: Utc::now(),
        });

        self.playlist = Some(playlist);
        self.queue = Some(queue);
        self.current_index = 0;
        self.active = SlotId::A;
        self.transition.cancel();
        self.status = PlayerStatus::Ready;

        if let Err(rejection) = self.hard_switch(0).await {
            self.on_rejected(rejection);
        }
        self.publish();
        Ok(())
    }

    /// Toggle play intent
    ///
    /// Pausing mid-crossfade completes the crossfade first so the incoming
    /// track is the one that resumes.
    pub async fn play_pause(&mut self) -> Result<()> {
        self.ensure_ready()?;

        if self.is_playing {
            if let Some(fade) = self.transition.settle() {
                debug!("Pause during crossfade, settling transition");
                self.complete_crossfade(fade);
            }
            for slot in &mut self.slots {
                slot.pause();
            }
            self.set_playing(false);
            info!("Playback paused");
            self.publish();
            return Ok(());
        }

        self.set_playing(true);
        let active = self.active;
        let result = self.slot_mut(active).play().await;
        match result {
            Ok(()) => {
                info!("Playback resumed");
                self.publish();
                Ok(())
            }
            Err(rejection) => {
                self.on_rejected(rejection.clone());
                self.publish();
                Err(Error::PlaybackRejected(rejection))
            }
        }
    }

    /// Skip to the next track (circular)
    pub async fn next(&mut self) -> Result<()> {
        let len = self.ensure_ready()?;
        let index = (self.current_index + 1) % len;
        self.navigate(index).await
    }

    /// Skip to the previous track (circular)
    pub async fn prev(&mut self) -> Result<()> {
        let len = self.ensure_ready()?;
        let index = (self.current_index % len + len - 1) % len;
        self.navigate(index).await
    }

    /// Set user volume (clamped to 0.0-1.0), ramping the master gain
    pub fn set_volume(&mut self, volume: f32) -> Result<()> {
        if !volume.is_finite() {
            return Err(Error::InvalidInput(format!("volume must be finite, got {}", volume)));
        }

        let new_volume = volume.clamp(0.0, 1.0);
        let old_volume = self.volume;
        self.volume = new_volume;

        let now = Instant::now();
        self.gains.ramp_master(new_volume, self.settings.volume_ramp, now);
        self.render_gains(now);

        debug!("Volume {:.3} -> {:.3}", old_volume, new_volume);
        self.events.emit_lossy(PlayerEvent::VolumeChanged {
            old_volume,
            new_volume,
            timestamp: Utc::now(),
        });
        self.publish();
        Ok(())
    }

    // ========================================================================
    // Event inputs
    // ========================================================================

    /// React to a slot progress or lifecycle signal
    pub async fn handle_slot_event(&mut self, event: SlotEvent) -> Result<()> {
        let slot = event.slot();
        let current = self.slots[slot.index()].generation();
        if event.generation() != current {
            debug!(
                "Dropping stale event from slot {} (generation {} != {})",
                slot,
                event.generation(),
                current
            );
            return Ok(());
        }
        if self.status != PlayerStatus::Ready {
            return Ok(());
        }

        match event {
            SlotEvent::Progress {
                elapsed, duration, ..
            } => self.on_progress(slot, elapsed, duration).await,
            SlotEvent::Ended { .. } => self.on_ended(slot).await,
        }
        Ok(())
    }

    /// Complete the in-flight crossfade if its deadline has passed
    pub fn on_deadline(&mut self, now: Instant) {
        if let Some(fade) = self.transition.take_due(now) {
            self.complete_crossfade(fade);
        }
    }

    /// Push current automation levels to both slots
    pub fn render_gains(&mut self, now: Instant) {
        let levels = self.gains.render(now);
        for slot in &mut self.slots {
            let id = slot.id();
            slot.set_gain(levels[id.index()]);
        }
    }

    /// Stop both slots (service shutdown)
    pub fn shutdown(&mut self) {
        self.stop_all(Instant::now());
        info!("Playback engine stopped");
    }

    // ========================================================================
    // Observers
    // ========================================================================

    pub fn snapshot(&self) -> PlayerSnapshot {
        let track = self.queue.as_ref().map(|q| q.get(self.current_index));
        PlayerSnapshot {
            status: self.status,
            playlist: self.playlist.clone(),
            track_id: track.map(|t| t.id.clone()),
            current_track_name: track.map(|t| t.name.clone()),
            index: if self.queue.is_some() { self.current_index } else { 0 },
            total: self.queue.as_ref().map_or(0, TrackQueue::len),
            is_playing: self.is_playing,
            volume: self.volume,
            error_message: self.error_message.clone(),
        }
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Crossfade completion deadline, when one is in flight
    pub fn deadline(&self) -> Option<Instant> {
        self.transition.deadline()
    }

    pub fn is_animating(&self) -> bool {
        self.gains.is_animating()
    }

    pub fn transition_state(&self) -> &TransitionState {
        self.transition.state()
    }

    pub fn status(&self) -> PlayerStatus {
        self.status
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn active_slot(&self) -> SlotId {
        self.active
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn queue(&self) -> Option<&TrackQueue> {
        self.queue.as_ref()
    }

    pub fn gains(&self) -> &GainAutomation {
        &self.gains
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    async fn on_progress(&mut self, slot: SlotId, elapsed: Duration, duration: Duration) {
        // Standby progress never arms; during a crossfade the incoming slot is
        // not active yet.
        if slot != self.active {
            return;
        }

        let Some(queue) = self.queue.as_ref() else {
            return;
        };
        let len = queue.len();
        let track_id = queue.get(self.current_index).id.clone();

        self.events.emit_lossy(PlayerEvent::PlaybackProgress {
            track_id,
            position_ms: elapsed.as_millis() as u64,
            duration_ms: duration.as_millis() as u64,
            timestamp: Utc::now(),
        });

        if let Some(next_index) =
            self.transition
                .try_arm(elapsed, duration, self.is_playing, self.current_index, len)
        {
            self.start_crossfade(next_index).await;
        }
    }

    async fn on_ended(&mut self, slot: SlotId) {
        match *self.transition.state() {
            TransitionState::InFlight(fade) if slot == fade.outgoing => {
                debug!("Outgoing slot {} ended before deadline, completing early", slot);
                if let Some(fade) = self.transition.settle() {
                    self.complete_crossfade(fade);
                }
            }
            TransitionState::InFlight(fade) if slot == fade.incoming => {
                // Incoming track shorter than the crossfade window
                if let Some(fade) = self.transition.settle() {
                    self.complete_crossfade(fade);
                }
                self.advance_after_end().await;
            }
            TransitionState::Idle if slot == self.active && self.is_playing => {
                self.advance_after_end().await;
            }
            _ => {}
        }
    }

    /// Armed → InFlight (or Aborting → Idle on rejection)
    async fn start_crossfade(&mut self, next_index: usize) {
        let Some(track) = self.queue.as_ref().map(|q| q.get(next_index).clone()) else {
            return;
        };
        let outgoing = self.active;
        let incoming = outgoing.other();

        info!(
            "Crossfade armed: index {} -> {} ('{}') on slot {}",
            self.current_index, next_index, track.name, incoming
        );

        self.gains.set_gain(incoming, 0.0);
        self.render_gains(Instant::now());
        {
            let slot = self.slot_mut(incoming);
            slot.load(&track.locator);
            slot.seek_to_start();
        }

        let result = self.slot_mut(incoming).play().await;
        match result {
            Ok(()) => {
                let now = Instant::now();
                let target_gain = self.gains.slot(outgoing).value_at(now);
                let window = self.transition.window();

                if self.transition.begin(outgoing, target_gain, now).is_some() {
                    self.gains.ramp_to(outgoing, 0.0, window, now);
                    self.gains.ramp_to(incoming, target_gain, window, now);
                    self.render_gains(now);

                    self.events.emit_lossy(PlayerEvent::CrossfadeStarted {
                        from_index: self.current_index,
                        to_index: next_index,
                        duration_ms: window.as_millis() as u64,
                        timestamp: Utc::now(),
                    });
                }
            }
            Err(rejection) => {
                let Some(to_index) = self.transition.abort() else {
                    return;
                };
                let abort = Error::CrossfadeAbort {
                    to_index,
                    reason: rejection.to_string(),
                };
                warn!("{}; switching directly", abort);
                self.events.emit_lossy(PlayerEvent::CrossfadeAborted {
                    to_index,
                    reason: rejection.to_string(),
                    timestamp: Utc::now(),
                });

                self.slot_mut(incoming).pause();
                if let Err(rejection) = self.hard_switch(to_index).await {
                    self.on_rejected(rejection);
                }
                self.transition.finish_abort();
            }
        }
        self.publish();
    }

    /// Swap roles at the end of a crossfade
    fn complete_crossfade(&mut self, fade: Crossfade) {
        let now = Instant::now();
        {
            let slot = self.slot_mut(fade.outgoing);
            slot.pause();
            slot.seek_to_start();
        }
        self.gains.set_gain(fade.outgoing, 0.0);
        self.gains.set_gain(fade.incoming, fade.target_gain);
        self.active = fade.incoming;
        self.current_index = fade.next_index;
        self.render_gains(now);

        info!(
            "Crossfade complete after {}ms: slot {} active, index {}",
            now.saturating_duration_since(fade.started_at).as_millis(),
            fade.incoming,
            fade.next_index
        );
        self.emit_track_started(TransitionVia::Crossfade);
        self.preload_standby();
        self.publish();
    }

    async fn advance_after_end(&mut self) {
        let Some(next_index) = self.queue.as_ref().map(|q| q.next_index(self.current_index))
        else {
            return;
        };
        info!("Track ended without crossfade, advancing to index {}", next_index);
        if let Err(rejection) = self.hard_switch(next_index).await {
            self.on_rejected(rejection);
        }
        self.publish();
    }

    async fn navigate(&mut self, index: usize) -> Result<()> {
        let previous = self.transition.cancel();
        if let TransitionState::InFlight(fade) = previous {
            info!(
                "Manual navigation cancels crossfade to index {}",
                fade.next_index
            );
        }
        self.stop_all(Instant::now());
        self.set_playing(true);

        match self.hard_switch(index).await {
            Ok(()) => {
                self.publish();
                Ok(())
            }
            Err(rejection) => {
                self.on_rejected(rejection.clone());
                self.publish();
                Err(Error::PlaybackRejected(rejection))
            }
        }
    }

    /// Load `index` into the active slot at full gain, silence the other,
    /// and play if the play intent is set
    async fn hard_switch(&mut self, index: usize) -> std::result::Result<(), PlayRejection> {
        let Some(track) = self.queue.as_ref().map(|q| q.get(index).clone()) else {
            return Ok(());
        };
        let len = self.queue.as_ref().map_or(1, TrackQueue::len);
        let active = self.active;
        let standby = active.other();
        let now = Instant::now();

        self.gains.cancel_slot_ramps(now);
        self.gains.set_gain(active, 1.0);
        self.gains.set_gain(standby, 0.0);
        self.slot_mut(standby).pause();
        {
            let slot = self.slot_mut(active);
            slot.pause();
            slot.load(&track.locator);
            slot.seek_to_start();
        }
        self.current_index = index % len;
        self.render_gains(now);

        debug!(
            "Hard switch to index {} ('{}') on slot {}",
            self.current_index, track.name, active
        );

        let started = if self.is_playing {
            let result = self.slot_mut(active).play().await;
            if result.is_ok() {
                self.emit_track_started(TransitionVia::HardSwitch);
            }
            result
        } else {
            Ok(())
        };
        self.preload_standby();
        started
    }

    /// Load the following track into the standby slot without playing it,
    /// so the fetch and decode finish long before the crossfade arms
    fn preload_standby(&mut self) {
        let Some(locator) = self
            .queue
            .as_ref()
            .map(|q| q.get(q.next_index(self.current_index)).locator.clone())
        else {
            return;
        };
        let standby = self.active.other();
        debug!("Preloading '{}' on standby slot {}", locator, standby);
        self.slot_mut(standby).load(&locator);
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn slot_mut(&mut self, id: SlotId) -> &mut Box<dyn PlaybackSlot> {
        &mut self.slots[id.index()]
    }

    /// Queue length when intents are accepted
    fn ensure_ready(&self) -> Result<usize> {
        match (&self.status, &self.queue) {
            (PlayerStatus::Ready, Some(queue)) => Ok(queue.len()),
            _ => Err(Error::NotReady(self.status)),
        }
    }

    /// Cancel any transition and ramps and pause both slots
    fn stop_all(&mut self, now: Instant) {
        self.transition.cancel();
        self.gains.cancel_slot_ramps(now);
        for slot in &mut self.slots {
            slot.pause();
        }
    }

    fn set_playing(&mut self, playing: bool) {
        if self.is_playing == playing {
            return;
        }
        let old_state = PlaybackState::from_playing(self.is_playing);
        self.is_playing = playing;
        self.events.emit_lossy(PlayerEvent::PlaybackStateChanged {
            old_state,
            new_state: PlaybackState::from_playing(playing),
            timestamp: Utc::now(),
        });
    }

    fn on_rejected(&mut self, rejection: PlayRejection) {
        warn!("Playback rejected: {}", rejection);
        self.set_playing(false);
        self.events.emit_lossy(PlayerEvent::PlaybackRejected {
            reason: rejection.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn fail_load(&mut self, playlist: Option<String>, err: Error) -> Error {
        error!("Playlist load failed: {}", err);
        self.stop_all(Instant::now());
        self.queue = None;
        self.current_index = 0;
        self.playlist = playlist.clone();
        self.status = PlayerStatus::Error;
        self.error_message = Some(err.to_string());
        self.set_playing(false);

        self.events.emit_lossy(PlayerEvent::PlaylistLoadFailed {
            playlist,
            message: err.to_string(),
            timestamp: Utc::now(),
        });
        self.publish();
        err
    }

    fn emit_track_started(&self, via: TransitionVia) {
        if let Some(queue) = &self.queue {
            let track = queue.get(self.current_index);
            self.events.emit_lossy(PlayerEvent::TrackStarted {
                track_id: track.id.clone(),
                name: track.name.clone(),
                index: self.current_index,
                total: queue.len(),
                via,
                timestamp: Utc::now(),
            });
        }
    }

    /// Publish the snapshot if it changed
    fn publish(&self) {
        let snapshot = self.snapshot();
        let changed = self.snapshot_tx.send_if_modified(|current| {
            if *current != snapshot {
                *current = snapshot.clone();
                true
            } else {
                false
            }
        });
        if changed {
            self.events.emit_lossy(PlayerEvent::SnapshotChanged {
                snapshot,
                timestamp: Utc::now(),
            });
        }
    }
}
