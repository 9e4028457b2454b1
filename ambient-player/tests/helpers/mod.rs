//! Shared test infrastructure for ambient-player integration tests
//!
//! - `ScriptedSlot`: in-memory `PlaybackSlot` with a recorder for assertions
//!   and scripted play rejections
//! - Fixture builders for tracks, catalogs and engines
//! - Sine-wave WAV files for decoder and device slot tests

#![allow(dead_code)]

use ambient_common::EventBus;
use ambient_player::catalog::{MemoryCatalog, Track};
use ambient_player::playback::{
    EngineSettings, PlayRejection, PlaybackEngine, PlaybackSlot, SlotEvent, SlotId,
};
use ambient_player::schedule::FixedPlaylist;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::f32::consts::PI;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PLAYLIST: &str = "loja";

/// Observable state of a scripted slot
#[derive(Debug, Default)]
pub struct SlotLog {
    pub loads: Vec<String>,
    pub plays: usize,
    pub pauses: usize,
    pub seeks: usize,
    pub gains: Vec<f32>,
    pub playing: bool,
    pub generation: u64,
    pub rejections: VecDeque<PlayRejection>,
}

/// Test handle onto a `ScriptedSlot`
#[derive(Debug, Clone, Default)]
pub struct SlotRecorder(Arc<Mutex<SlotLog>>);

impl SlotRecorder {
    pub fn reject_next_play(&self, rejection: PlayRejection) {
        self.0.lock().unwrap().rejections.push_back(rejection);
    }

    pub fn is_playing(&self) -> bool {
        self.0.lock().unwrap().playing
    }

    pub fn generation(&self) -> u64 {
        self.0.lock().unwrap().generation
    }

    pub fn plays(&self) -> usize {
        self.0.lock().unwrap().plays
    }

    pub fn loads(&self) -> Vec<String> {
        self.0.lock().unwrap().loads.clone()
    }

    pub fn last_load(&self) -> Option<String> {
        self.0.lock().unwrap().loads.last().cloned()
    }

    /// Last gain pushed by the engine
    pub fn gain(&self) -> f32 {
        self.0.lock().unwrap().gains.last().copied().unwrap_or(0.0)
    }

    pub fn gains(&self) -> Vec<f32> {
        self.0.lock().unwrap().gains.clone()
    }
}

/// Slot double that records every call
pub struct ScriptedSlot {
    id: SlotId,
    locator: Option<String>,
    log: SlotRecorder,
}

impl ScriptedSlot {
    pub fn new(id: SlotId) -> (Self, SlotRecorder) {
        let recorder = SlotRecorder::default();
        (
            Self {
                id,
                locator: None,
                log: recorder.clone(),
            },
            recorder,
        )
    }
}

#[async_trait]
impl PlaybackSlot for ScriptedSlot {
    fn id(&self) -> SlotId {
        self.id
    }

    fn load(&mut self, locator: &str) {
        let mut log = self.log.0.lock().unwrap();
        if self.locator.as_deref() == Some(locator) && !log.playing {
            return;
        }
        self.locator = Some(locator.to_string());
        log.loads.push(locator.to_string());
        log.generation += 1;
    }

    async fn play(&mut self) -> Result<(), PlayRejection> {
        let mut log = self.log.0.lock().unwrap();
        if let Some(rejection) = log.rejections.pop_front() {
            return Err(rejection);
        }
        log.plays += 1;
        log.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        let mut log = self.log.0.lock().unwrap();
        log.pauses += 1;
        log.playing = false;
    }

    fn seek_to_start(&mut self) {
        let mut log = self.log.0.lock().unwrap();
        log.seeks += 1;
        log.generation += 1;
    }

    fn set_gain(&mut self, gain: f32) {
        self.log.0.lock().unwrap().gains.push(gain);
    }

    fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }

    fn generation(&self) -> u64 {
        self.log.0.lock().unwrap().generation
    }
}

/// Active track fixture; sort key follows the given order
pub fn track(id: &str, sort_key: i64) -> Track {
    track_in(PLAYLIST, id, sort_key)
}

pub fn track_in(playlist: &str, id: &str, sort_key: i64) -> Track {
    Track {
        id: id.to_string(),
        name: id.to_uppercase(),
        locator: format!("{}.mp3", id),
        kind: "music".to_string(),
        active: true,
        playlist: playlist.to_string(),
        sort_key: Some(sort_key),
        created_at: None,
    }
}

/// Tracks `t1..=tn` in the default playlist
pub fn tracks(n: usize) -> Vec<Track> {
    (1..=n).map(|i| track(&format!("t{}", i), i as i64)).collect()
}

pub fn settings() -> EngineSettings {
    EngineSettings {
        crossfade_window: Duration::from_secs(2),
        completion_margin: Duration::from_millis(30),
        volume_ramp: Duration::from_millis(80),
        initial_volume: 1.0,
        autoplay: true,
    }
}

/// Engine plus recorders and the catalog behind it
pub struct Harness {
    pub engine: PlaybackEngine,
    pub a: SlotRecorder,
    pub b: SlotRecorder,
    pub catalog: Arc<MemoryCatalog>,
    pub events: EventBus,
}

impl Harness {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self::with_settings(tracks, settings())
    }

    pub fn with_settings(tracks: Vec<Track>, settings: EngineSettings) -> Self {
        let (slot_a, a) = ScriptedSlot::new(SlotId::A);
        let (slot_b, b) = ScriptedSlot::new(SlotId::B);
        let catalog = Arc::new(MemoryCatalog::new(tracks));
        let events = EventBus::new(256);
        let engine = PlaybackEngine::new(
            Box::new(slot_a),
            Box::new(slot_b),
            catalog.clone(),
            Arc::new(FixedPlaylist(PLAYLIST.to_string())),
            events.clone(),
            settings,
        );
        Self {
            engine,
            a,
            b,
            catalog,
            events,
        }
    }

    pub fn recorder(&self, slot: SlotId) -> &SlotRecorder {
        match slot {
            SlotId::A => &self.a,
            SlotId::B => &self.b,
        }
    }

    /// Progress report from `slot` with its current generation
    pub fn progress(&self, slot: SlotId, elapsed_ms: u64, duration_ms: u64) -> SlotEvent {
        SlotEvent::Progress {
            slot,
            generation: self.recorder(slot).generation(),
            elapsed: Duration::from_millis(elapsed_ms),
            duration: Duration::from_millis(duration_ms),
        }
    }

    pub fn ended(&self, slot: SlotId) -> SlotEvent {
        SlotEvent::Ended {
            slot,
            generation: self.recorder(slot).generation(),
        }
    }
}

/// Write a 440 Hz sine WAV (16-bit) and return its path
pub fn write_sine(dir: &Path, name: &str, sample_rate: u32, channels: u16, seconds: f32) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    let frames = (sample_rate as f32 * seconds) as usize;
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let sample = ((2.0 * PI * 440.0 * t).sin() * 0.5 * i16::MAX as f32) as i16;
        for _ in 0..channels {
            writer.write_sample(sample).unwrap();
        }
    }
    writer.finalize().unwrap();
    path
}
