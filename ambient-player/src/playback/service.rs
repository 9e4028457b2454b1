//! Engine service task
//!
//! Moves a [`PlaybackEngine`] onto one tokio task and feeds it commands,
//! slot events, the crossfade deadline and the gain render tick. Callers
//! talk to it through a cloneable [`EngineHandle`]; each command carries a
//! oneshot reply channel.

use crate::error::{Error, Result};
use crate::playback::engine::PlaybackEngine;
use crate::playback::slot::SlotEvent;
use ambient_common::{EventBus, PlayerSnapshot, PlayerStatus};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

const COMMAND_CAPACITY: usize = 32;

/// Requests handled by the engine task
#[derive(Debug)]
pub enum EngineCommand {
    LoadPlaylist {
        name: Option<String>,
        reply: oneshot::Sender<Result<()>>,
    },
    PlayPause {
        reply: oneshot::Sender<Result<()>>,
    },
    Next {
        reply: oneshot::Sender<Result<()>>,
    },
    Previous {
        reply: oneshot::Sender<Result<()>>,
    },
    SetVolume {
        volume: f32,
        reply: oneshot::Sender<Result<()>>,
    },
    Shutdown,
}

/// Spawns the engine task
pub struct EngineService;

impl EngineService {
    /// Start the engine task
    ///
    /// `render_interval` is the gain automation tick used while a ramp runs.
    pub fn spawn(
        engine: PlaybackEngine,
        slot_events: mpsc::UnboundedReceiver<SlotEvent>,
        render_interval: Duration,
    ) -> (EngineHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_CAPACITY);
        let handle = EngineHandle {
            commands: tx,
            snapshot: engine.subscribe_snapshots(),
            events: engine.events().clone(),
        };

        let task = tokio::spawn(run(engine, rx, slot_events, render_interval));
        (handle, task)
    }
}

async fn run(
    mut engine: PlaybackEngine,
    mut commands: mpsc::Receiver<EngineCommand>,
    mut slot_events: mpsc::UnboundedReceiver<SlotEvent>,
    render_interval: Duration,
) {
    info!("Engine service started");

    let mut render = tokio::time::interval(render_interval);
    render.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let deadline = engine.deadline();
        let animating = engine.is_animating();

        tokio::select! {
            command = commands.recv() => match command {
                Some(EngineCommand::Shutdown) | None => break,
                Some(command) => dispatch(&mut engine, command).await,
            },
            Some(event) = slot_events.recv() => {
                if let Err(e) = engine.handle_slot_event(event).await {
                    warn!("Slot event handling failed: {}", e);
                }
            }
            _ = sleep_until_deadline(deadline) => {
                engine.on_deadline(Instant::now());
            }
            _ = render.tick(), if animating => {
                engine.render_gains(Instant::now());
            }
        }
    }

    engine.shutdown();
    info!("Engine service stopped");
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn dispatch(engine: &mut PlaybackEngine, command: EngineCommand) {
    debug!("Engine command: {:?}", command);
    match command {
        EngineCommand::LoadPlaylist { name, reply } => {
            let _ = reply.send(engine.load_playlist(name).await);
        }
        EngineCommand::PlayPause { reply } => {
            let _ = reply.send(engine.play_pause().await);
        }
        EngineCommand::Next { reply } => {
            let _ = reply.send(engine.next().await);
        }
        EngineCommand::Previous { reply } => {
            let _ = reply.send(engine.prev().await);
        }
        EngineCommand::SetVolume { volume, reply } => {
            let _ = reply.send(engine.set_volume(volume));
        }
        EngineCommand::Shutdown => {}
    }
}

/// Cloneable client of the engine task
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<EngineCommand>,
    snapshot: watch::Receiver<PlayerSnapshot>,
    events: EventBus,
}

impl EngineHandle {
    pub async fn load_playlist(&self, name: Option<String>) -> Result<()> {
        self.request(|reply| EngineCommand::LoadPlaylist { name, reply })
            .await
    }

    pub async fn play_pause(&self) -> Result<()> {
        self.ensure_not_loading()?;
        self.request(|reply| EngineCommand::PlayPause { reply }).await
    }

    pub async fn next(&self) -> Result<()> {
        self.ensure_not_loading()?;
        self.request(|reply| EngineCommand::Next { reply }).await
    }

    pub async fn previous(&self) -> Result<()> {
        self.ensure_not_loading()?;
        self.request(|reply| EngineCommand::Previous { reply }).await
    }

    pub async fn set_volume(&self, volume: f32) -> Result<()> {
        self.request(|reply| EngineCommand::SetVolume { volume, reply })
            .await
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot.clone()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Ask the engine task to stop both slots and exit
    pub async fn shutdown(&self) {
        let _ = self.commands.send(EngineCommand::Shutdown).await;
    }

    /// Playback intents are refused while a catalog fetch is in progress
    fn ensure_not_loading(&self) -> Result<()> {
        let status = self.snapshot.borrow().status;
        if status == PlayerStatus::Loading {
            return Err(Error::NotReady(status));
        }
        Ok(())
    }

    async fn request<F>(&self, make: F) -> Result<()>
    where
        F: FnOnce(oneshot::Sender<Result<()>>) -> EngineCommand,
    {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| Error::Internal("engine service stopped".to_string()))?;
        rx.await
            .map_err(|_| Error::Internal("engine service dropped request".to_string()))?
    }
}
