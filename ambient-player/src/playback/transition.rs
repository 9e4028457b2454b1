//! Transition controller state machine
//!
//! Decides when a crossfade arms, tracks the in-flight crossfade and its
//! completion deadline, and hands finished transitions back to the engine.
//! Side effects (slot control, gain ramps) are performed by the engine.
//!
//! ```text
//! Idle ──progress within window──▶ ArmedForCrossfade ──play ok──▶ InFlight ──deadline/ended──▶ Idle
//!                                         │
//!                                         └──play rejected──▶ Aborting ──hard switch──▶ Idle
//! ```
//!
//! Manual navigation forces Idle from any state.

use crate::playback::slot::SlotId;
use std::time::Duration;
use tokio::time::Instant;

/// Crossfade that has started and not yet completed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossfade {
    /// Queue index the incoming slot plays
    pub next_index: usize,
    pub outgoing: SlotId,
    pub incoming: SlotId,
    /// Gain the incoming slot ramps to
    pub target_gain: f32,
    pub started_at: Instant,
    pub completes_at: Instant,
}

/// Transition state, owned by the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionState {
    Idle,
    ArmedForCrossfade { next_index: usize },
    InFlight(Crossfade),
    Aborting { next_index: usize },
}

impl TransitionState {
    pub fn name(&self) -> &'static str {
        match self {
            TransitionState::Idle => "Idle",
            TransitionState::ArmedForCrossfade { .. } => "ArmedForCrossfade",
            TransitionState::InFlight(_) => "InFlight",
            TransitionState::Aborting { .. } => "Aborting",
        }
    }
}

/// Crossfade timing state machine
#[derive(Debug, Clone)]
pub struct TransitionController {
    state: TransitionState,
    window: Duration,
    margin: Duration,
}

impl TransitionController {
    /// `window` is the crossfade length; completion fires `margin` before
    /// the ramps end.
    pub fn new(window: Duration, margin: Duration) -> Self {
        Self {
            state: TransitionState::Idle,
            window,
            margin,
        }
    }

    pub fn state(&self) -> &TransitionState {
        &self.state
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, TransitionState::InFlight(_))
    }

    /// Completion deadline of the in-flight crossfade
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            TransitionState::InFlight(fade) => Some(fade.completes_at),
            _ => None,
        }
    }

    /// Arm a crossfade from an active-slot progress report
    ///
    /// Arms only when Idle, playing, the duration is known and the remaining
    /// time is within the window. Returns the next queue index when armed.
    pub fn try_arm(
        &mut self,
        elapsed: Duration,
        duration: Duration,
        is_playing: bool,
        current_index: usize,
        queue_len: usize,
    ) -> Option<usize> {
        if !matches!(self.state, TransitionState::Idle) || !is_playing || queue_len == 0 {
            return None;
        }
        if duration.is_zero() {
            return None;
        }
        let remaining = duration.saturating_sub(elapsed);
        if remaining > self.window {
            return None;
        }

        let next_index = (current_index + 1) % queue_len;
        self.state = TransitionState::ArmedForCrossfade { next_index };
        Some(next_index)
    }

    /// Armed → InFlight once the standby slot has started
    pub fn begin(
        &mut self,
        outgoing: SlotId,
        target_gain: f32,
        now: Instant,
    ) -> Option<Crossfade> {
        let TransitionState::ArmedForCrossfade { next_index } = self.state else {
            return None;
        };

        let fade = Crossfade {
            next_index,
            outgoing,
            incoming: outgoing.other(),
            target_gain,
            started_at: now,
            completes_at: now + self.window.saturating_sub(self.margin),
        };
        self.state = TransitionState::InFlight(fade);
        Some(fade)
    }

    /// Armed → Aborting after the standby slot refused to start
    pub fn abort(&mut self) -> Option<usize> {
        let TransitionState::ArmedForCrossfade { next_index } = self.state else {
            return None;
        };
        self.state = TransitionState::Aborting { next_index };
        Some(next_index)
    }

    /// Aborting → Idle after the fallback hard switch
    pub fn finish_abort(&mut self) {
        if matches!(self.state, TransitionState::Aborting { .. }) {
            self.state = TransitionState::Idle;
        }
    }

    /// Complete the in-flight crossfade if its deadline has passed
    pub fn take_due(&mut self, now: Instant) -> Option<Crossfade> {
        match self.state {
            TransitionState::InFlight(fade) if now >= fade.completes_at => {
                self.state = TransitionState::Idle;
                Some(fade)
            }
            _ => None,
        }
    }

    /// Complete the in-flight crossfade immediately
    pub fn settle(&mut self) -> Option<Crossfade> {
        match self.state {
            TransitionState::InFlight(fade) => {
                self.state = TransitionState::Idle;
                Some(fade)
            }
            _ => None,
        }
    }

    /// Force Idle from any state, returning the state that was replaced
    pub fn cancel(&mut self) -> TransitionState {
        std::mem::replace(&mut self.state, TransitionState::Idle)
    }
}
