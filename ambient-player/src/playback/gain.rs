//! Gain automation
//!
//! Per-slot gain parameters with cancelable linear ramps, plus a master gain
//! for user volume. The effective level sent to a slot is
//! `clamp(slot_gain * master_gain, 0, 1)`.
//!
//! Ramps are evaluated against a caller-supplied instant. A new `ramp_to` or
//! `set` on a parameter discards the previous ramp and starts from the live
//! value, so a ramp is never applied twice.

use crate::playback::slot::SlotId;
use std::time::Duration;
use tokio::time::Instant;

/// Linear ramp in progress
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    pub from: f32,
    pub to: f32,
    pub start: Instant,
    pub duration: Duration,
}

impl Ramp {
    fn value_at(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return self.to;
        }
        let elapsed = now.saturating_duration_since(self.start);
        let progress = (elapsed.as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * progress
    }

    fn is_finished(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.start) >= self.duration
    }
}

/// A single automatable gain value in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainParam {
    value: f32,
    ramp: Option<Ramp>,
}

impl GainParam {
    pub fn new(value: f32) -> Self {
        Self {
            value: value.clamp(0.0, 1.0),
            ramp: None,
        }
    }

    /// Live value at `now`
    pub fn value_at(&self, now: Instant) -> f32 {
        match &self.ramp {
            Some(ramp) => ramp.value_at(now),
            None => self.value,
        }
    }

    /// Final value once any ramp completes
    pub fn target(&self) -> f32 {
        match &self.ramp {
            Some(ramp) => ramp.to,
            None => self.value,
        }
    }

    /// Jump to `value`, cancelling any ramp
    pub fn set(&mut self, value: f32) {
        self.value = value.clamp(0.0, 1.0);
        self.ramp = None;
    }

    /// Ramp from the live value at `now` to `target` over `duration`
    pub fn ramp_to(&mut self, target: f32, duration: Duration, now: Instant) {
        let from = self.value_at(now);
        let to = target.clamp(0.0, 1.0);
        if duration.is_zero() {
            self.set(to);
            return;
        }
        self.value = from;
        self.ramp = Some(Ramp {
            from,
            to,
            start: now,
            duration,
        });
    }

    /// Drop the ramp, keeping the live value at `now`
    pub fn cancel(&mut self, now: Instant) {
        self.value = self.value_at(now);
        self.ramp = None;
    }

    /// Fold a finished ramp into the static value
    ///
    /// Returns true while a ramp is still running.
    fn settle(&mut self, now: Instant) -> bool {
        match self.ramp {
            Some(ramp) if ramp.is_finished(now) => {
                self.value = ramp.to;
                self.ramp = None;
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    pub fn is_ramping(&self) -> bool {
        self.ramp.is_some()
    }
}

/// Slot and master gain automation for the two playback slots
#[derive(Debug, Clone)]
pub struct GainAutomation {
    slots: [GainParam; 2],
    master: GainParam,
}

impl GainAutomation {
    pub fn new(master: f32) -> Self {
        Self {
            slots: [GainParam::new(0.0), GainParam::new(0.0)],
            master: GainParam::new(master),
        }
    }

    pub fn slot(&self, slot: SlotId) -> &GainParam {
        &self.slots[slot.index()]
    }

    pub fn slot_mut(&mut self, slot: SlotId) -> &mut GainParam {
        &mut self.slots[slot.index()]
    }

    pub fn set_gain(&mut self, slot: SlotId, value: f32) {
        self.slot_mut(slot).set(value);
    }

    pub fn ramp_to(&mut self, slot: SlotId, target: f32, duration: Duration, now: Instant) {
        self.slot_mut(slot).ramp_to(target, duration, now);
    }

    /// Ramp the master gain; the latest call always wins
    pub fn ramp_master(&mut self, target: f32, duration: Duration, now: Instant) {
        self.master.ramp_to(target, duration, now);
    }

    /// Cancel slot ramps, keeping live values
    pub fn cancel_slot_ramps(&mut self, now: Instant) {
        for param in &mut self.slots {
            param.cancel(now);
        }
    }

    /// Effective output for `slot` at `now`
    pub fn effective(&self, slot: SlotId, now: Instant) -> f32 {
        (self.slot(slot).value_at(now) * self.master.value_at(now)).clamp(0.0, 1.0)
    }

    /// Effective outputs for both slots, settling finished ramps
    pub fn render(&mut self, now: Instant) -> [f32; 2] {
        let levels = [self.effective(SlotId::A, now), self.effective(SlotId::B, now)];
        for param in &mut self.slots {
            param.settle(now);
        }
        self.master.settle(now);
        levels
    }

    /// True while any ramp (slot or master) is running
    pub fn is_animating(&self) -> bool {
        self.slots.iter().any(GainParam::is_ramping) || self.master.is_ramping()
    }
}
