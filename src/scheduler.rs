//! Timers that drive a walk, and the seam narration calls leave through.

use std::time::{Duration, Instant};

use crate::narration::{NarrationRequest, NarrationTicket};

/// A fixed-period task with an explicit armed/cancelled lifecycle.
#[derive(Debug, Clone)]
pub struct PeriodicTask {
    name: &'static str,
    period: Duration,
    next_due: Option<Instant>,
}

impl PeriodicTask {
    pub fn new(name: &'static str, period: Duration) -> Self {
        Self {
            name,
            period,
            next_due: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// First firing is one full period after `now`.
    pub fn arm(&mut self, now: Instant) {
        self.next_due = Some(now + self.period);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// Consumes one pending firing if it is due at `now`.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if due <= now => {
                self.next_due = Some(due + self.period);
                true
            }
            _ => false,
        }
    }
}

/// Cadence check for narration, evaluated on each position tick.
#[derive(Debug, Clone)]
pub struct NarrationGate {
    period: Duration,
    armed: bool,
}

impl NarrationGate {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            armed: false,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn cancel(&mut self) {
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Open when armed, nothing is in flight, and a full period passed since the last dispatch.
    pub fn is_open(&self, now: Instant, last_dispatch: Option<Instant>, in_flight: bool) -> bool {
        if !self.armed || in_flight {
            return false;
        }
        match last_dispatch {
            Some(at) => now.saturating_duration_since(at) >= self.period,
            None => true,
        }
    }
}

/// Both periodic activities of a walk, armed and cancelled together.
#[derive(Debug, Clone)]
pub struct NarrationScheduler {
    pub position_tick: PeriodicTask,
    pub narration_gate: NarrationGate,
}

impl NarrationScheduler {
    pub fn new(tick_period: Duration, narration_period: Duration) -> Self {
        Self {
            position_tick: PeriodicTask::new("position-tick", tick_period),
            narration_gate: NarrationGate::new(narration_period),
        }
    }

    pub fn arm(&mut self, now: Instant) {
        self.position_tick.arm(now);
        self.narration_gate.arm();
    }

    pub fn cancel(&mut self) {
        self.position_tick.cancel();
        self.narration_gate.cancel();
    }

    pub fn is_armed(&self) -> bool {
        self.position_tick.is_armed()
    }

    pub fn tick_period(&self) -> Duration {
        self.position_tick.period()
    }
}

/// Hands narration requests to whatever performs them.
///
/// The dispatcher must not call back synchronously; completions are fed to
/// `Simulation::on_narration` later, from the same loop that polls it.
pub trait NarrationDispatcher {
    fn dispatch(&mut self, ticket: NarrationTicket, request: NarrationRequest);
}

/// Keeps requests in memory until the caller decides how they complete.
#[derive(Debug, Default)]
pub struct ManualDispatcher {
    pending: Vec<(NarrationTicket, NarrationRequest)>,
    dispatched: usize,
}

impl ManualDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &[(NarrationTicket, NarrationRequest)] {
        &self.pending
    }

    pub fn take_pending(&mut self) -> Vec<(NarrationTicket, NarrationRequest)> {
        std::mem::take(&mut self.pending)
    }

    /// Total number of dispatches ever seen.
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }
}

impl NarrationDispatcher for ManualDispatcher {
    fn dispatch(&mut self, ticket: NarrationTicket, request: NarrationRequest) {
        self.dispatched += 1;
        self.pending.push((ticket, request));
    }
}
