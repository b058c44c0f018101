//! The walking engine: state machine, session and scheduler wired together behind
//! the control surface the shell drives.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::WalkError;
use crate::narration::{
    NarrationEvent, NarrationOutcome, NarrationRequest, NarrationTicket, WalkPhase,
};
use crate::route::{Coordinate, Route};
use crate::scheduler::{NarrationDispatcher, NarrationScheduler};
use crate::session::{WalkingSession, DEFAULT_PACE_KMH};
use crate::tracker::PositionTracker;
use crate::util;
use crate::walk::{WalkCommand, WalkState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkSettings {
    pub pace_kmh: f64,
    pub tick_period: Duration,
    pub narration_period: Duration,
    /// Bearing change above which a turn hint is reported.
    pub turn_threshold_deg: f64,
}

impl Default for WalkSettings {
    fn default() -> Self {
        Self {
            pace_kmh: DEFAULT_PACE_KMH,
            tick_period: Duration::from_secs(1),
            narration_period: Duration::from_secs(20),
            turn_threshold_deg: 30.0,
        }
    }
}

/// What a call to [`Simulation::poll`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub ticks: u32,
    pub narration_dispatched: bool,
    pub route_completed: bool,
}

pub fn validate_pace(pace_kmh: f64) -> Result<f64, WalkError> {
    if pace_kmh.is_finite() && pace_kmh > 0.0 {
        Ok(pace_kmh)
    } else {
        Err(WalkError::InvalidPace(pace_kmh))
    }
}

#[derive(Debug)]
pub struct Simulation<D: NarrationDispatcher> {
    route: Option<Route>,
    session: WalkingSession,
    scheduler: NarrationScheduler,
    turn_threshold_deg: f64,
    dispatcher: D,
    next_ticket: u64,
    // tickets below this belong to an earlier walk
    walk_first_ticket: u64,
}

impl<D: NarrationDispatcher> Simulation<D> {
    pub fn new(settings: WalkSettings, dispatcher: D) -> Result<Self, WalkError> {
        let pace = validate_pace(settings.pace_kmh)?;
        Ok(Self {
            route: None,
            session: WalkingSession::with_pace(pace),
            scheduler: NarrationScheduler::new(settings.tick_period, settings.narration_period),
            turn_threshold_deg: settings.turn_threshold_deg,
            dispatcher,
            next_ticket: 0,
            walk_first_ticket: 0,
        })
    }

    pub fn with_route(
        settings: WalkSettings,
        route: Route,
        dispatcher: D,
    ) -> Result<Self, WalkError> {
        let mut sim = Self::new(settings, dispatcher)?;
        sim.set_route(route);
        Ok(sim)
    }

    /// Replaces the route and discards all progress. A running walk is stopped first.
    pub fn set_route(&mut self, route: Route) {
        if self.session.state != WalkState::Stopped {
            info!(state = %self.session.state, "route replaced mid-walk, stopping");
            self.halt();
        }
        info!(
            vertices = route.len(),
            meters = route.total_distance(),
            "route loaded"
        );
        self.session.reset(Some(route.first()));
        self.walk_first_ticket = self.next_ticket;
        self.route = Some(route);
    }

    pub fn start(&mut self, now: Instant) -> Result<(), WalkError> {
        let next = self.check(WalkCommand::Start)?;
        let first = match &self.route {
            Some(route) => route.first(),
            None => {
                warn!("start requested without a route");
                return Err(WalkError::InvalidRoute { points: 0 });
            }
        };

        self.session.reset(Some(first));
        self.walk_first_ticket = self.next_ticket;
        self.session.state = next;
        self.scheduler.arm(now);
        info!(pace_kmh = self.session.pace_kmh, "walk started");

        self.try_dispatch(now);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), WalkError> {
        let next = self.check(WalkCommand::Pause)?;
        self.scheduler.cancel();
        self.session.state = next;
        info!(meters = self.session.distance_traveled, "walk paused");
        Ok(())
    }

    /// Picks up a paused walk where it left off.
    pub fn resume(&mut self, now: Instant) -> Result<(), WalkError> {
        let next = self.check(WalkCommand::Continue)?;
        self.session.state = next;
        self.scheduler.arm(now);
        info!(meters = self.session.distance_traveled, "walk resumed");
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), WalkError> {
        self.check(WalkCommand::Stop)?;
        self.halt();
        info!(meters = self.session.distance_traveled, "walk stopped");
        Ok(())
    }

    /// Takes effect from the next position tick; distance already walked is untouched.
    pub fn set_pace(&mut self, pace_kmh: f64) -> Result<(), WalkError> {
        self.session.pace_kmh = validate_pace(pace_kmh)?;
        debug!(pace_kmh, "pace changed");
        Ok(())
    }

    /// Runs every position tick due at `now`.
    pub fn poll(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport::default();

        while self.session.state.is_walking() && self.scheduler.position_tick.take_due(now) {
            report.ticks += 1;
            let (dispatched, completed) = self.advance(now);
            report.narration_dispatched |= dispatched;
            if completed {
                report.route_completed = true;
                break;
            }
        }

        report
    }

    /// Applies a finished narration call. Returns whether the log grew.
    ///
    /// Only the completion matching the in-flight ticket counts; repeats and
    /// strays are ignored. A call left over from an earlier walk frees the
    /// guard without touching the current log, and the next tick narrates.
    pub fn on_narration(&mut self, outcome: NarrationOutcome) -> bool {
        if self.session.narration_in_flight != Some(outcome.ticket) {
            debug!(ticket = outcome.ticket.0, "ignoring stale narration result");
            return false;
        }
        self.session.narration_in_flight = None;

        if outcome.ticket.0 < self.walk_first_ticket {
            debug!(ticket = outcome.ticket.0, "narration from an earlier walk dropped");
            return false;
        }

        match outcome.result {
            Ok(message) => {
                let appended = self.session.record_narration(message);
                if !appended {
                    debug!(ticket = outcome.ticket.0, "duplicate narration suppressed");
                }
                appended
            }
            Err(err) => {
                warn!(ticket = outcome.ticket.0, error = %err, "narration failed");
                self.session.log.push(NarrationEvent::failure(&err));
                true
            }
        }
    }

    fn check(&self, command: WalkCommand) -> Result<WalkState, WalkError> {
        let state = self.session.state;
        state.next(command).ok_or_else(|| {
            debug!(%state, %command, "illegal transition ignored");
            WalkError::IllegalTransition { state, command }
        })
    }

    fn halt(&mut self) {
        self.scheduler.cancel();
        self.session.state = WalkState::Stopped;
    }

    /// One position tick. Returns (narration dispatched, route completed).
    fn advance(&mut self, now: Instant) -> (bool, bool) {
        let Some(route) = self.route.as_ref() else {
            self.halt();
            return (false, true);
        };

        let step = self.session.speed_mps() * self.scheduler.tick_period().as_secs_f64();
        let distance = (self.session.distance_traveled + step).min(route.total_distance());
        let position = PositionTracker::new(route).locate(distance);

        self.session.distance_traveled = distance;
        self.session.current = Some(position.coordinate);
        self.session.segment_index = if position.complete {
            route.len() - 1
        } else {
            position.segment_index
        };

        let gate_open = self.scheduler.narration_gate.is_open(
            now,
            self.session.last_narration_at,
            self.session.is_narration_in_flight(),
        );
        let dispatched = gate_open && self.try_dispatch(now);

        if position.complete {
            self.complete_route();
        }
        (dispatched, position.complete)
    }

    fn complete_route(&mut self) {
        if let Ok(next) = self.check(WalkCommand::RouteComplete) {
            self.scheduler.cancel();
            self.session.state = next;
            info!(meters = self.session.distance_traveled, "route complete");
        }
    }

    fn try_dispatch(&mut self, now: Instant) -> bool {
        if let Some(ticket) = self.session.narration_in_flight {
            debug!(ticket = ticket.0, "narration still in flight, not dispatching");
            return false;
        }
        let (Some(route), Some(coordinate)) = (self.route.as_ref(), self.session.current) else {
            return false;
        };

        let phase = WalkPhase::derive(route, self.session.segment_index, self.turn_threshold_deg);
        let ticket = NarrationTicket(self.next_ticket);
        self.next_ticket += 1;

        self.session.narration_in_flight = Some(ticket);
        self.session.last_narration_at = Some(now);

        let request = NarrationRequest {
            coordinate,
            pace_kmh: self.session.pace_kmh,
            phase,
        };
        info!(ticket = ticket.0, %phase, at = %coordinate, "narration dispatched");
        self.dispatcher.dispatch(ticket, request);
        true
    }

    pub fn state(&self) -> WalkState {
        self.session.state
    }

    pub fn pace(&self) -> f64 {
        self.session.pace_kmh
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn position(&self) -> Option<Coordinate> {
        self.session.current
    }

    /// OpenStreetMap link for the current position.
    pub fn osm_url(&self) -> Option<String> {
        self.session.current.as_ref().map(util::osm_url)
    }

    pub fn segment_index(&self) -> usize {
        self.session.segment_index
    }

    pub fn distance_traveled(&self) -> f64 {
        self.session.distance_traveled
    }

    /// Fraction of the route walked, `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        match &self.route {
            Some(route) if route.total_distance() > 0.0 => {
                (self.session.distance_traveled / route.total_distance()).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }

    pub fn remaining_distance(&self) -> f64 {
        self.route
            .as_ref()
            .map(|r| (r.total_distance() - self.session.distance_traveled).max(0.0))
            .unwrap_or(0.0)
    }

    /// Time left at the current pace, only while walking and only if it fits a `Duration`.
    pub fn eta(&self) -> Option<Duration> {
        if !self.session.state.is_walking() {
            return None;
        }
        Duration::try_from_secs_f64(self.remaining_distance() / self.session.speed_mps()).ok()
    }

    pub fn log(&self) -> &[NarrationEvent] {
        &self.session.log
    }

    pub fn narration_in_flight(&self) -> bool {
        self.session.is_narration_in_flight()
    }

    pub fn session(&self) -> &WalkingSession {
        &self.session
    }

    pub fn scheduler(&self) -> &NarrationScheduler {
        &self.scheduler
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut D {
        &mut self.dispatcher
    }
}
