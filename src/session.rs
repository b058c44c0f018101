use std::time::Instant;

use crate::narration::{NarrationEvent, NarrationTicket};
use crate::route::Coordinate;
use crate::util;
use crate::walk::WalkState;

pub const DEFAULT_PACE_KMH: f64 = 5.0;

/// Mutable walk progress, owned by exactly one simulation.
#[derive(Debug, Clone)]
pub struct WalkingSession {
    pub state: WalkState,
    pub pace_kmh: f64,
    /// Meters along the route since the last start.
    pub distance_traveled: f64,
    pub current: Option<Coordinate>,
    pub segment_index: usize,
    // Narration bookkeeping
    pub last_narration_at: Option<Instant>,
    pub last_narration_message: Option<String>,
    pub narration_in_flight: Option<NarrationTicket>,
    pub log: Vec<NarrationEvent>,
}

impl Default for WalkingSession {
    fn default() -> Self {
        Self {
            state: WalkState::Stopped,
            pace_kmh: DEFAULT_PACE_KMH,
            distance_traveled: 0.0,
            current: None,
            segment_index: 0,
            last_narration_at: None,
            last_narration_message: None,
            narration_in_flight: None,
            log: Vec::new(),
        }
    }
}

impl WalkingSession {
    pub fn with_pace(pace_kmh: f64) -> Self {
        Self {
            pace_kmh,
            ..Default::default()
        }
    }

    /// Rewinds progress to the route start. Pace and any in-flight call survive.
    pub fn reset(&mut self, start: Option<Coordinate>) {
        self.distance_traveled = 0.0;
        self.current = start;
        self.segment_index = 0;
        self.last_narration_at = None;
        self.last_narration_message = None;
        self.log.clear();
    }

    pub fn is_narration_in_flight(&self) -> bool {
        self.narration_in_flight.is_some()
    }

    /// Meters per second at the current pace.
    pub fn speed_mps(&self) -> f64 {
        util::kmh_to_mps(self.pace_kmh)
    }

    /// Appends `message` unless it repeats the last delivered narration.
    /// Returns whether the log grew.
    pub fn record_narration(&mut self, message: String) -> bool {
        if self.last_narration_message.as_deref() == Some(message.as_str()) {
            return false;
        }
        self.log.push(NarrationEvent::commentary(message.clone()));
        self.last_narration_message = Some(message);
        true
    }

    /// Log entries newest first, for display.
    pub fn recent_log(&self) -> impl Iterator<Item = &NarrationEvent> {
        self.log.iter().rev()
    }
}
