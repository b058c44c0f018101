use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::warn;

use crate::error::WalkError;
use crate::narration::NarrationOutcome;
use crate::scheduler::NarrationDispatcher;
use crate::simulation::{Simulation, TickReport};
use crate::walk::WalkState;

pub const PACE_STEP_KMH: f64 = 0.5;

/// What the shell should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    OpenMap(String),
    Quit,
}

/// Interactive shell state around one simulation.
pub struct App<D: NarrationDispatcher> {
    pub sim: Simulation<D>,
    pub route_label: String,
    /// Last rejected command, shown until the next successful one.
    pub status: Option<String>,
}

impl<D: NarrationDispatcher> App<D> {
    pub fn new(sim: Simulation<D>, route_label: impl Into<String>) -> Self {
        Self {
            sim,
            route_label: route_label.into(),
            status: None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> KeyOutcome {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyOutcome::Quit;
        }

        let result = match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return KeyOutcome::Quit,
            KeyCode::Enter => self.sim.start(now),
            KeyCode::Char(' ') => match self.sim.state() {
                WalkState::Walking => self.sim.pause(),
                WalkState::Paused => self.sim.resume(now),
                WalkState::Stopped => self.sim.start(now),
            },
            KeyCode::Char('x') => self.sim.stop(),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.sim.set_pace(self.sim.pace() + PACE_STEP_KMH)
            }
            KeyCode::Char('-') => self.sim.set_pace(self.sim.pace() - PACE_STEP_KMH),
            KeyCode::Char('o') => {
                return match self.sim.osm_url() {
                    Some(url) => KeyOutcome::OpenMap(url),
                    None => KeyOutcome::Handled,
                }
            }
            _ => return KeyOutcome::Handled,
        };

        self.report(result);
        KeyOutcome::Handled
    }

    pub fn on_narration(&mut self, outcome: NarrationOutcome) -> bool {
        self.sim.on_narration(outcome)
    }

    pub fn poll(&mut self, now: Instant) -> TickReport {
        self.sim.poll(now)
    }

    fn report(&mut self, result: Result<(), WalkError>) {
        match result {
            Ok(()) => self.status = None,
            Err(err) => {
                warn!(error = %err, "command rejected");
                self.status = Some(err.to_string());
            }
        }
    }
}
