use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};
use tracing::{debug, warn};

use crate::narration::{NarrationOutcome, NarrationRequest, NarrationService, NarrationTicket};
use crate::scheduler::NarrationDispatcher;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum WalkerEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    Narration(NarrationOutcome),
}

/// Source of loop events (keyboard, resize, narration completions)
pub trait WalkerEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<WalkerEvent, RecvTimeoutError>;

    /// Handle for producers living on other threads.
    fn sender(&self) -> Sender<WalkerEvent>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    tx: Sender<WalkerEvent>,
    rx: Receiver<WalkerEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let keys = tx.clone();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if keys.send(WalkerEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if keys.send(WalkerEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { tx, rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl WalkerEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<WalkerEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<WalkerEvent> {
        self.tx.clone()
    }
}

/// Plain channel source, for headless runs and tests
pub struct ChannelEventSource {
    tx: Sender<WalkerEvent>,
    rx: Receiver<WalkerEvent>,
}

impl ChannelEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }
}

impl Default for ChannelEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl WalkerEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<WalkerEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn sender(&self) -> Sender<WalkerEvent> {
        self.tx.clone()
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: WalkerEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: WalkerEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    pub fn event_source(&self) -> &E {
        &self.event_source
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> WalkerEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                WalkerEvent::Tick
            }
        }
    }
}

/// Runs each narration call on its own thread and posts the outcome back into the loop.
pub struct ThreadDispatcher {
    service: Arc<dyn NarrationService>,
    tx: Sender<WalkerEvent>,
}

impl ThreadDispatcher {
    pub fn new(service: Arc<dyn NarrationService>, tx: Sender<WalkerEvent>) -> Self {
        Self { service, tx }
    }
}

impl NarrationDispatcher for ThreadDispatcher {
    fn dispatch(&mut self, ticket: NarrationTicket, request: NarrationRequest) {
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();

        std::thread::spawn(move || {
            let result = service.narrate(&request);
            debug!(ticket = ticket.0, ok = result.is_ok(), "narration call returned");
            if tx
                .send(WalkerEvent::Narration(NarrationOutcome { ticket, result }))
                .is_err()
            {
                warn!(ticket = ticket.0, "event loop gone, narration result dropped");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WalkError;
    use crate::narration::{TemplateNarrator, WalkPhase};
    use crate::route::Coordinate;

    #[test]
    fn step_returns_tick_on_timeout() {
        let es = ChannelEventSource::new();
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let runner = Runner::new(es, ticker);

        // With no events available, step should yield Tick
        match runner.step() {
            WalkerEvent::Tick => {}
            _ => panic!("expected Tick on timeout"),
        }
    }

    #[test]
    fn step_passes_through_events() {
        let es = ChannelEventSource::new();
        es.sender().send(WalkerEvent::Resize).unwrap();
        let ticker = FixedTicker::new(Duration::from_millis(10));
        let runner = Runner::new(es, ticker);

        match runner.step() {
            WalkerEvent::Resize => {}
            _ => panic!("expected Resize event"),
        }
    }

    struct Failing;

    impl NarrationService for Failing {
        fn narrate(&self, _: &NarrationRequest) -> Result<String, WalkError> {
            Err(WalkError::NarrationUnavailable("no network".into()))
        }
    }

    fn request() -> NarrationRequest {
        NarrationRequest {
            coordinate: Coordinate { lat: 0.0, lng: 0.0 },
            pace_kmh: 5.0,
            phase: WalkPhase::Start,
        }
    }

    #[test]
    fn thread_dispatcher_posts_outcome() {
        let es = ChannelEventSource::new();
        let mut dispatcher = ThreadDispatcher::new(Arc::new(TemplateNarrator), es.sender());
        dispatcher.dispatch(NarrationTicket(7), request());

        match es.recv_timeout(Duration::from_secs(5)) {
            Ok(WalkerEvent::Narration(outcome)) => {
                assert_eq!(outcome.ticket, NarrationTicket(7));
                assert!(outcome.result.is_ok());
            }
            other => panic!("expected narration outcome, got {other:?}"),
        }
    }

    #[test]
    fn thread_dispatcher_posts_failures_too() {
        let es = ChannelEventSource::new();
        let mut dispatcher = ThreadDispatcher::new(Arc::new(Failing), es.sender());
        dispatcher.dispatch(NarrationTicket(1), request());

        match es.recv_timeout(Duration::from_secs(5)) {
            Ok(WalkerEvent::Narration(outcome)) => {
                assert_eq!(
                    outcome.result,
                    Err(WalkError::NarrationUnavailable("no network".into()))
                );
            }
            other => panic!("expected narration outcome, got {other:?}"),
        }
    }
}
