use std::fmt;

use chrono::{DateTime, Local};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::WalkError;
use crate::geo::{self, Compass, Turn};
use crate::route::{Coordinate, Route};

/// Coarse description of where the walker is along the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkPhase {
    Start,
    Walking {
        direction: Option<Compass>,
        turn: Option<Turn>,
    },
    End,
}

impl WalkPhase {
    /// Phase for a walker sitting on `segment_index`.
    ///
    /// `segment_index == route.len() - 1` is the terminal clamp and reads as `End`.
    pub fn derive(route: &Route, segment_index: usize, threshold_deg: f64) -> Self {
        if segment_index + 1 >= route.len() {
            return WalkPhase::End;
        }
        if segment_index == 0 {
            return WalkPhase::Start;
        }

        let outgoing = route.segment_bearing(segment_index);
        let incoming = route.segment_bearing(segment_index - 1);
        let turn = match (incoming, outgoing) {
            (Some(i), Some(o)) => geo::turn_between(i, o, threshold_deg),
            _ => None,
        };

        WalkPhase::Walking {
            direction: outgoing.map(Compass::from_bearing),
            turn,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WalkPhase::Start => "start",
            WalkPhase::Walking { .. } => "walking",
            WalkPhase::End => "end",
        }
    }
}

impl fmt::Display for WalkPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalkPhase::Walking {
                direction: Some(d),
                turn: Some(t),
            } => write!(f, "walking {d}, turning {t}"),
            WalkPhase::Walking {
                direction: Some(d),
                turn: None,
            } => write!(f, "walking {d}"),
            other => f.write_str(other.label()),
        }
    }
}

/// Everything a narrator gets to know about the walker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NarrationRequest {
    pub coordinate: Coordinate,
    pub pace_kmh: f64,
    pub phase: WalkPhase,
}

/// Identifies one dispatched narration call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NarrationTicket(pub u64);

/// Completion of a dispatched narration call.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationOutcome {
    pub ticket: NarrationTicket,
    pub result: Result<String, WalkError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationKind {
    Commentary,
    Failure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NarrationEvent {
    pub timestamp: DateTime<Local>,
    pub message: String,
    pub kind: NarrationKind,
}

impl NarrationEvent {
    pub fn commentary(message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            message: message.into(),
            kind: NarrationKind::Commentary,
        }
    }

    pub fn failure(err: &WalkError) -> Self {
        Self {
            timestamp: Local::now(),
            message: format!("Narration failed: {err}"),
            kind: NarrationKind::Failure,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.kind == NarrationKind::Failure
    }
}

/// Something that turns a location into commentary. Calls may block for a long time.
pub trait NarrationService: Send + Sync + 'static {
    fn narrate(&self, request: &NarrationRequest) -> Result<String, WalkError>;
}

/// Offline narrator that composes commentary from the walk context.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateNarrator;

impl NarrationService for TemplateNarrator {
    fn narrate(&self, request: &NarrationRequest) -> Result<String, WalkError> {
        let rng = &mut rand::thread_rng();
        let at = request.coordinate;
        let pace = request.pace_kmh;

        let text = match request.phase {
            WalkPhase::Start => {
                let openers = [
                    "Setting off from",
                    "Your walk begins at",
                    "Stepping out from",
                ];
                let opener = openers.choose(rng).copied().unwrap_or("Starting at");
                format!("{opener} {at}, at an easy {pace:.1} km/h.")
            }
            WalkPhase::End => {
                format!("You have arrived at {at}. That's the end of the route.")
            }
            WalkPhase::Walking { direction, turn } => {
                let heading = direction
                    .map(|d| format!("heading {}", d.name()))
                    .unwrap_or_else(|| "pausing on the spot".to_string());
                let fillers = [
                    "Take in the surroundings",
                    "Keep an eye on the street",
                    "Notice the buildings around you",
                ];
                let filler = fillers.choose(rng).copied().unwrap_or("Look around");
                match turn {
                    Some(t) => format!(
                        "Near {at}, {heading}. The path bends to the {t} here. {filler}."
                    ),
                    None => format!("Near {at}, {heading} at {pace:.1} km/h. {filler}."),
                }
            }
        };

        Ok(text)
    }
}

#[derive(Debug, Serialize)]
struct NarrationPayload {
    lat: f64,
    lng: f64,
    pace_kmh: f64,
    phase: &'static str,
    direction: Option<String>,
    turn: Option<String>,
}

impl From<&NarrationRequest> for NarrationPayload {
    fn from(request: &NarrationRequest) -> Self {
        let (direction, turn) = match request.phase {
            WalkPhase::Walking { direction, turn } => (
                direction.map(|d| d.to_string()),
                turn.map(|t| t.to_string()),
            ),
            _ => (None, None),
        };
        Self {
            lat: request.coordinate.lat,
            lng: request.coordinate.lng,
            pace_kmh: request.pace_kmh,
            phase: request.phase.label(),
            direction,
            turn,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NarrationReply {
    message: String,
}

/// Narrator backed by an HTTP endpoint that answers `{ "message": "..." }`.
#[derive(Debug, Clone)]
pub struct HttpNarrationService {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpNarrationService {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl NarrationService for HttpNarrationService {
    fn narrate(&self, request: &NarrationRequest) -> Result<String, WalkError> {
        let unavailable = |e: reqwest::Error| WalkError::NarrationUnavailable(e.to_string());

        let reply: NarrationReply = self
            .client
            .post(&self.endpoint)
            .json(&NarrationPayload::from(request))
            .send()
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?
            .json()
            .map_err(unavailable)?;

        let message = reply.message.trim();
        if message.is_empty() {
            return Err(WalkError::NarrationUnavailable(
                "empty narration in response".to_string(),
            ));
        }
        Ok(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lng: f64) -> Coordinate {
        Coordinate { lat, lng }
    }

    // east, then north, then north again
    fn zigzag() -> Route {
        Route::new(vec![
            pt(0.0, 0.0),
            pt(0.0, 0.001),
            pt(0.001, 0.001),
            pt(0.002, 0.001),
        ])
        .unwrap()
    }

    #[test]
    fn phase_start_and_end() {
        let route = zigzag();
        assert_eq!(WalkPhase::derive(&route, 0, 30.0), WalkPhase::Start);
        assert_eq!(WalkPhase::derive(&route, 3, 30.0), WalkPhase::End);
    }

    #[test]
    fn phase_reports_left_turn() {
        let route = zigzag();
        assert_eq!(
            WalkPhase::derive(&route, 1, 30.0),
            WalkPhase::Walking {
                direction: Some(Compass::N),
                turn: Some(Turn::Left),
            }
        );
    }

    #[test]
    fn phase_straight_has_no_turn() {
        let route = zigzag();
        assert_eq!(
            WalkPhase::derive(&route, 2, 30.0),
            WalkPhase::Walking {
                direction: Some(Compass::N),
                turn: None,
            }
        );
    }

    #[test]
    fn phase_on_degenerate_segment() {
        let route = Route::new(vec![
            pt(0.0, 0.0),
            pt(0.0, 0.001),
            pt(0.0, 0.001),
            pt(0.001, 0.001),
        ])
        .unwrap();
        assert_eq!(
            WalkPhase::derive(&route, 1, 30.0),
            WalkPhase::Walking {
                direction: None,
                turn: None,
            }
        );
    }

    #[test]
    fn phase_display() {
        let phase = WalkPhase::Walking {
            direction: Some(Compass::NE),
            turn: Some(Turn::Right),
        };
        assert_eq!(phase.to_string(), "walking NE, turning right");
        assert_eq!(WalkPhase::End.to_string(), "end");
    }

    #[test]
    fn template_mentions_context() {
        let narrator = TemplateNarrator;
        let text = narrator
            .narrate(&NarrationRequest {
                coordinate: pt(0.0005, 0.001),
                pace_kmh: 5.0,
                phase: WalkPhase::Walking {
                    direction: Some(Compass::N),
                    turn: Some(Turn::Left),
                },
            })
            .unwrap();
        assert!(text.contains("heading north"), "{text}");
        assert!(text.contains("left"), "{text}");

        let end = narrator
            .narrate(&NarrationRequest {
                coordinate: pt(0.0, 0.0),
                pace_kmh: 5.0,
                phase: WalkPhase::End,
            })
            .unwrap();
        assert!(end.contains("arrived"));
    }

    #[test]
    fn payload_carries_hints() {
        let payload = NarrationPayload::from(&NarrationRequest {
            coordinate: pt(1.0, 2.0),
            pace_kmh: 4.5,
            phase: WalkPhase::Walking {
                direction: Some(Compass::SW),
                turn: None,
            },
        });
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["phase"], "walking");
        assert_eq!(json["direction"], "SW");
        assert!(json["turn"].is_null());
        assert_eq!(json["lat"], 1.0);
    }

    #[test]
    fn http_service_reports_unreachable_endpoint() {
        let service = HttpNarrationService::new("http://127.0.0.1:9/narrate");
        let result = service.narrate(&NarrationRequest {
            coordinate: pt(0.0, 0.0),
            pace_kmh: 5.0,
            phase: WalkPhase::Start,
        });
        assert!(matches!(result, Err(WalkError::NarrationUnavailable(_))));
    }

    #[test]
    fn failure_event_is_flagged() {
        let ev = NarrationEvent::failure(&WalkError::NarrationUnavailable("down".into()));
        assert!(ev.is_failure());
        assert_eq!(ev.message, "Narration failed: narration unavailable: down");
    }
}
