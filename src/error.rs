use crate::walk::{WalkCommand, WalkState};

/// Every failure the walking engine and its collaborators can report.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WalkError {
    /// A route needs at least two points to be walked.
    #[error("route needs at least 2 points, got {points}")]
    InvalidRoute { points: usize },

    #[error("coordinate out of range: lat {lat}, lng {lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    /// Not fatal: the command was ignored and nothing changed.
    #[error("cannot {command} while {state}")]
    IllegalTransition {
        state: WalkState,
        command: WalkCommand,
    },

    #[error("pace must be a positive number of km/h, got {0}")]
    InvalidPace(f64),

    #[error("route unavailable: {0}")]
    RouteUnavailable(String),

    #[error("narration unavailable: {0}")]
    NarrationUnavailable(String),
}
