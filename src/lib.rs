// Library surface for headless/integration tests and reuse.
// The terminal UI lives in the binary; everything it drives lives here.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod geo;
pub mod logging;
pub mod narration;
pub mod provider;
pub mod route;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod simulation;
pub mod tracker;
pub mod util;
pub mod walk;

pub use error::WalkError;
pub use route::{Coordinate, Route};
pub use simulation::{Simulation, WalkSettings};
pub use walk::{WalkCommand, WalkState};
