// ABOUTME: Blue/green rolling swaps for interchangeable worker pairs.
// ABOUTME: Type-state swap steps, persisted active color, and a single-flight guard.

mod controller;
mod error;
mod flight;
mod record;
mod state;
mod store;
mod swap;

pub use controller::{GroupRestart, RollingDeploymentController, RollingPolicy};
pub use error::RollingError;
pub use flight::{FlightGuard, SingleFlight};
pub use record::{SwapPhase, SwapRecord};
pub use state::{Completed, InactiveRunning, InactiveStarting, Planned, Switched};
pub use store::{ActiveColorStore, STATE_FILE_SUFFIX};
pub use swap::{Swap, SwapResult};
