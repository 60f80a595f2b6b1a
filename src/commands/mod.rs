// ABOUTME: Command module aggregator for the fleetvisor CLI.
// ABOUTME: Re-exports lifecycle, graceful-restart, status, and flag command handlers.

mod context;
mod flag;
mod graceful;
mod lifecycle;
mod status;

pub use context::Context;
pub use flag::{resume, suspend};
pub use graceful::graceful_restart;
pub use lifecycle::{restart, start, stop};
pub use status::status;
