// ABOUTME: Process snapshots, worker classification, and rolling-group extraction.
// ABOUTME: Everything here is read-only with respect to the supervisor.

mod classify;
mod groups;
mod naming;
mod snapshot;

pub use classify::{DEFAULT_WORKER_MARKERS, WorkerMatcher};
pub use groups::{RollingGroupKey, RollingGroups, RollingPair};
pub use naming::{DEFAULT_INDEX, RollingName, SEPARATORS, parse_rolling_name};
pub use snapshot::{DomainSnapshot, ProcessStateStore};
