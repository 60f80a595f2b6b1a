// ABOUTME: Job drain coordination around destructive operations.
// ABOUTME: Suspension flag store, drain coordinator, and site-config toggles.

mod coordinator;
mod store;
mod toggle;

pub use coordinator::{DEFAULT_SUSPENSION_KEY, JobDrainCoordinator};
pub use store::{
    ConsumerState, ConsumerStatus, DrainError, FileSuspensionStore, NoopJob, SuspensionStore,
};
pub use toggle::{
    AppliedToggle, MAINTENANCE_MODE_KEY, PAUSE_SCHEDULER_KEY, SiteConfigToggle, ToggleError,
};
