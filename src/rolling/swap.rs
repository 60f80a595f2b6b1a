// ABOUTME: Rolling swap state machine using the type state pattern.
// ABOUTME: Each step consumes the swap and returns the next state on success.

use std::marker::PhantomData;
use std::time::Duration;
use tokio::time::Instant;

use crate::process_state::{RollingGroupKey, RollingPair};
use crate::report::Status;
use crate::stopper::{GracefulStopper, StopPolicy};
use crate::supervisor::{ProcessState, SupervisorError, SupervisorOps};
use crate::types::Color;

use super::error::RollingError;
use super::state::{Completed, InactiveRunning, InactiveStarting, Planned, Switched};
use super::store::ActiveColorStore;

/// Result type for steps that hand the swap back on failure so the caller
/// can clean up from the state it was in.
pub type SwapResult<T, S> = Result<Swap<T>, (Swap<S>, RollingError)>;

/// One blue/green swap for a complete rolling pair.
#[derive(Debug)]
#[must_use = "swap state must be used"]
pub struct Swap<S> {
    key: RollingGroupKey,
    active: Color,
    inactive: Color,
    active_name: String,
    inactive_name: String,
    _state: PhantomData<S>,
}

// =============================================================================
// Accessors
// =============================================================================

impl<S> Swap<S> {
    fn transition<T>(self) -> Swap<T> {
        Swap {
            key: self.key,
            active: self.active,
            inactive: self.inactive,
            active_name: self.active_name,
            inactive_name: self.inactive_name,
            _state: PhantomData,
        }
    }

    pub fn key(&self) -> &RollingGroupKey {
        &self.key
    }

    /// Color that is active when the swap starts.
    pub fn active(&self) -> &Color {
        &self.active
    }

    /// Color the swap moves to.
    pub fn inactive(&self) -> &Color {
        &self.inactive
    }

    pub fn active_name(&self) -> &str {
        &self.active_name
    }

    pub fn inactive_name(&self) -> &str {
        &self.inactive_name
    }
}

// =============================================================================
// Planned
// =============================================================================

impl Swap<Planned> {
    /// Read the persisted active color and resolve both instance names.
    pub fn plan(pair: &RollingPair, store: &ActiveColorStore) -> Result<Self, RollingError> {
        let colors = store.colors();
        let active = store.active(&pair.key);
        let inactive = colors
            .other(&active)
            .cloned()
            .unwrap_or_else(|| colors.second().clone());

        let name_for = |color: &Color| {
            pair.member(color)
                .map(str::to_string)
                .ok_or_else(|| RollingError::IncompletePair {
                    group: pair.key.to_string(),
                    missing: color.to_string(),
                })
        };

        Ok(Swap {
            key: pair.key.clone(),
            active_name: name_for(&active)?,
            inactive_name: name_for(&inactive)?,
            active,
            inactive,
            _state: PhantomData,
        })
    }

    /// Ask the endpoint to start the inactive instance without waiting.
    ///
    /// On failure the swap is returned in the starting state, because the
    /// endpoint may have spawned the process before reporting the error.
    pub async fn start_inactive(
        self,
        ops: &dyn SupervisorOps,
    ) -> SwapResult<InactiveStarting, InactiveStarting> {
        tracing::info!(group = %self.key, process = %self.inactive_name, "starting inactive instance");
        match ops.start_process(&self.inactive_name, false).await {
            Ok(()) => Ok(self.transition()),
            Err(SupervisorError::AlreadyStarted(_)) => {
                tracing::debug!(process = %self.inactive_name, "inactive instance already started");
                Ok(self.transition())
            }
            Err(source) => {
                let err = RollingError::StartFailed {
                    process: self.inactive_name.clone(),
                    source,
                };
                Err((self.transition(), err))
            }
        }
    }
}

// =============================================================================
// InactiveStarting
// =============================================================================

impl Swap<InactiveStarting> {
    /// Poll until the inactive instance is RUNNING.
    ///
    /// STARTING and BACKOFF keep the wait going; any other state ends it.
    pub async fn wait_running(
        self,
        ops: &dyn SupervisorOps,
        timeout: Duration,
        poll_interval: Duration,
    ) -> SwapResult<InactiveRunning, InactiveStarting> {
        let deadline = Instant::now() + timeout;

        loop {
            match ops.get_process(&self.inactive_name).await {
                Ok(p) if p.state == ProcessState::Running => {
                    tracing::info!(process = %self.inactive_name, "inactive instance running");
                    return Ok(self.transition());
                }
                Ok(p) if matches!(p.state, ProcessState::Starting | ProcessState::Backoff) => {
                    tracing::debug!(process = %self.inactive_name, state = %p.state, "waiting for RUNNING");
                }
                Ok(p) => {
                    let err = RollingError::NotRunning {
                        process: self.inactive_name.clone(),
                        state: p.state,
                    };
                    return Err((self, err));
                }
                Err(source) if source.is_connection() || matches!(source, SupervisorError::NotFound(_)) => {
                    let err = RollingError::Supervisor {
                        process: self.inactive_name.clone(),
                        source,
                    };
                    return Err((self, err));
                }
                Err(e) => {
                    tracing::debug!(process = %self.inactive_name, "state poll failed: {}", e);
                }
            }

            if Instant::now() >= deadline {
                let err = RollingError::Timeout {
                    process: self.inactive_name.clone(),
                    timeout,
                };
                return Err((self, err));
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Best-effort stop of the instance this swap started. Returns a warning
    /// when the cleanup itself did not succeed.
    pub async fn abort(self, ops: &dyn SupervisorOps, stop_policy: &StopPolicy) -> Option<String> {
        stop_instance(ops, &self.inactive_name, stop_policy).await
    }
}

// =============================================================================
// InactiveRunning
// =============================================================================

impl Swap<InactiveRunning> {
    /// Persist the inactive color as the new active color.
    pub fn switch_pointer(self, store: &ActiveColorStore) -> SwapResult<Switched, InactiveRunning> {
        match store.set_active(&self.key, &self.inactive) {
            Ok(()) => Ok(self.transition()),
            Err(source) => {
                let err = RollingError::PersistenceInconsistency {
                    group: self.key.to_string(),
                    color: self.inactive.to_string(),
                    path: store.path_for(&self.key),
                    source,
                };
                Err((self, err))
            }
        }
    }

    /// Best-effort stop of the new instance before the pointer moved.
    pub async fn abort(self, ops: &dyn SupervisorOps, stop_policy: &StopPolicy) -> Option<String> {
        stop_instance(ops, &self.inactive_name, stop_policy).await
    }
}

// =============================================================================
// Switched
// =============================================================================

impl Swap<Switched> {
    /// Stop the previously active instance. A failure here is only a warning:
    /// the new color is already recorded as active.
    pub async fn stop_previous(
        self,
        ops: &dyn SupervisorOps,
        stop_policy: &StopPolicy,
    ) -> (Swap<Completed>, Option<String>) {
        let warning = stop_instance(ops, &self.active_name, stop_policy).await;
        (self.transition(), warning)
    }
}

// =============================================================================
// Completed
// =============================================================================

impl Swap<Completed> {
    /// Color that is now active.
    pub fn finish(self) -> Color {
        self.inactive
    }
}

async fn stop_instance(
    ops: &dyn SupervisorOps,
    name: &str,
    stop_policy: &StopPolicy,
) -> Option<String> {
    let current = match ops.get_process(name).await {
        Ok(p) => p,
        Err(SupervisorError::NotFound(_)) => return None,
        Err(e) => return Some(format!("could not stop {name}: {e}")),
    };

    let policy = stop_policy.clone().with_wait(true);
    match GracefulStopper::new(ops, &policy).stop_process(&current).await {
        Ok(result) if result.status != Status::Failed => None,
        Ok(result) => Some(format!(
            "could not stop {name}: {}",
            result.detail.unwrap_or_default()
        )),
        Err(e) => Some(format!("could not stop {name}: {e}")),
    }
}
