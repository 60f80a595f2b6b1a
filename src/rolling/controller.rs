// ABOUTME: Drives blue/green swaps for the rolling groups of one domain.
// ABOUTME: Complete pairs swap under a single-flight guard; incomplete pairs restart in place.

use std::sync::Arc;
use std::time::Duration;

use crate::process_state::{DomainSnapshot, RollingGroupKey, RollingPair};
use crate::report::Batch;
use crate::starter::stop_then_start;
use crate::stopper::StopPolicy;
use crate::supervisor::SupervisorOps;
use crate::types::Color;

use super::error::RollingError;
use super::flight::SingleFlight;
use super::record::{SwapPhase, SwapRecord};
use super::store::ActiveColorStore;
use super::swap::Swap;

/// Bounds for waiting on the new instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for RollingPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// What happened to one rolling group during a restart.
#[derive(Debug)]
pub enum GroupRestart {
    Swapped(SwapRecord),
    /// Only one color exists; it was stopped and started in place.
    Fallback(Batch),
}

#[derive(Debug, Clone)]
pub struct RollingDeploymentController {
    store: Arc<ActiveColorStore>,
    flights: Arc<SingleFlight<RollingGroupKey>>,
    policy: RollingPolicy,
    stop_policy: StopPolicy,
}

impl RollingDeploymentController {
    pub fn new(
        store: Arc<ActiveColorStore>,
        flights: Arc<SingleFlight<RollingGroupKey>>,
        policy: RollingPolicy,
        stop_policy: StopPolicy,
    ) -> Self {
        Self {
            store,
            flights,
            policy,
            stop_policy,
        }
    }

    pub fn store(&self) -> &ActiveColorStore {
        &self.store
    }

    pub fn active_color(&self, key: &RollingGroupKey) -> Color {
        self.store.active(key)
    }

    /// Restart one group: swap a complete pair, restart an incomplete one in place.
    pub async fn restart_group(
        &self,
        ops: &dyn SupervisorOps,
        snapshot: &DomainSnapshot,
        pair: &RollingPair,
    ) -> GroupRestart {
        if pair.is_complete(self.store.colors()) {
            return GroupRestart::Swapped(self.swap(ops, pair).await);
        }

        tracing::info!(group = %pair.key, "incomplete rolling pair, restarting in place");
        let names: Vec<String> = pair.members.values().cloned().collect();
        GroupRestart::Fallback(stop_then_start(ops, snapshot, &names, &self.stop_policy).await)
    }

    /// Run one swap for a complete pair.
    pub async fn swap(&self, ops: &dyn SupervisorOps, pair: &RollingPair) -> SwapRecord {
        let active = self.store.active(&pair.key);
        let colors = self.store.colors();
        let target = colors.other(&active).unwrap_or(colors.second()).clone();
        let record = SwapRecord::new(pair.key.clone(), active, target);

        let Some(_guard) = self.flights.try_acquire(pair.key.clone()) else {
            let err = RollingError::SwapInFlight(pair.key.to_string());
            return record.abort(SwapPhase::AbortedBeforeSwitch, &err);
        };

        let planned = match Swap::plan(pair, &self.store) {
            Ok(swap) => swap,
            Err(e) => return record.abort(SwapPhase::AbortedBeforeSwitch, &e),
        };

        // Starting
        let starting = match planned.start_inactive(ops).await {
            Ok(swap) => swap,
            Err((swap, e)) => {
                tracing::error!(group = %pair.key, "swap aborted: {}", e);
                let mut record = record.abort(SwapPhase::AbortedBeforeSwitch, &e);
                record.warnings.extend(swap.abort(ops, &self.stop_policy).await);
                return record;
            }
        };

        // Waiting for RUNNING
        let running = match starting
            .wait_running(ops, self.policy.timeout, self.policy.poll_interval)
            .await
        {
            Ok(swap) => swap,
            Err((swap, e)) => {
                tracing::error!(group = %pair.key, "swap aborted: {}", e);
                let mut record = record.abort(SwapPhase::AbortedBeforeSwitch, &e);
                record.warnings.extend(swap.abort(ops, &self.stop_policy).await);
                return record;
            }
        };

        // Switching the pointer
        let switched = match running.switch_pointer(&self.store) {
            Ok(swap) => swap,
            Err((_swap, e)) => {
                tracing::error!(group = %pair.key, "{}", e);
                return record.abort(SwapPhase::AbortedAfterSwitch, &e);
            }
        };

        // Stopping the previous instance
        let (completed, warning) = switched.stop_previous(ops, &self.stop_policy).await;
        let mut record = record;
        if let Some(w) = warning {
            tracing::warn!(group = %pair.key, "{}", w);
            record.warnings.push(w);
        }

        let now_active = completed.finish();
        tracing::info!(group = %pair.key, active = %now_active, "rolling swap complete");
        record.phase = SwapPhase::Done;
        record
    }
}
