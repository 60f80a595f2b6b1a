// ABOUTME: Stop, start, and restart workflows.
// ABOUTME: Each runs per domain under the fan-out and returns an aggregate report.

use std::sync::Arc;
use std::time::Duration;

use crate::diagnostics::Warning;
use crate::discovery::ServiceDomain;
use crate::fanout::DomainError;
use crate::process_state::DomainSnapshot;
use crate::report::{Action, AggregateReport, FailureKind, OperationResult};
use crate::rolling::GroupRestart;
use crate::starter::{start_named, stop_then_start};
use crate::stopper::GracefulStopper;
use crate::supervisor::SupervisorOps;
use crate::types::Color;

use super::plan::plan_start;
use super::{DomainRun, Orchestrator, Shared, finish};

impl Orchestrator {
    /// Stop the named processes, or everything, in each domain.
    pub async fn stop(
        &self,
        domains: &[ServiceDomain],
        processes: Option<Vec<String>>,
        wait: bool,
        force_kill_timeout: Option<Duration>,
    ) -> AggregateReport {
        let processes = Arc::new(processes);
        let (report, diagnostics) = self
            .run_domains("stop", domains, move |shared, domain| {
                let processes = Arc::clone(&processes);
                async move {
                    let ops = shared.connect(&domain).await?;
                    let snapshot = shared.states.snapshot(ops.as_ref()).await?;
                    let policy = shared
                        .stop_policy
                        .clone()
                        .with_wait(wait)
                        .with_force_kill_timeout(
                            force_kill_timeout.or(shared.stop_policy.force_kill_timeout),
                        );
                    let stopper = GracefulStopper::new(ops.as_ref(), &policy);

                    let batch = match processes.as_deref() {
                        Some(names) => stopper.stop_named(&snapshot, names).await,
                        None => stopper.stop_all(&snapshot).await,
                    };

                    let mut run = DomainRun::default();
                    run.report.absorb(batch);
                    Ok(run)
                }
            })
            .await;
        finish(report, diagnostics)
    }

    /// Start the named processes, or whatever the start planner selects.
    pub async fn start(
        &self,
        domains: &[ServiceDomain],
        processes: Option<Vec<String>>,
        state: Option<Color>,
    ) -> AggregateReport {
        let processes = Arc::new(processes);
        let (report, diagnostics) = self
            .run_domains("start", domains, move |shared, domain| {
                let processes = Arc::clone(&processes);
                let state = state.clone();
                async move {
                    let ops = shared.connect(&domain).await?;
                    let snapshot = shared.states.snapshot(ops.as_ref()).await?;
                    let mut run = DomainRun::default();
                    start_planned(
                        &shared,
                        ops.as_ref(),
                        &snapshot,
                        processes.as_deref(),
                        state.as_ref(),
                        &mut run,
                    )
                    .await;
                    Ok(run)
                }
            })
            .await;
        finish(report, diagnostics)
    }

    /// Restart every process in each domain.
    ///
    /// With `wait_workers` each domain is stopped in full and then started
    /// through the start planner. Otherwise complete worker pairs are
    /// swapped color by color and everything else is stopped and started
    /// in place, always waiting on the stop.
    pub async fn restart(
        &self,
        domains: &[ServiceDomain],
        wait: bool,
        wait_workers: bool,
        force_kill_timeout: Option<Duration>,
    ) -> AggregateReport {
        let (report, diagnostics) = self
            .run_domains("restart", domains, move |shared, domain| async move {
                if wait_workers {
                    standard_restart(&shared, &domain, wait, force_kill_timeout).await
                } else {
                    rolling_restart(&shared, &domain, force_kill_timeout).await
                }
            })
            .await;
        finish(report, diagnostics)
    }
}

async fn start_planned(
    shared: &Shared,
    ops: &dyn SupervisorOps,
    snapshot: &DomainSnapshot,
    processes: Option<&[String]>,
    state: Option<&Color>,
    run: &mut DomainRun,
) {
    let plan = plan_start(snapshot, &shared.states, &shared.store, processes, state);

    run.report.extend(plan.unknown.iter().map(|name| {
        OperationResult::failed(name, Action::Start, FailureKind::NotFound, "no such process")
    }));
    run.report.absorb(start_named(ops, &plan.names, true).await);
}

/// Stop all, then start what the planner selects. A failed stop skips the start.
pub(super) async fn standard_restart(
    shared: &Shared,
    domain: &ServiceDomain,
    wait: bool,
    force_kill_timeout: Option<Duration>,
) -> Result<DomainRun, DomainError> {
    let ops = shared.connect(domain).await?;
    let snapshot = shared.states.snapshot(ops.as_ref()).await?;
    let policy = shared
        .stop_policy
        .clone()
        .with_wait(wait)
        .with_force_kill_timeout(force_kill_timeout.or(shared.stop_policy.force_kill_timeout));

    let mut run = DomainRun::default();
    let stopped = GracefulStopper::new(ops.as_ref(), &policy)
        .stop_all(&snapshot)
        .await;
    let clean = stopped.all_succeeded();
    run.report.absorb(stopped);

    if !clean {
        tracing::error!(domain = %domain.name, "stop phase failed, not starting");
        return Ok(run);
    }

    start_planned(shared, ops.as_ref(), &snapshot, None, None, &mut run).await;
    Ok(run)
}

async fn rolling_restart(
    shared: &Shared,
    domain: &ServiceDomain,
    force_kill_timeout: Option<Duration>,
) -> Result<DomainRun, DomainError> {
    let ops = shared.connect(domain).await?;
    let snapshot = shared.states.snapshot(ops.as_ref()).await?;
    let name = domain.name.as_str();
    let mut run = DomainRun::default();

    for pair in snapshot.groups().pairs() {
        match shared
            .rolling
            .restart_group(ops.as_ref(), &snapshot, &pair)
            .await
        {
            GroupRestart::Swapped(record) => {
                for w in &record.warnings {
                    run.diagnostics.warn(Warning::previous_instance(name, w.clone()));
                }
                run.report.swaps.push(record);
            }
            GroupRestart::Fallback(batch) => {
                run.report.absorb(batch);
                if run.report.error.is_some() {
                    return Ok(run);
                }
            }
        }
    }

    for ambiguous in snapshot.groups().ambiguous() {
        run.diagnostics.warn(Warning::ambiguous_name(name, ambiguous));
    }

    let in_place: Vec<String> = snapshot
        .processes()
        .iter()
        .filter(|p| !snapshot.is_rolling_member(p))
        .map(|p| p.api_name())
        .collect();

    let policy = shared
        .stop_policy
        .clone()
        .with_force_kill_timeout(force_kill_timeout.or(shared.stop_policy.force_kill_timeout));
    run.report
        .absorb(stop_then_start(ops.as_ref(), &snapshot, &in_place, &policy).await);

    Ok(run)
}
