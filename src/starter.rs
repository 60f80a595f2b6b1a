// ABOUTME: Start semantics shared by the start planner and restart paths.
// ABOUTME: An already-running process is reported as such, never as an error.

use crate::process_state::DomainSnapshot;
use crate::report::{Action, Batch, OperationResult};
use crate::stopper::{GracefulStopper, StopPolicy};
use crate::supervisor::{SupervisorError, SupervisorOps};

/// Start one process. Only connection errors are returned as `Err`.
pub async fn start_process(
    ops: &dyn SupervisorOps,
    name: &str,
    wait: bool,
) -> Result<OperationResult, SupervisorError> {
    tracing::debug!(process = %name, wait, "starting process");
    match ops.start_process(name, wait).await {
        Ok(()) => Ok(OperationResult::succeeded(name, Action::Start)),
        Err(SupervisorError::AlreadyStarted(_)) => Ok(OperationResult::already(
            name,
            Action::Start,
            "already running",
        )),
        Err(e) if e.is_connection() => Err(e),
        Err(e) => Ok(OperationResult::failed(
            name,
            Action::Start,
            e.kind().into(),
            e.to_string(),
        )),
    }
}

/// Start each name in order, stopping at the first connection error.
pub async fn start_named(ops: &dyn SupervisorOps, names: &[String], wait: bool) -> Batch {
    let mut batch = Batch::default();
    for name in names {
        match start_process(ops, name, wait).await {
            Ok(result) => batch.results.push(result),
            Err(e) => {
                tracing::error!(process = %name, "aborting remaining starts: {}", e);
                batch.aborted = Some(e);
                break;
            }
        }
    }
    batch
}

/// Standard path for individual processes: stop each one with a forced
/// wait, then start the ones that stopped cleanly.
pub async fn stop_then_start(
    ops: &dyn SupervisorOps,
    snapshot: &DomainSnapshot,
    names: &[String],
    stop_policy: &StopPolicy,
) -> Batch {
    let forced = stop_policy.clone().with_wait(true);
    let stopper = GracefulStopper::new(ops, &forced);

    let mut batch = stopper.stop_named(snapshot, names).await;
    if batch.aborted.is_some() {
        return batch;
    }

    let restartable: Vec<String> = batch
        .results
        .iter()
        .filter(|r| !r.is_failure())
        .filter(|r| snapshot.find(&r.process).is_some())
        .map(|r| r.process.clone())
        .collect();

    let started = start_named(ops, &restartable, true).await;
    batch.merge(started);
    batch
}
