// ABOUTME: Escalating graceful stop for processes in one domain.
// ABOUTME: Request stop, optionally poll until stopped, then kill and re-check once.

use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::process_state::DomainSnapshot;
use crate::report::{Action, Batch, FailureKind, OperationResult};
use crate::supervisor::{
    BulkStatus, ErrorKind, FaultCode, ProcessDescriptor, Signal, SupervisorError, SupervisorOps,
    classify,
};

/// How a stop is enforced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopPolicy {
    /// Passed through to the endpoint's own stop call.
    pub wait: bool,
    /// When set, poll for a stopped state for this long, then kill.
    pub force_kill_timeout: Option<Duration>,
    pub poll_interval: Duration,
    pub kill_signal: Signal,
    pub kill_settle: Duration,
}

impl Default for StopPolicy {
    fn default() -> Self {
        Self {
            wait: true,
            force_kill_timeout: None,
            poll_interval: Duration::from_millis(500),
            kill_signal: Signal::kill(),
            kill_settle: Duration::from_secs(1),
        }
    }
}

impl StopPolicy {
    pub fn with_wait(mut self, wait: bool) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_force_kill_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.force_kill_timeout = timeout;
        self
    }
}

pub struct GracefulStopper<'a> {
    ops: &'a dyn SupervisorOps,
    policy: &'a StopPolicy,
}

impl<'a> GracefulStopper<'a> {
    pub fn new(ops: &'a dyn SupervisorOps, policy: &'a StopPolicy) -> Self {
        Self { ops, policy }
    }

    /// Stop one process. Only connection errors are returned as `Err`;
    /// everything else becomes a per-process result.
    pub async fn stop_process(
        &self,
        process: &ProcessDescriptor,
    ) -> Result<OperationResult, SupervisorError> {
        let name = process.api_name();

        if process.state.is_stopped() {
            return Ok(OperationResult::already(
                &name,
                Action::Stop,
                format!("already {}", process.state),
            ));
        }

        tracing::debug!(process = %name, wait = self.policy.wait, "stopping process");
        match self.ops.stop_process(&name, self.policy.wait).await {
            Ok(()) => {}
            Err(e) if is_gone(&e) => {
                return Ok(OperationResult::already(&name, Action::Stop, e.to_string()));
            }
            Err(e) if e.is_connection() => return Err(e),
            Err(e) => {
                return Ok(OperationResult::failed(
                    &name,
                    Action::Stop,
                    e.kind().into(),
                    e.to_string(),
                ));
            }
        }

        let Some(limit) = self.policy.force_kill_timeout else {
            return Ok(OperationResult::succeeded(&name, Action::Stop));
        };

        if self.wait_stopped(&name, limit).await? {
            return Ok(OperationResult::succeeded(&name, Action::Stop));
        }

        tracing::warn!(process = %name, timeout = ?limit, "process did not stop in time, killing");
        self.kill(&name).await
    }

    /// Stop the named processes sequentially.
    pub async fn stop_named(&self, snapshot: &DomainSnapshot, names: &[String]) -> Batch {
        let mut batch = Batch::default();

        for name in names {
            let Some(process) = snapshot.find(name) else {
                batch.results.push(OperationResult::already(
                    name,
                    Action::Stop,
                    "no such process",
                ));
                continue;
            };

            match self.stop_process(process).await {
                Ok(result) => batch.results.push(result),
                Err(e) => {
                    tracing::error!(process = %name, "aborting remaining stops: {}", e);
                    batch.aborted = Some(e);
                    break;
                }
            }
        }

        batch
    }

    /// Stop every process with the endpoint's bulk call, then enforce the
    /// force-kill timeout over the bulk process listing.
    pub async fn stop_all(&self, snapshot: &DomainSnapshot) -> Batch {
        let mut batch = Batch::default();

        let mut targets: Vec<String> = Vec::new();
        for process in snapshot.processes() {
            if process.state.is_stopped() {
                batch.results.push(OperationResult::already(
                    process.api_name(),
                    Action::Stop,
                    format!("already {}", process.state),
                ));
            } else {
                targets.push(process.api_name());
            }
        }

        if targets.is_empty() {
            return batch;
        }

        let statuses = match self.ops.stop_all(self.policy.wait).await {
            Ok(statuses) => statuses,
            Err(e) if e.is_connection() => {
                batch.aborted = Some(e);
                return batch;
            }
            Err(e) => {
                batch.results.extend(targets.iter().map(|name| {
                    OperationResult::failed(name, Action::Stop, e.kind().into(), e.to_string())
                }));
                return batch;
            }
        };

        let mut pending: Vec<String> = Vec::new();
        let by_name: BTreeMap<String, &BulkStatus> =
            statuses.iter().map(|s| (s.api_name(), s)).collect();

        for name in targets {
            match by_name.get(&name) {
                Some(status) => match bulk_failure(status) {
                    None => pending.push(name),
                    Some(kind) if matches!(kind, ErrorKind::NotRunning | ErrorKind::NotFound) => {
                        batch.results.push(OperationResult::already(
                            &name,
                            Action::Stop,
                            status.description.clone(),
                        ));
                    }
                    Some(kind) => batch.results.push(OperationResult::failed(
                        &name,
                        Action::Stop,
                        kind.into(),
                        status.description.clone(),
                    )),
                },
                // Not acted on by the bulk call; it stopped on its own since the snapshot.
                None => pending.push(name),
            }
        }

        let Some(limit) = self.policy.force_kill_timeout else {
            batch.results.extend(
                pending
                    .iter()
                    .map(|name| OperationResult::succeeded(name, Action::Stop)),
            );
            return batch;
        };

        let still_running = match self.wait_all_stopped(&pending, limit).await {
            Ok(still) => still,
            Err(e) => {
                batch.aborted = Some(e);
                return batch;
            }
        };

        for name in &pending {
            if !still_running.contains(name) {
                batch
                    .results
                    .push(OperationResult::succeeded(name, Action::Stop));
            }
        }

        for name in &still_running {
            tracing::warn!(process = %name, timeout = ?limit, "process did not stop in time, killing");
            match self.kill(name).await {
                Ok(result) => batch.results.push(result),
                Err(e) => {
                    batch.aborted = Some(e);
                    break;
                }
            }
        }

        batch
    }

    /// Poll one process until it is terminal-stopped or `limit` elapses.
    async fn wait_stopped(&self, name: &str, limit: Duration) -> Result<bool, SupervisorError> {
        let deadline = Instant::now() + limit;
        loop {
            match self.ops.get_process(name).await {
                Ok(p) if p.state.is_stopped() => return Ok(true),
                Ok(p) => tracing::debug!(process = %name, state = %p.state, "waiting for stop"),
                Err(SupervisorError::NotFound(_)) => return Ok(true),
                Err(e) if e.is_connection() => return Err(e),
                Err(e) => tracing::debug!(process = %name, "state poll failed: {}", e),
            }

            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(self.policy.poll_interval).await;
        }
    }

    /// Poll the bulk listing until every name is stopped. Returns the names
    /// still running when `limit` elapsed.
    async fn wait_all_stopped(
        &self,
        names: &[String],
        limit: Duration,
    ) -> Result<Vec<String>, SupervisorError> {
        let deadline = Instant::now() + limit;
        loop {
            let listing = match self.ops.list_processes().await {
                Ok(listing) => listing,
                Err(e) if e.is_connection() => return Err(e),
                Err(e) => {
                    tracing::debug!("process listing failed: {}", e);
                    if Instant::now() >= deadline {
                        return Ok(names.to_vec());
                    }
                    tokio::time::sleep(self.policy.poll_interval).await;
                    continue;
                }
            };

            let running: Vec<String> = names
                .iter()
                .filter(|name| {
                    listing
                        .iter()
                        .any(|p| &p.api_name() == *name && !p.state.is_stopped())
                })
                .cloned()
                .collect();

            if running.is_empty() || Instant::now() >= deadline {
                return Ok(running);
            }
            tokio::time::sleep(self.policy.poll_interval).await;
        }
    }

    /// Kill, let the process settle, and check its state once.
    async fn kill(&self, name: &str) -> Result<OperationResult, SupervisorError> {
        match self
            .ops
            .signal_process(name, &self.policy.kill_signal)
            .await
        {
            Ok(()) => {}
            Err(e) if is_gone(&e) => {
                return Ok(OperationResult::succeeded(name, Action::Stop)
                    .with_detail("exited before kill"));
            }
            Err(e) if e.is_connection() => return Err(e),
            Err(e) => {
                return Ok(OperationResult::failed(
                    name,
                    Action::Stop,
                    e.kind().into(),
                    format!("kill failed: {e}"),
                ));
            }
        }

        tokio::time::sleep(self.policy.kill_settle).await;

        match self.ops.get_process(name).await {
            Ok(p) if p.state.is_stopped() => {
                Ok(OperationResult::succeeded(name, Action::Stop).with_detail("killed"))
            }
            Ok(p) => Ok(OperationResult::failed(
                name,
                Action::Stop,
                FailureKind::Timeout,
                format!("still {} after {}", p.state, self.policy.kill_signal),
            )),
            Err(SupervisorError::NotFound(_)) => {
                Ok(OperationResult::succeeded(name, Action::Stop).with_detail("killed"))
            }
            Err(e) if e.is_connection() => Err(e),
            Err(e) => Ok(OperationResult::failed(
                name,
                Action::Stop,
                FailureKind::Timeout,
                format!("state unknown after kill: {e}"),
            )),
        }
    }
}

fn is_gone(e: &SupervisorError) -> bool {
    matches!(
        e,
        SupervisorError::NotRunning(_) | SupervisorError::NotFound(_)
    )
}

/// Error kind carried by a bulk status entry, `None` for success.
fn bulk_failure(status: &BulkStatus) -> Option<ErrorKind> {
    if status.status == FaultCode::Success.code() {
        None
    } else {
        Some(classify(status.status))
    }
}
