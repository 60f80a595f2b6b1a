// ABOUTME: Composes stop, start, restart, and graceful-restart across domains.
// ABOUTME: Per-domain work fans out; drain and toggles wrap the whole batch.

mod graceful;
mod plan;
mod workflows;

pub use graceful::GracefulRestartOptions;
pub use plan::{StartPlan, plan_start};

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::discovery::ServiceDomain;
use crate::drain::{FileSuspensionStore, JobDrainCoordinator};
use crate::error::{Error, Result};
use crate::fanout::{DomainError, DomainOutcome, FanOutExecutor};
use crate::process_state::ProcessStateStore;
use crate::report::{AggregateReport, DomainReport};
use crate::rolling::{ActiveColorStore, RollingDeploymentController, SingleFlight};
use crate::stopper::StopPolicy;
use crate::supervisor::{Connector, ProcessDescriptor, Signal, SupervisorOps};

/// Bounds for waiting on consumers to drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

/// State shared by every per-domain task of one invocation.
pub(crate) struct Shared {
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) states: ProcessStateStore,
    pub(crate) rolling: RollingDeploymentController,
    pub(crate) store: Arc<ActiveColorStore>,
    pub(crate) stop_policy: StopPolicy,
    pub(crate) graceful_signal: Signal,
}

/// Work done in one domain: its report plus the warnings it raised.
#[derive(Debug, Default)]
pub(crate) struct DomainRun {
    pub(crate) report: DomainReport,
    pub(crate) diagnostics: Diagnostics,
}

pub struct Orchestrator {
    shared: Arc<Shared>,
    fanout: FanOutExecutor,
    drain: Option<JobDrainCoordinator>,
    drain_policy: DrainPolicy,
    site_config: Option<PathBuf>,
}

impl Orchestrator {
    pub fn new(config: &Config, connector: Arc<dyn Connector>) -> Self {
        let store = Arc::new(ActiveColorStore::new(
            config.state_dir(),
            config.rolling.colors.clone(),
        ));
        let stop_policy = config.stop.policy(true, None);
        let rolling = RollingDeploymentController::new(
            Arc::clone(&store),
            Arc::new(SingleFlight::new()),
            config.rolling.policy(),
            stop_policy.clone(),
        );

        let drain = config.drain.store_dir.as_ref().map(|dir| {
            JobDrainCoordinator::new(
                Arc::new(FileSuspensionStore::new(dir)),
                config.drain.suspension_key.clone(),
                config.drain.nudge_idle,
            )
        });

        Self {
            shared: Arc::new(Shared {
                connector,
                states: config.process_state_store(),
                rolling,
                store,
                stop_policy,
                graceful_signal: config.workers.graceful_signal.clone(),
            }),
            fanout: config.fanout(),
            drain,
            drain_policy: DrainPolicy {
                timeout: config.drain.timeout,
                poll_interval: config.drain.poll_interval,
            },
            site_config: config.site.config_path.clone(),
        }
    }

    /// Replace the drain coordinator built from config.
    pub fn with_drain(mut self, drain: JobDrainCoordinator) -> Self {
        self.drain = Some(drain);
        self
    }

    pub fn with_fanout(mut self, fanout: FanOutExecutor) -> Self {
        self.fanout = fanout;
        self
    }

    pub fn drain(&self) -> Option<&JobDrainCoordinator> {
        self.drain.as_ref()
    }

    pub fn active_colors(&self) -> &ActiveColorStore {
        &self.shared.store
    }

    /// Set the suspension flag outside a workflow. Returns whether it reads back as set.
    pub async fn suspend(&self) -> Result<bool> {
        let drain = self.drain.as_ref().ok_or(Error::DrainNotConfigured)?;
        if !drain.suspend().await {
            return Ok(false);
        }
        Ok(drain.verify().await?)
    }

    /// Clear the suspension flag. Returns whether it was set.
    pub async fn resume(&self) -> Result<bool> {
        let drain = self.drain.as_ref().ok_or(Error::DrainNotConfigured)?;
        Ok(drain.resume().await?)
    }

    /// Process listing per domain; unreachable domains carry their error.
    pub async fn status(
        &self,
        domains: &[ServiceDomain],
    ) -> Vec<DomainOutcome<Vec<ProcessDescriptor>>> {
        let shared = Arc::clone(&self.shared);
        let mut outcomes = self
            .fanout
            .run(domains, move |domain| {
                let shared = Arc::clone(&shared);
                async move {
                    let ops = shared.connect(&domain).await?;
                    Ok(ops.list_processes().await?)
                }
            })
            .await;
        outcomes.sort_by(|a, b| a.domain.cmp(&b.domain));
        outcomes
    }

    /// Fan `op` out and fold every domain into one report.
    async fn run_domains<F, Fut>(
        &self,
        operation: &str,
        domains: &[ServiceDomain],
        op: F,
    ) -> (AggregateReport, Diagnostics)
    where
        F: Fn(Arc<Shared>, ServiceDomain) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<DomainRun, DomainError>> + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        let outcomes = self
            .fanout
            .run(domains, move |domain| op(Arc::clone(&shared), domain))
            .await;

        let mut report = AggregateReport::new(operation);
        let mut diagnostics = Diagnostics::default();
        for outcome in outcomes {
            let name = outcome.domain.name.to_string();
            match outcome.result {
                Ok(run) => {
                    diagnostics.merge(run.diagnostics);
                    report.insert(name, run.report);
                }
                Err(e) => report.insert(name, DomainReport::failed(e.kind(), e.to_string())),
            }
        }
        (report, diagnostics)
    }
}

impl Shared {
    async fn connect(
        &self,
        domain: &ServiceDomain,
    ) -> std::result::Result<Arc<dyn SupervisorOps>, DomainError> {
        self.connector
            .connect(domain)
            .await
            .map_err(|source| DomainError::Connect { source })
    }
}

fn finish(mut report: AggregateReport, diagnostics: Diagnostics) -> AggregateReport {
    report.warnings.extend(diagnostics.messages());
    report
}
