// ABOUTME: Graceful restart: suspend job admission, drain, restart, then undo.
// ABOUTME: Resume and every site-config restore run on all exit paths, each independently.

use std::path::Path;
use std::time::Duration;

use crate::cleanup::{CleanupStack, DeferredCleanup};
use crate::diagnostics::{Diagnostics, Warning};
use crate::discovery::ServiceDomain;
use crate::drain::{JobDrainCoordinator, SiteConfigToggle};
use crate::error::{Error, Result};
use crate::process_state::DomainSnapshot;
use crate::report::AggregateReport;
use crate::supervisor::{Signal, SupervisorOps};

use super::workflows::standard_restart;
use super::{DomainRun, Orchestrator, finish};

const OPERATION: &str = "graceful-restart";

#[derive(Debug, Clone, Default)]
pub struct GracefulRestartOptions {
    /// Set the shared suspension flag before restarting.
    pub suspend: bool,
    /// Wait for consumers to drain. Implies `suspend`.
    pub wait_jobs: bool,
    /// Put the site into maintenance mode and pause its scheduler.
    pub pause_upstream: bool,
    pub timeout: Option<Duration>,
    pub poll_interval: Option<Duration>,
    /// Passed to the stop calls of the restart.
    pub wait: bool,
}

impl Orchestrator {
    /// Run the graceful restart workflow until it finishes or Ctrl-C arrives.
    ///
    /// Fails before touching anything when a requested step has no backing
    /// store configured. Any later failure aborts the workflow and is
    /// recorded in the report's `aborted` field.
    pub async fn graceful_restart(
        &self,
        domains: &[ServiceDomain],
        opts: GracefulRestartOptions,
    ) -> Result<AggregateReport> {
        self.graceful_restart_until(domains, opts, interrupted()).await
    }

    /// Same as [`Orchestrator::graceful_restart`], stopped early when
    /// `interrupt` completes. An interrupt aborts the remaining steps; resume
    /// and the site-config restores still run.
    pub async fn graceful_restart_until<F>(
        &self,
        domains: &[ServiceDomain],
        opts: GracefulRestartOptions,
        interrupt: F,
    ) -> Result<AggregateReport>
    where
        F: Future<Output = ()>,
    {
        let drain = if opts.suspend || opts.wait_jobs {
            Some(self.drain.clone().ok_or(Error::DrainNotConfigured)?)
        } else {
            None
        };
        let site = if opts.pause_upstream {
            Some(
                self.site_config
                    .clone()
                    .ok_or(Error::SiteConfigNotConfigured)?,
            )
        } else {
            None
        };

        let mut diagnostics = Diagnostics::default();
        let mut cleanup = DeferredCleanup::new();

        let outcome = tokio::select! {
            outcome = self.graceful_steps(
                domains,
                &opts,
                drain.as_ref(),
                site.as_deref(),
                cleanup.stack_mut(),
                &mut diagnostics,
            ) => outcome,
            () = interrupt => {
                tracing::warn!("graceful restart interrupted, undoing completed steps");
                Err("interrupted".to_string())
            }
        };

        let registered = cleanup.len();
        let succeeded = cleanup.run(&mut diagnostics).await;
        tracing::debug!(registered, succeeded, "graceful restart cleanup finished");

        let report = match outcome {
            Ok(report) => report,
            Err(reason) => {
                tracing::error!("graceful restart aborted: {}", reason);
                let mut report = AggregateReport::new(OPERATION);
                report.aborted = Some(reason);
                report
            }
        };
        Ok(finish(report, diagnostics))
    }

    async fn graceful_steps(
        &self,
        domains: &[ServiceDomain],
        opts: &GracefulRestartOptions,
        drain: Option<&JobDrainCoordinator>,
        site: Option<&Path>,
        cleanup: &mut CleanupStack<'static>,
        diagnostics: &mut Diagnostics,
    ) -> std::result::Result<AggregateReport, String> {
        // Step 1: suspend admission and signal workers
        if let Some(drain) = drain {
            let coordinator = drain.clone();
            cleanup.push("resume job admission", move || async move {
                coordinator.resume().await.map(|_| ())
            });

            if !drain.suspend().await {
                return Err("could not set the suspension flag".to_string());
            }
            match drain.verify().await {
                Ok(true) => {}
                Ok(false) => return Err("suspension flag is not set after suspend".to_string()),
                Err(e) => return Err(format!("cannot verify suspension flag: {e}")),
            }
        }

        self.signal_workers(domains, diagnostics).await;

        if let Some(path) = site {
            for toggle in SiteConfigToggle::pause_upstream(path) {
                match toggle.apply().await {
                    Ok(applied) => {
                        cleanup.push(format!("restore {}", applied.key()), move || async move {
                            applied.restore().await
                        });
                    }
                    Err(e) => return Err(format!("cannot set {}: {e}", toggle.key())),
                }
            }
        }

        // Step 2: wait for in-flight jobs
        if opts.wait_jobs
            && let Some(drain) = drain
        {
            let timeout = opts.timeout.unwrap_or(self.drain_policy.timeout);
            let poll = opts.poll_interval.unwrap_or(self.drain_policy.poll_interval);
            if !drain.wait_drained(timeout, poll).await {
                return Err(format!("jobs did not drain within {timeout:?}"));
            }
        }

        // Step 3: restart every domain
        let wait = opts.wait;
        let (report, restart_diagnostics) = self
            .run_domains(OPERATION, domains, move |shared, domain| async move {
                standard_restart(&shared, &domain, wait, None).await
            })
            .await;
        diagnostics.merge(restart_diagnostics);
        Ok(report)
    }

    /// Send the graceful signal to every worker that is not stopped. Failures are warnings.
    async fn signal_workers(&self, domains: &[ServiceDomain], diagnostics: &mut Diagnostics) {
        let (report, signal_diagnostics) = self
            .run_domains("signal", domains, move |shared, domain| async move {
                let ops = shared.connect(&domain).await?;
                let snapshot = shared.states.snapshot(ops.as_ref()).await?;
                let mut run = DomainRun::default();
                signal_live_workers(
                    ops.as_ref(),
                    &snapshot,
                    &shared.graceful_signal,
                    domain.name.as_str(),
                    &mut run,
                )
                .await;
                Ok(run)
            })
            .await;

        diagnostics.merge(signal_diagnostics);
        for (domain, result) in &report.domains {
            if let Some(error) = &result.error {
                diagnostics.warn(Warning::worker_signal(
                    domain,
                    format!("workers not signalled: {}", error.message),
                ));
            }
        }
    }
}

async fn signal_live_workers(
    ops: &dyn SupervisorOps,
    snapshot: &DomainSnapshot,
    signal: &Signal,
    domain: &str,
    run: &mut DomainRun,
) {
    let live: Vec<String> = snapshot
        .workers()
        .filter(|p| !p.state.is_stopped())
        .map(|p| p.api_name())
        .collect();

    for name in live {
        match ops.signal_process(&name, signal).await {
            Ok(()) => tracing::info!(domain, process = %name, %signal, "signalled worker"),
            Err(e) => run.diagnostics.warn(Warning::worker_signal(
                domain,
                format!("cannot signal {name}: {e}"),
            )),
        }
    }
}

/// Completes on Ctrl-C. If the handler cannot be installed, never completes.
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
