// ABOUTME: Shared setup for commands that talk to supervisor domains.
// ABOUTME: Loads config, scans the socket directory, and builds the orchestrator.

use fleetvisor::config::Config;
use fleetvisor::discovery::{DomainRegistry, ServiceDomain};
use fleetvisor::error::{Error, Result};
use fleetvisor::orchestrator::Orchestrator;
use fleetvisor::output::Output;
use fleetvisor::report::AggregateReport;
use fleetvisor::supervisor::SocketConnector;
use std::path::Path;
use std::sync::Arc;

pub struct Context {
    pub config: Config,
    pub output: Output,
}

impl Context {
    /// Load the explicit config file, or discover one in `cwd`, or use defaults.
    pub fn load(explicit: Option<&Path>, cwd: &Path, output: Output) -> Result<Self> {
        let config = match explicit {
            Some(path) => Config::load(path)?,
            None => Config::discover_or_default(cwd)?,
        };
        Ok(Self {
            config: config.with_env_overrides(),
            output,
        })
    }

    /// Validate requested names against a fresh scan of the socket directory.
    pub fn domains(&self, requested: &[String]) -> Result<Vec<ServiceDomain>> {
        let registry = DomainRegistry::scan(&self.config.socket_dir)?;
        let domains = registry.select(requested)?;
        tracing::debug!(
            socket_dir = %registry.socket_dir().display(),
            selected = domains.len(),
            "domains selected"
        );
        Ok(domains)
    }

    pub fn orchestrator(&self) -> Orchestrator {
        let connector = SocketConnector::new(self.config.reachability());
        Orchestrator::new(&self.config, Arc::new(connector))
    }

    /// Print the report; any failure becomes the command's error.
    pub fn finish(&self, report: &AggregateReport) -> Result<()> {
        self.output.report(report);
        if report.is_success() {
            Ok(())
        } else {
            Err(Error::OperationFailed {
                operation: report.operation.clone(),
                failed: report.failed().max(usize::from(report.aborted.is_some())),
            })
        }
    }
}
