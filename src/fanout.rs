// ABOUTME: Bounded concurrent fan-out of one operation across service domains.
// ABOUTME: Each domain runs as its own task; failures and panics are captured per domain.

use futures::FutureExt;
use snafu::Snafu;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc};

use crate::discovery::ServiceDomain;
use crate::report::FailureKind;
use crate::rolling::RollingError;
use crate::supervisor::SupervisorError;

/// Error that ends the work for a single domain.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DomainError {
    #[snafu(display("cannot reach domain: {source}"))]
    Connect { source: SupervisorError },

    #[snafu(display("{source}"))]
    Supervisor { source: SupervisorError },

    #[snafu(display("{source}"))]
    Rolling { source: RollingError },

    #[snafu(display("domain task panicked: {message}"))]
    Panicked { message: String },
}

impl DomainError {
    /// Returns the failure kind for reporting.
    pub fn kind(&self) -> FailureKind {
        match self {
            DomainError::Connect { .. } => FailureKind::Connection,
            DomainError::Supervisor { source } => source.kind().into(),
            DomainError::Rolling { source } => source.kind(),
            DomainError::Panicked { .. } => FailureKind::Panicked,
        }
    }
}

impl From<SupervisorError> for DomainError {
    fn from(source: SupervisorError) -> Self {
        DomainError::Supervisor { source }
    }
}

impl From<RollingError> for DomainError {
    fn from(source: RollingError) -> Self {
        DomainError::Rolling { source }
    }
}

/// Result for one domain, in completion order.
#[derive(Debug)]
pub struct DomainOutcome<T> {
    pub domain: ServiceDomain,
    pub result: Result<T, DomainError>,
}

/// Runs an operation on many domains with at most `cap` in flight.
#[derive(Debug, Clone, Copy)]
pub struct FanOutExecutor {
    cap: usize,
}

impl FanOutExecutor {
    pub fn new(cap: usize) -> Self {
        Self { cap: cap.max(1) }
    }

    /// Cap sized to the number of available CPUs.
    pub fn with_available_parallelism() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(cpus)
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Parallelism used for `domain_count` domains.
    pub fn parallelism(&self, domain_count: usize) -> usize {
        domain_count.min(self.cap).max(1)
    }

    /// Run `op` once per domain and collect every outcome.
    ///
    /// Tasks are detached: if the caller stops awaiting, already-submitted
    /// domains still run to completion.
    pub async fn run<T, F, Fut>(&self, domains: &[ServiceDomain], op: F) -> Vec<DomainOutcome<T>>
    where
        T: Send + 'static,
        F: Fn(ServiceDomain) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, DomainError>> + Send + 'static,
    {
        if domains.is_empty() {
            return Vec::new();
        }

        let permits = Arc::new(Semaphore::new(self.parallelism(domains.len())));
        let op = Arc::new(op);
        let (tx, mut rx) = mpsc::channel(domains.len());

        tracing::debug!(
            domains = domains.len(),
            parallelism = self.parallelism(domains.len()),
            "fanning out"
        );

        for domain in domains.iter().cloned() {
            let permits = Arc::clone(&permits);
            let op = Arc::clone(&op);
            let tx = tx.clone();

            tokio::spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => {
                        match AssertUnwindSafe(op(domain.clone())).catch_unwind().await {
                            Ok(result) => result,
                            Err(payload) => Err(DomainError::Panicked {
                                message: panic_message(payload),
                            }),
                        }
                    }
                    Err(_) => Err(DomainError::Panicked {
                        message: "worker pool closed".to_string(),
                    }),
                };

                if let Err(e) = &result {
                    tracing::error!(domain = %domain.name, "domain failed: {}", e);
                }
                let _ = tx.send(DomainOutcome { domain, result }).await;
            });
        }
        drop(tx);

        let mut outcomes = Vec::with_capacity(domains.len());
        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }
        outcomes
    }
}

impl Default for FanOutExecutor {
    fn default() -> Self {
        Self::with_available_parallelism()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
