// ABOUTME: Errors raised while swapping a rolling pair.
// ABOUTME: PersistenceInconsistency is kept apart from transient failures.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::report::FailureKind;
use crate::supervisor::{ProcessState, SupervisorError};

#[derive(Debug, Error)]
pub enum RollingError {
    #[error("a swap for {0} is already in progress")]
    SwapInFlight(String),

    #[error("{group} is missing its {missing} instance")]
    IncompletePair { group: String, missing: String },

    #[error("failed to start {process}: {source}")]
    StartFailed {
        process: String,
        source: SupervisorError,
    },

    #[error("{process} entered {state} instead of RUNNING")]
    NotRunning {
        process: String,
        state: ProcessState,
    },

    #[error("{process} did not reach RUNNING within {timeout:?}")]
    Timeout { process: String, timeout: Duration },

    #[error("lost contact while waiting for {process}: {source}")]
    Supervisor {
        process: String,
        source: SupervisorError,
    },

    #[error(
        "{group}: {color} is running but the active color could not be saved to {}: {source}",
        .path.display()
    )]
    PersistenceInconsistency {
        group: String,
        color: String,
        path: PathBuf,
        source: std::io::Error,
    },
}

impl RollingError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RollingError::SwapInFlight(_) | RollingError::IncompletePair { .. } => {
                FailureKind::OperationFailed
            }
            RollingError::StartFailed { source, .. } | RollingError::Supervisor { source, .. } => {
                source.kind().into()
            }
            RollingError::NotRunning { .. } => FailureKind::OperationFailed,
            RollingError::Timeout { .. } => FailureKind::Timeout,
            RollingError::PersistenceInconsistency { .. } => FailureKind::PersistenceInconsistency,
        }
    }
}
