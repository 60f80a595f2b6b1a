// ABOUTME: Structured outcomes for one command invocation.
// ABOUTME: Per-process results grouped by domain, with succeeded/already/failed counts.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::rolling::SwapRecord;
use crate::supervisor::{ErrorKind, SupervisorError};

/// Failure classification carried by every failed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Connection,
    NotFound,
    NotRunning,
    AlreadyStarted,
    InvalidArguments,
    OperationFailed,
    Timeout,
    PersistenceInconsistency,
    Panicked,
}

impl From<ErrorKind> for FailureKind {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Connection => FailureKind::Connection,
            ErrorKind::NotFound => FailureKind::NotFound,
            ErrorKind::NotRunning => FailureKind::NotRunning,
            ErrorKind::AlreadyStarted => FailureKind::AlreadyStarted,
            ErrorKind::InvalidArguments => FailureKind::InvalidArguments,
            ErrorKind::OperationFailed => FailureKind::OperationFailed,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Connection => "connection",
            FailureKind::NotFound => "not_found",
            FailureKind::NotRunning => "not_running",
            FailureKind::AlreadyStarted => "already_started",
            FailureKind::InvalidArguments => "invalid_arguments",
            FailureKind::OperationFailed => "operation_failed",
            FailureKind::Timeout => "timeout",
            FailureKind::PersistenceInconsistency => "persistence_inconsistency",
            FailureKind::Panicked => "panicked",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Stop,
    Start,
    Signal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Succeeded,
    AlreadyInState,
    Failed,
}

/// Outcome of one action on one process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    pub process: String,
    pub action: Action,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl OperationResult {
    pub fn succeeded(process: impl Into<String>, action: Action) -> Self {
        Self {
            process: process.into(),
            action,
            status: Status::Succeeded,
            kind: None,
            detail: None,
        }
    }

    pub fn already(process: impl Into<String>, action: Action, detail: impl Into<String>) -> Self {
        Self {
            process: process.into(),
            action,
            status: Status::AlreadyInState,
            kind: None,
            detail: Some(detail.into()),
        }
    }

    pub fn failed(
        process: impl Into<String>,
        action: Action,
        kind: FailureKind,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            process: process.into(),
            action,
            status: Status::Failed,
            kind: Some(kind),
            detail: Some(detail.into()),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_failure(&self) -> bool {
        self.status == Status::Failed
    }
}

/// Results of acting on several processes in one domain.
///
/// `aborted` is set when a connection error cut the batch short; processes
/// after that point have no result.
#[derive(Debug, Default)]
pub struct Batch {
    pub results: Vec<OperationResult>,
    pub aborted: Option<SupervisorError>,
}

impl Batch {
    pub fn all_succeeded(&self) -> bool {
        self.aborted.is_none() && self.results.iter().all(|r| !r.is_failure())
    }

    /// Append another batch; its abort (if any) wins over an earlier success.
    pub fn merge(&mut self, other: Batch) {
        self.results.extend(other.results);
        if self.aborted.is_none() {
            self.aborted = other.aborted;
        }
    }
}

/// A domain-level failure that stopped work in that domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainFailure {
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DomainReport {
    pub results: Vec<OperationResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub swaps: Vec<SwapRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<DomainFailure>,
}

impl DomainReport {
    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            error: Some(DomainFailure {
                kind,
                message: message.into(),
            }),
            ..Self::default()
        }
    }

    pub fn push(&mut self, result: OperationResult) {
        self.results.push(result);
    }

    pub fn extend(&mut self, results: impl IntoIterator<Item = OperationResult>) {
        self.results.extend(results);
    }

    /// Take a batch's results; a batch cut short by a connection error
    /// marks the whole domain as failed.
    pub fn absorb(&mut self, batch: Batch) {
        self.results.extend(batch.results);
        if let Some(e) = batch.aborted
            && self.error.is_none()
        {
            self.error = Some(DomainFailure {
                kind: e.kind().into(),
                message: e.to_string(),
            });
        }
    }

    pub fn count(&self, status: Status) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
            && self.results.iter().all(|r| !r.is_failure())
            && self.swaps.iter().all(|s| s.is_success())
    }
}

/// Everything a command did, grouped by domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateReport {
    pub operation: String,
    pub domains: BTreeMap<String, DomainReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl AggregateReport {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Self::default()
        }
    }

    pub fn insert(&mut self, domain: impl Into<String>, report: DomainReport) {
        self.domains.insert(domain.into(), report);
    }

    pub fn domain(&self, name: &str) -> Option<&DomainReport> {
        self.domains.get(name)
    }

    pub fn succeeded(&self) -> usize {
        self.domains
            .values()
            .map(|d| d.count(Status::Succeeded))
            .sum()
    }

    pub fn already_in_state(&self) -> usize {
        self.domains
            .values()
            .map(|d| d.count(Status::AlreadyInState))
            .sum()
    }

    /// Failed processes plus failed domains and failed swaps.
    pub fn failed(&self) -> usize {
        self.domains
            .values()
            .map(|d| {
                d.count(Status::Failed)
                    + usize::from(d.error.is_some())
                    + d.swaps.iter().filter(|s| !s.is_success()).count()
            })
            .sum()
    }

    pub fn failed_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for (domain, report) in &self.domains {
            if report.error.is_some() {
                names.push(domain.clone());
            }
            for r in report.results.iter().filter(|r| r.is_failure()) {
                names.push(format!("{domain}/{}", r.process));
            }
            for s in report.swaps.iter().filter(|s| !s.is_success()) {
                names.push(format!("{domain}/{}", s.group));
            }
        }
        names
    }

    pub fn is_success(&self) -> bool {
        self.aborted.is_none() && self.domains.values().all(DomainReport::is_success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_across_domains() {
        let mut report = AggregateReport::new("stop");

        let mut a = DomainReport::default();
        a.push(OperationResult::succeeded("web", Action::Stop));
        a.push(OperationResult::already("cron", Action::Stop, "already stopped"));
        report.insert("svcA", a);

        report.insert(
            "svcB",
            DomainReport::failed(FailureKind::Connection, "refused"),
        );

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.already_in_state(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failed_names(), vec!["svcB".to_string()]);
        assert!(!report.is_success());
        assert!(report.domain("svcA").unwrap().is_success());
    }

    #[test]
    fn serializes_failure_kind_in_snake_case() {
        let r = OperationResult::failed("web", Action::Start, FailureKind::OperationFailed, "boom");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"], "operation_failed");
        assert_eq!(json["action"], "start");
    }

    #[test]
    fn aborted_report_is_not_success() {
        let mut report = AggregateReport::new("graceful-restart");
        report.aborted = Some("suspension not confirmed".into());
        assert!(!report.is_success());
    }
}
