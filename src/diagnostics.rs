// ABOUTME: Diagnostics accumulator for non-fatal warnings during an operation.
// ABOUTME: Collects warnings that shouldn't fail a command but should be shown to users.

use serde::Serialize;

/// Collects non-fatal warnings during fleet operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Take over warnings collected elsewhere. They were logged when recorded.
    pub fn merge(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }

    /// Warning messages, for copying into a report.
    pub fn messages(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.message.clone()).collect()
    }
}

/// A non-fatal warning.
#[derive(Debug, Clone, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// A registered cleanup action failed.
    pub fn cleanup_failed(label: &str, message: impl std::fmt::Display) -> Self {
        Self {
            kind: WarningKind::CleanupFailed,
            message: format!("cleanup '{label}' failed: {message}"),
        }
    }

    /// The old instance could not be stopped after a completed swap.
    pub fn previous_instance(domain: &str, message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::PreviousInstanceStop,
            message: format!("{domain}: {}", message.into()),
        }
    }

    /// A worker name could not be parsed into a rolling group.
    pub fn ambiguous_name(domain: &str, name: &str) -> Self {
        Self {
            kind: WarningKind::AmbiguousRollingName,
            message: format!(
                "{domain}: '{name}' has an ambiguous color suffix; restarting it in place"
            ),
        }
    }

    /// A graceful signal could not be delivered to a worker.
    pub fn worker_signal(domain: &str, message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::WorkerSignal,
            message: format!("{domain}: {}", message.into()),
        }
    }
}

/// Categories of warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// A cleanup action (resume, config restore) did not succeed.
    CleanupFailed,
    /// The previously active instance of a rolling pair is still running.
    PreviousInstanceStop,
    /// Worker name excluded from rolling swaps.
    AmbiguousRollingName,
    /// Graceful signal delivery failed.
    WorkerSignal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(!diag.has_warnings());
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn diagnostics_collects_warnings() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::cleanup_failed("resume", "store offline"));
        diag.warn(Warning::ambiguous_name("svcA", "ingest-green-worker"));

        assert!(diag.has_warnings());
        assert_eq!(diag.warnings().len(), 2);
        assert_eq!(
            diag.messages()[0],
            "cleanup 'resume' failed: store offline"
        );
    }

    #[test]
    fn warning_constructors_set_correct_kind() {
        assert_eq!(
            Warning::cleanup_failed("x", "y").kind,
            WarningKind::CleanupFailed
        );
        assert_eq!(
            Warning::previous_instance("d", "m").kind,
            WarningKind::PreviousInstanceStop
        );
        assert_eq!(
            Warning::ambiguous_name("d", "n").kind,
            WarningKind::AmbiguousRollingName
        );
        assert_eq!(
            Warning::worker_signal("d", "m").kind,
            WarningKind::WorkerSignal
        );
    }
}
