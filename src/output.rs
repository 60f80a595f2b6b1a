// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes for reports and status.

use serde::Serialize;
use std::time::Instant;

use crate::fanout::DomainOutcome;
use crate::process_state::ProcessStateStore;
use crate::report::{AggregateReport, Status};
use crate::supervisor::ProcessDescriptor;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                println!("{message}");
            }
            OutputMode::Json => self.emit_event("success", message, false),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => self.emit_event("error", message, true),
        }
    }

    /// Print a command's aggregate report.
    pub fn report(&self, report: &AggregateReport) {
        if self.mode == OutputMode::Json {
            let event = JsonReport {
                event: "report",
                succeeded: report.succeeded(),
                already_in_state: report.already_in_state(),
                failed: report.failed(),
                duration_secs: self.duration(),
                report,
            };
            if let Ok(json) = serde_json::to_string(&event) {
                println!("{json}");
            }
            return;
        }

        if self.mode == OutputMode::Normal {
            for (domain, result) in &report.domains {
                println!("{domain}:");
                if let Some(error) = &result.error {
                    println!("  ✗ {} ({})", error.message, error.kind);
                }
                for r in &result.results {
                    let mark = match r.status {
                        Status::Succeeded => "✓",
                        Status::AlreadyInState => "·",
                        Status::Failed => "✗",
                    };
                    match &r.detail {
                        Some(detail) => println!("  {mark} {} {detail}", r.process),
                        None => println!("  {mark} {}", r.process),
                    }
                }
                for swap in &result.swaps {
                    let mark = if swap.is_success() { "✓" } else { "✗" };
                    println!(
                        "  {mark} swap {}: {} → {} ({:?})",
                        swap.group, swap.from, swap.to, swap.phase
                    );
                    if let Some(error) = &swap.error {
                        println!("      {} ({})", error.message, error.kind);
                    }
                }
            }
        }

        for warning in &report.warnings {
            eprintln!("Warning: {warning}");
        }
        if let Some(reason) = &report.aborted {
            eprintln!("Aborted: {reason}");
        }

        let summary = format!(
            "{}: {} succeeded, {} already in state, {} failed",
            report.operation,
            report.succeeded(),
            report.already_in_state(),
            report.failed()
        );
        if report.is_success() {
            self.success(&summary);
        } else {
            println!("{summary}");
            let names = report.failed_names();
            if !names.is_empty() {
                println!("failed: {}", names.join(", "));
            }
        }
    }

    /// Print process listings per domain.
    pub fn status(
        &self,
        outcomes: &[DomainOutcome<Vec<ProcessDescriptor>>],
        states: &ProcessStateStore,
    ) {
        if self.mode == OutputMode::Json {
            for outcome in outcomes {
                let event = JsonStatus {
                    event: "status",
                    domain: outcome.domain.name.as_str(),
                    processes: outcome.result.as_ref().ok(),
                    error: outcome.result.as_ref().err().map(|e| e.to_string()),
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    println!("{json}");
                }
            }
            return;
        }

        for outcome in outcomes {
            let processes = match &outcome.result {
                Ok(processes) => processes,
                Err(e) => {
                    println!("{}: unreachable ({e})", outcome.domain.name);
                    continue;
                }
            };
            println!("{}:", outcome.domain.name);
            if self.mode == OutputMode::Quiet {
                continue;
            }
            for p in processes {
                let role = if states.is_worker(&p.name) {
                    match states.parse(&p.name).color {
                        Some(color) => format!("worker/{color}"),
                        None => "worker".to_string(),
                    }
                } else {
                    String::new()
                };
                println!(
                    "  {:<40} {:<9} {:>7} {}",
                    p.api_name(),
                    p.state.as_str(),
                    p.pid,
                    role
                );
            }
        }
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    fn emit_event(&self, event: &str, message: &str, to_stderr: bool) {
        let event = JsonEvent {
            event,
            message,
            duration_secs: self.duration(),
        };
        if let Ok(json) = serde_json::to_string(&event) {
            if to_stderr {
                eprintln!("{json}");
            } else {
                println!("{json}");
            }
        }
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    event: &'a str,
    succeeded: usize,
    already_in_state: usize,
    failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
    report: &'a AggregateReport,
}

#[derive(Serialize)]
struct JsonStatus<'a> {
    event: &'a str,
    domain: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    processes: Option<&'a Vec<ProcessDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}
