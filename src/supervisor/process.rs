// ABOUTME: Process descriptors and state codes reported by a supervisor domain.
// ABOUTME: Decodes getProcessInfo structs and bulk start/stop status entries.

use serde::Serialize;
use std::fmt;

use super::xmlrpc::{CodecError, Value};

/// Supervisor process state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessState {
    Stopped,
    Starting,
    Running,
    Backoff,
    Stopping,
    Exited,
    Fatal,
    Unknown,
}

impl ProcessState {
    /// Map a numeric state code. Unrecognised codes become `Unknown`.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => ProcessState::Stopped,
            10 => ProcessState::Starting,
            20 => ProcessState::Running,
            30 => ProcessState::Backoff,
            40 => ProcessState::Stopping,
            100 => ProcessState::Exited,
            200 => ProcessState::Fatal,
            _ => ProcessState::Unknown,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            ProcessState::Stopped => 0,
            ProcessState::Starting => 10,
            ProcessState::Running => 20,
            ProcessState::Backoff => 30,
            ProcessState::Stopping => 40,
            ProcessState::Exited => 100,
            ProcessState::Fatal => 200,
            ProcessState::Unknown => 1000,
        }
    }

    /// Terminal-stopped states. A stop is only complete in one of these.
    pub fn is_stopped(self) -> bool {
        matches!(
            self,
            ProcessState::Stopped | ProcessState::Exited | ProcessState::Fatal
        )
    }

    pub fn is_running(self) -> bool {
        self == ProcessState::Running
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessState::Stopped => "STOPPED",
            ProcessState::Starting => "STARTING",
            ProcessState::Running => "RUNNING",
            ProcessState::Backoff => "BACKOFF",
            ProcessState::Stopping => "STOPPING",
            ProcessState::Exited => "EXITED",
            ProcessState::Fatal => "FATAL",
            ProcessState::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one process as reported by `getProcessInfo`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessDescriptor {
    pub name: String,
    pub group: String,
    pub state: ProcessState,
    pub pid: i64,
    pub start: i64,
    pub stop: i64,
    pub now: i64,
    pub spawn_error: String,
    pub exit_status: i64,
    pub stdout_log: String,
    pub stderr_log: String,
    pub description: String,
}

impl ProcessDescriptor {
    /// Minimal descriptor, used when only a name and state are known.
    pub fn new(name: impl Into<String>, group: impl Into<String>, state: ProcessState) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            state,
            pid: 0,
            start: 0,
            stop: 0,
            now: 0,
            spawn_error: String::new(),
            exit_status: 0,
            stdout_log: String::new(),
            stderr_log: String::new(),
            description: String::new(),
        }
    }

    /// Name to pass to the control endpoint (`group:name` when grouped).
    pub fn api_name(&self) -> String {
        qualified_name(&self.group, &self.name)
    }

    pub fn from_value(value: &Value) -> Result<Self, CodecError> {
        let fields = value.as_struct()?;
        let int = |key: &str| fields.get(key).and_then(Value::as_int).unwrap_or(0);
        let text = |key: &str| {
            fields
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let name = fields
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| CodecError::MissingField("name".to_string()))?
            .to_string();

        Ok(Self {
            name,
            group: text("group"),
            state: ProcessState::from_code(int("state")),
            pid: int("pid"),
            start: int("start"),
            stop: int("stop"),
            now: int("now"),
            spawn_error: text("spawnerr"),
            exit_status: int("exitstatus"),
            stdout_log: text("stdout_logfile"),
            stderr_log: text("stderr_logfile"),
            description: text("description"),
        })
    }
}

/// Per-process entry returned by bulk start/stop calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkStatus {
    pub name: String,
    pub group: String,
    pub status: i64,
    pub description: String,
}

impl BulkStatus {
    pub fn api_name(&self) -> String {
        qualified_name(&self.group, &self.name)
    }

    pub fn from_value(value: &Value) -> Result<Self, CodecError> {
        let fields = value.as_struct()?;
        let text = |key: &str| {
            fields
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Ok(Self {
            name: text("name"),
            group: text("group"),
            status: fields.get("status").and_then(Value::as_int).unwrap_or(0),
            description: text("description"),
        })
    }
}

fn qualified_name(group: &str, name: &str) -> String {
    if group.is_empty() || name.contains(':') {
        name.to_string()
    } else {
        format!("{group}:{name}")
    }
}
