// ABOUTME: Error taxonomy for calls against one supervisor domain.
// ABOUTME: Every remote fault and transport failure lands in exactly one variant.

use serde::Serialize;
use thiserror::Error;

use super::fault;
use super::xmlrpc::CodecError;

#[derive(Debug, Clone, Error)]
pub enum SupervisorError {
    #[error("supervisor unreachable at {endpoint}: {reason}")]
    Connection { endpoint: String, reason: String },

    #[error("no such process: {0}")]
    NotFound(String),

    #[error("process not running: {0}")]
    NotRunning(String),

    #[error("process already started: {0}")]
    AlreadyStarted(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("operation failed: {0}")]
    OperationFailed(String),
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Connection,
    NotFound,
    NotRunning,
    AlreadyStarted,
    InvalidArguments,
    OperationFailed,
}

impl SupervisorError {
    /// Build the error for a remote fault using the closed fault table.
    pub fn from_fault(endpoint: &str, code: i64, message: &str) -> Self {
        let message = message.to_string();
        match fault::classify(code) {
            ErrorKind::Connection => SupervisorError::Connection {
                endpoint: endpoint.to_string(),
                reason: message,
            },
            ErrorKind::NotFound => SupervisorError::NotFound(message),
            ErrorKind::NotRunning => SupervisorError::NotRunning(message),
            ErrorKind::AlreadyStarted => SupervisorError::AlreadyStarted(message),
            ErrorKind::InvalidArguments => SupervisorError::InvalidArguments(message),
            ErrorKind::OperationFailed => {
                SupervisorError::OperationFailed(format!("fault {code}: {message}"))
            }
        }
    }

    pub fn connection(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        SupervisorError::Connection {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SupervisorError::Connection { .. } => ErrorKind::Connection,
            SupervisorError::NotFound(_) => ErrorKind::NotFound,
            SupervisorError::NotRunning(_) => ErrorKind::NotRunning,
            SupervisorError::AlreadyStarted(_) => ErrorKind::AlreadyStarted,
            SupervisorError::InvalidArguments(_) => ErrorKind::InvalidArguments,
            SupervisorError::OperationFailed(_) => ErrorKind::OperationFailed,
        }
    }

    pub fn is_connection(&self) -> bool {
        self.kind() == ErrorKind::Connection
    }
}

impl From<CodecError> for SupervisorError {
    fn from(e: CodecError) -> Self {
        SupervisorError::OperationFailed(format!("malformed response: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_maps_to_variant() {
        let err = SupervisorError::from_fault("/s/a.sock", 10, "BAD_NAME: nope");
        assert!(matches!(err, SupervisorError::NotFound(_)));

        let err = SupervisorError::from_fault("/s/a.sock", 6, "SHUTDOWN_STATE");
        assert!(err.is_connection());
        assert!(err.to_string().contains("/s/a.sock"));
    }

    #[test]
    fn unknown_fault_keeps_code_in_message() {
        let err = SupervisorError::from_fault("/s/a.sock", 999, "weird");
        assert_eq!(err.kind(), ErrorKind::OperationFailed);
        assert!(err.to_string().contains("fault 999"));
    }
}
