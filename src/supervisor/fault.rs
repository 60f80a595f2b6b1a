// ABOUTME: Closed table of supervisor fault codes.
// ABOUTME: Translates a fault code into the error taxonomy; fault text is never inspected.

use super::error::ErrorKind;

/// Fault codes defined by the supervisor XML-RPC interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultCode {
    UnknownMethod,
    IncorrectParameters,
    BadArguments,
    SignatureUnsupported,
    ShutdownState,
    BadName,
    BadSignal,
    NoFile,
    NotExecutable,
    Failed,
    AbnormalTermination,
    SpawnError,
    AlreadyStarted,
    NotRunning,
    Success,
    AlreadyAdded,
    StillRunning,
    CantReread,
}

const TABLE: &[(i64, FaultCode, ErrorKind)] = &[
    (1, FaultCode::UnknownMethod, ErrorKind::OperationFailed),
    (2, FaultCode::IncorrectParameters, ErrorKind::InvalidArguments),
    (3, FaultCode::BadArguments, ErrorKind::InvalidArguments),
    (4, FaultCode::SignatureUnsupported, ErrorKind::OperationFailed),
    (6, FaultCode::ShutdownState, ErrorKind::Connection),
    (10, FaultCode::BadName, ErrorKind::NotFound),
    (11, FaultCode::BadSignal, ErrorKind::InvalidArguments),
    (20, FaultCode::NoFile, ErrorKind::Connection),
    (21, FaultCode::NotExecutable, ErrorKind::OperationFailed),
    (30, FaultCode::Failed, ErrorKind::OperationFailed),
    (40, FaultCode::AbnormalTermination, ErrorKind::OperationFailed),
    (50, FaultCode::SpawnError, ErrorKind::OperationFailed),
    (60, FaultCode::AlreadyStarted, ErrorKind::AlreadyStarted),
    (70, FaultCode::NotRunning, ErrorKind::NotRunning),
    (80, FaultCode::Success, ErrorKind::OperationFailed),
    (90, FaultCode::AlreadyAdded, ErrorKind::OperationFailed),
    (91, FaultCode::StillRunning, ErrorKind::OperationFailed),
    (92, FaultCode::CantReread, ErrorKind::OperationFailed),
];

impl FaultCode {
    pub fn from_code(code: i64) -> Option<Self> {
        TABLE
            .iter()
            .find(|(c, _, _)| *c == code)
            .map(|(_, fault, _)| *fault)
    }

    pub fn code(self) -> i64 {
        TABLE
            .iter()
            .find(|(_, fault, _)| *fault == self)
            .map(|(c, _, _)| *c)
            .unwrap_or_default()
    }
}

/// Error kind for a raw fault code. Codes outside the table are operation failures.
pub fn classify(code: i64) -> ErrorKind {
    TABLE
        .iter()
        .find(|(c, _, _)| *c == code)
        .map(|(_, _, kind)| *kind)
        .unwrap_or(ErrorKind::OperationFailed)
}
