// ABOUTME: Trait describing the control surface of one supervisor domain.
// ABOUTME: Implemented by the XML-RPC client and by in-memory fakes in tests.

use async_trait::async_trait;

use super::error::SupervisorError;
use super::process::{BulkStatus, ProcessDescriptor};
use super::signal::Signal;

/// Process control operations against a single domain.
///
/// Names are passed exactly as the endpoint expects them (`group:name` for
/// grouped programs, see [`ProcessDescriptor::api_name`]).
#[async_trait]
pub trait SupervisorOps: Send + Sync {
    /// Check the endpoint is up and answering.
    async fn ping(&self) -> Result<(), SupervisorError>;

    async fn list_processes(&self) -> Result<Vec<ProcessDescriptor>, SupervisorError>;

    async fn get_process(&self, name: &str) -> Result<ProcessDescriptor, SupervisorError>;

    async fn start_process(&self, name: &str, wait: bool) -> Result<(), SupervisorError>;

    async fn stop_process(&self, name: &str, wait: bool) -> Result<(), SupervisorError>;

    async fn signal_process(&self, name: &str, signal: &Signal) -> Result<(), SupervisorError>;

    async fn start_all(&self, wait: bool) -> Result<Vec<BulkStatus>, SupervisorError>;

    async fn stop_all(&self, wait: bool) -> Result<Vec<BulkStatus>, SupervisorError>;
}
