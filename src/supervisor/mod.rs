// ABOUTME: Control endpoint client for supervisor domains.
// ABOUTME: XML-RPC transport, fault translation, process descriptors, and the ops trait.

mod client;
mod connector;
mod error;
mod fault;
mod process;
mod signal;
mod traits;
pub mod xmlrpc;

pub use client::XmlRpcClient;
pub use connector::{Connector, ReachabilityPolicy, SocketConnector, wait_until_reachable};
pub use error::{ErrorKind, SupervisorError};
pub use fault::{FaultCode, classify};
pub use process::{BulkStatus, ProcessDescriptor, ProcessState};
pub use signal::Signal;
pub use traits::SupervisorOps;
