// ABOUTME: Opens a ready-to-use control client for a service domain.
// ABOUTME: Waits for the endpoint with a fixed poll interval, bounded by a timeout.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::client::XmlRpcClient;
use super::error::SupervisorError;
use super::traits::SupervisorOps;
use crate::discovery::ServiceDomain;

/// Produces a client for a domain once it is reachable.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        domain: &ServiceDomain,
    ) -> Result<Arc<dyn SupervisorOps>, SupervisorError>;
}

/// Bounded wait used for every reachability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReachabilityPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for ReachabilityPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Connects to domains over their unix control sockets.
#[derive(Debug, Clone, Default)]
pub struct SocketConnector {
    policy: ReachabilityPolicy,
}

impl SocketConnector {
    pub fn new(policy: ReachabilityPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl Connector for SocketConnector {
    async fn connect(
        &self,
        domain: &ServiceDomain,
    ) -> Result<Arc<dyn SupervisorOps>, SupervisorError> {
        let client = XmlRpcClient::new(&domain.socket_path);
        wait_until_reachable(&client, self.policy).await?;
        Ok(Arc::new(client))
    }
}

/// Ping `ops` until it answers. Connection errors are retried until the
/// policy timeout; any other error is returned immediately.
pub async fn wait_until_reachable(
    ops: &dyn SupervisorOps,
    policy: ReachabilityPolicy,
) -> Result<(), SupervisorError> {
    let deadline = Instant::now() + policy.timeout;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match ops.ping().await {
            Ok(()) => return Ok(()),
            Err(SupervisorError::Connection { endpoint, reason }) => {
                if Instant::now() + policy.interval > deadline {
                    return Err(SupervisorError::Connection {
                        endpoint,
                        reason: format!(
                            "not reachable after {attempts} attempt(s) within {:?}: {reason}",
                            policy.timeout
                        ),
                    });
                }
                tracing::debug!(%endpoint, attempts, "supervisor not reachable yet");
                tokio::time::sleep(policy.interval).await;
            }
            Err(other) => return Err(other),
        }
    }
}
