// ABOUTME: Pauses upstream job admission and waits for in-flight work to drain.
// ABOUTME: Suspend, verify, wait, and resume over a shared suspension flag.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::store::{ConsumerStatus, DrainError, SuspensionStore};

pub const DEFAULT_SUSPENSION_KEY: &str = "rq:suspended";

#[derive(Clone)]
pub struct JobDrainCoordinator {
    store: Arc<dyn SuspensionStore>,
    key: String,
    nudge_idle: bool,
}

impl std::fmt::Debug for JobDrainCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobDrainCoordinator")
            .field("key", &self.key)
            .field("nudge_idle", &self.nudge_idle)
            .finish()
    }
}

impl JobDrainCoordinator {
    pub fn new(store: Arc<dyn SuspensionStore>, key: impl Into<String>, nudge_idle: bool) -> Self {
        Self {
            store,
            key: key.into(),
            nudge_idle,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Set the suspension flag, then nudge idle consumers so they notice.
    pub async fn suspend(&self) -> bool {
        if let Err(e) = self.store.set_flag(&self.key).await {
            tracing::error!(key = %self.key, "failed to set suspension flag: {}", e);
            return false;
        }
        tracing::info!(key = %self.key, "job admission suspended");

        if self.nudge_idle {
            match self.store.consumers().await {
                Ok(consumers) => self.nudge(&consumers).await,
                Err(e) => tracing::warn!("cannot list consumers to nudge: {}", e),
            }
        }
        true
    }

    /// Re-read the flag. Callers must see `Ok(true)` before any destructive step.
    pub async fn verify(&self) -> Result<bool, DrainError> {
        let present = self.store.flag_exists(&self.key).await?;
        tracing::debug!(key = %self.key, present, "verified suspension flag");
        Ok(present)
    }

    /// Poll consumer states until all are suspended or `timeout` elapses.
    pub async fn wait_drained(&self, timeout: Duration, poll_interval: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        loop {
            match self.store.consumers().await {
                Ok(consumers) => {
                    let pending: Vec<&ConsumerStatus> =
                        consumers.iter().filter(|c| !c.is_drained()).collect();
                    if pending.is_empty() {
                        tracing::info!(consumers = consumers.len(), "all consumers drained");
                        return true;
                    }
                    tracing::debug!(pending = pending.len(), "waiting for consumers to drain");
                    if self.nudge_idle {
                        self.nudge(&consumers).await;
                    }
                }
                Err(e) => {
                    tracing::error!("cannot read consumer states: {}", e);
                    return false;
                }
            }

            if Instant::now() >= deadline {
                tracing::warn!(timeout = ?timeout, "timed out waiting for consumers to drain");
                return false;
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Clear the flag. Returns whether it was present.
    pub async fn resume(&self) -> Result<bool, DrainError> {
        let was_set = self.store.clear_flag(&self.key).await?;
        if was_set {
            tracing::info!(key = %self.key, "job admission resumed");
        } else {
            tracing::info!(key = %self.key, "suspension flag was not set");
        }
        Ok(was_set)
    }

    async fn nudge(&self, consumers: &[ConsumerStatus]) {
        for consumer in consumers.iter().filter(|c| c.needs_nudge()) {
            let Some(queue) = consumer.queues.first() else {
                continue;
            };
            match self.store.enqueue_noop(queue).await {
                Ok(()) => tracing::debug!(consumer = %consumer.name, %queue, "enqueued no-op"),
                Err(e) => tracing::warn!(consumer = %consumer.name, %queue, "no-op enqueue failed: {}", e),
            }
        }
    }
}
