// ABOUTME: Graceful stop configuration.
// ABOUTME: Poll interval, kill signal, settle time, and optional force-kill timeout.

use serde::Deserialize;
use std::time::Duration;

use crate::stopper::StopPolicy;
use crate::supervisor::Signal;

#[derive(Debug, Clone, Deserialize)]
pub struct StopConfig {
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    #[serde(default = "Signal::kill")]
    pub kill_signal: Signal,

    #[serde(default = "default_kill_settle", with = "humantime_serde")]
    pub kill_settle: Duration,

    #[serde(default, with = "humantime_serde")]
    pub force_kill_timeout: Option<Duration>,
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_kill_settle() -> Duration {
    Duration::from_secs(1)
}

impl Default for StopConfig {
    fn default() -> Self {
        StopConfig {
            poll_interval: default_poll_interval(),
            kill_signal: Signal::kill(),
            kill_settle: default_kill_settle(),
            force_kill_timeout: None,
        }
    }
}

impl StopConfig {
    pub fn policy(&self, wait: bool, force_kill_timeout: Option<Duration>) -> StopPolicy {
        StopPolicy {
            wait,
            force_kill_timeout: force_kill_timeout.or(self.force_kill_timeout),
            poll_interval: self.poll_interval,
            kill_signal: self.kill_signal.clone(),
            kill_settle: self.kill_settle,
        }
    }
}
