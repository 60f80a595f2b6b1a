// ABOUTME: Rolling swap configuration.
// ABOUTME: Color pair and the bounded wait for the new instance to reach RUNNING.

use serde::Deserialize;
use std::time::Duration;

use crate::rolling::RollingPolicy;
use crate::types::ColorPair;

#[derive(Debug, Clone, Deserialize)]
pub struct RollingConfig {
    #[serde(default)]
    pub colors: ColorPair,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

impl Default for RollingConfig {
    fn default() -> Self {
        Self {
            colors: ColorPair::default(),
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

impl RollingConfig {
    pub fn policy(&self) -> RollingPolicy {
        RollingPolicy {
            timeout: self.timeout,
            poll_interval: self.poll_interval,
        }
    }
}
