// ABOUTME: Job drain and upstream-pause configuration.
// ABOUTME: Where the suspension flag lives and how long to wait for consumers.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::drain::DEFAULT_SUSPENSION_KEY;

#[derive(Debug, Clone, Deserialize)]
pub struct DrainConfig {
    /// Root of the file-backed suspension store. Drain steps are unavailable when unset.
    #[serde(default)]
    pub store_dir: Option<PathBuf>,

    #[serde(default = "default_suspension_key")]
    pub suspension_key: String,

    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    #[serde(default = "default_nudge_idle")]
    pub nudge_idle: bool,
}

fn default_suspension_key() -> String {
    DEFAULT_SUSPENSION_KEY.to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_nudge_idle() -> bool {
    true
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            store_dir: None,
            suspension_key: default_suspension_key(),
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
            nudge_idle: default_nudge_idle(),
        }
    }
}

/// Site configuration toggled while upstream admission is paused.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteConfig {
    #[serde(default)]
    pub config_path: Option<PathBuf>,
}
