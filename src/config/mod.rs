// ABOUTME: Configuration types and parsing for fleetvisor.yml.
// ABOUTME: Handles YAML parsing, file discovery, defaults, and the socket-dir env override.

mod deserialize;
mod drain;
mod init;
mod rolling;
mod stop;

pub use drain::{DrainConfig, SiteConfig};
pub use init::init_config;
pub use rolling::RollingConfig;
pub use stop::StopConfig;

use crate::error::{Error, Result};
use crate::fanout::FanOutExecutor;
use crate::process_state::{DEFAULT_WORKER_MARKERS, ProcessStateStore, WorkerMatcher};
use crate::supervisor::{ReachabilityPolicy, Signal};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "fleetvisor.yml";
pub const CONFIG_FILENAME_ALT: &str = "fleetvisor.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".fleetvisor/config.yml";

/// Environment variable that replaces `socket_dir`.
pub const SOCKET_DIR_ENV: &str = "SUPERVISOR_SOCKET_DIR";

pub const DEFAULT_SOCKET_DIR: &str = "/fm-sockets";
pub const ROLLING_STATE_DIRNAME: &str = "rolling-state";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_socket_dir")]
    pub socket_dir: PathBuf,

    #[serde(default)]
    pub state_dir: Option<PathBuf>,

    #[serde(default)]
    pub parallelism: Option<usize>,

    #[serde(default)]
    pub connect: ConnectConfig,

    #[serde(default)]
    pub workers: WorkersConfig,

    #[serde(default)]
    pub stop: StopConfig,

    #[serde(default)]
    pub rolling: RollingConfig,

    #[serde(default)]
    pub drain: DrainConfig,

    #[serde(default)]
    pub site: SiteConfig,
}

fn default_socket_dir() -> PathBuf {
    PathBuf::from(DEFAULT_SOCKET_DIR)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectConfig {
    #[serde(default = "default_connect_interval", with = "humantime_serde")]
    pub interval: Duration,

    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_connect_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(5)
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            interval: default_connect_interval(),
            timeout: default_connect_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkersConfig {
    #[serde(
        default = "default_markers",
        deserialize_with = "deserialize::deserialize_markers"
    )]
    pub markers: NonEmpty<String>,

    #[serde(default = "default_graceful_signal")]
    pub graceful_signal: Signal,
}

fn default_markers() -> NonEmpty<String> {
    NonEmpty::from((
        DEFAULT_WORKER_MARKERS[0].to_string(),
        DEFAULT_WORKER_MARKERS[1..]
            .iter()
            .map(|m| m.to_string())
            .collect(),
    ))
}

fn default_graceful_signal() -> Signal {
    Signal::Number(34)
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            markers: default_markers(),
            graceful_signal: default_graceful_signal(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_dir: default_socket_dir(),
            state_dir: None,
            parallelism: None,
            connect: ConnectConfig::default(),
            workers: WorkersConfig::default(),
            stop: StopConfig::default(),
            rolling: RollingConfig::default(),
            drain: DrainConfig::default(),
            site: SiteConfig::default(),
        }
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading config");
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Like [`Config::discover`], but falls back to built-in defaults.
    pub fn discover_or_default(dir: &Path) -> Result<Self> {
        match Self::discover(dir) {
            Err(Error::ConfigNotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Apply `SUPERVISOR_SOCKET_DIR` if it is set and non-empty.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var(SOCKET_DIR_ENV)
            && !dir.trim().is_empty()
        {
            self.socket_dir = PathBuf::from(dir);
        }
        self
    }

    /// Directory holding the per-group active color files.
    pub fn state_dir(&self) -> PathBuf {
        self.state_dir
            .clone()
            .unwrap_or_else(|| self.socket_dir.join(ROLLING_STATE_DIRNAME))
    }

    pub fn reachability(&self) -> ReachabilityPolicy {
        ReachabilityPolicy {
            interval: self.connect.interval,
            timeout: self.connect.timeout,
        }
    }

    pub fn worker_matcher(&self) -> WorkerMatcher {
        WorkerMatcher::new(self.workers.markers.iter())
    }

    pub fn process_state_store(&self) -> ProcessStateStore {
        ProcessStateStore::new(self.worker_matcher(), self.rolling.colors.clone())
    }

    pub fn fanout(&self) -> FanOutExecutor {
        match self.parallelism {
            Some(cap) => FanOutExecutor::new(cap),
            None => FanOutExecutor::with_available_parallelism(),
        }
    }

    pub fn template() -> Self {
        Self::default()
    }
}
