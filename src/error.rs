// ABOUTME: Application-wide error types for fleetvisor.
// ABOUTME: Uses thiserror for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

use crate::discovery::DiscoveryError;
use crate::drain::DrainError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("suspension store: {0}")]
    Drain(#[from] DrainError),

    #[error("drain.store_dir is not configured")]
    DrainNotConfigured,

    #[error("site.config_path is not configured")]
    SiteConfigNotConfigured,

    /// The command ran but at least one domain or process failed.
    #[error("{operation} finished with {failed} failure(s)")]
    OperationFailed { operation: String, failed: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
