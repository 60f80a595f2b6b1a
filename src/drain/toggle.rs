// ABOUTME: Temporary key overrides in a JSON site configuration file.
// ABOUTME: Used to pause upstream admission (maintenance mode, scheduler) and restore it after.

use serde_json::{Map, Value};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MAINTENANCE_MODE_KEY: &str = "maintenance_mode";
pub const PAUSE_SCHEDULER_KEY: &str = "pause_scheduler";

#[derive(Debug, Error)]
pub enum ToggleError {
    #[error("cannot access site config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("site config {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("site config {0} is not a JSON object")]
    NotAnObject(PathBuf),
}

/// A key to set while an operation runs.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfigToggle {
    path: PathBuf,
    key: String,
    value: Value,
}

/// A toggle that has been applied and remembers what to put back.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedToggle {
    path: PathBuf,
    key: String,
    original: Option<Value>,
    changed: bool,
}

impl SiteConfigToggle {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
            value,
        }
    }

    /// The toggles that pause upstream work admission.
    pub fn pause_upstream(path: &Path) -> Vec<Self> {
        vec![
            Self::new(path, MAINTENANCE_MODE_KEY, Value::from(1)),
            Self::new(path, PAUSE_SCHEDULER_KEY, Value::from(1)),
        ]
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn apply(&self) -> Result<AppliedToggle, ToggleError> {
        let mut config = read_object(&self.path).await?;
        let original = config.get(&self.key).cloned();
        let changed = original.as_ref() != Some(&self.value);

        if changed {
            config.insert(self.key.clone(), self.value.clone());
            write_object(&self.path, &config).await?;
        }

        tracing::info!(
            path = %self.path.display(),
            key = %self.key,
            value = %self.value,
            changed,
            "site config toggled"
        );

        Ok(AppliedToggle {
            path: self.path.clone(),
            key: self.key.clone(),
            original,
            changed,
        })
    }
}

impl AppliedToggle {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Put the original value back, removing the key if it was absent.
    pub async fn restore(&self) -> Result<(), ToggleError> {
        if !self.changed {
            return Ok(());
        }

        let mut config = read_object(&self.path).await?;
        match &self.original {
            Some(value) => {
                config.insert(self.key.clone(), value.clone());
            }
            None => {
                config.remove(&self.key);
            }
        }
        write_object(&self.path, &config).await?;

        tracing::info!(path = %self.path.display(), key = %self.key, "site config restored");
        Ok(())
    }
}

async fn read_object(path: &Path) -> Result<Map<String, Value>, ToggleError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ToggleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let value: Value = serde_json::from_str(&content).map_err(|source| ToggleError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ToggleError::NotAnObject(path.to_path_buf())),
    }
}

async fn write_object(path: &Path, config: &Map<String, Value>) -> Result<(), ToggleError> {
    let content = serde_json::to_string_pretty(config).map_err(|source| ToggleError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    tokio::fs::write(path, content)
        .await
        .map_err(|source| ToggleError::Io {
            path: path.to_path_buf(),
            source,
        })
}
