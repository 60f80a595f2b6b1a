// ABOUTME: Shared suspension-flag store and consumer state registry.
// ABOUTME: The file-backed store keeps flags, consumer reports, and queues under one directory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DrainError {
    #[error("suspension store I/O error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid consumer report {path}: {source}")]
    InvalidReport {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("suspension store unavailable: {0}")]
    Unavailable(String),
}

impl DrainError {
    fn io(path: &Path, source: io::Error) -> Self {
        DrainError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// State a consumer reports about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumerState {
    Idle,
    Busy,
    Suspended,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumerStatus {
    pub name: String,
    pub state: ConsumerState,
    #[serde(default)]
    pub queues: Vec<String>,
}

impl ConsumerStatus {
    pub fn is_drained(&self) -> bool {
        self.state == ConsumerState::Suspended
    }

    /// Consumers that are neither working nor suspended only notice the flag
    /// after taking another unit of work.
    pub fn needs_nudge(&self) -> bool {
        !matches!(self.state, ConsumerState::Busy | ConsumerState::Suspended)
    }
}

/// Key-presence flag store plus the consumers that watch it.
#[async_trait]
pub trait SuspensionStore: Send + Sync {
    async fn set_flag(&self, key: &str) -> Result<(), DrainError>;

    /// Delete the flag. Returns whether it was present.
    async fn clear_flag(&self, key: &str) -> Result<bool, DrainError>;

    async fn flag_exists(&self, key: &str) -> Result<bool, DrainError>;

    async fn consumers(&self) -> Result<Vec<ConsumerStatus>, DrainError>;

    /// Put a harmless no-op unit of work at the front of `queue`.
    async fn enqueue_noop(&self, queue: &str) -> Result<(), DrainError>;
}

/// No-op job record appended to a queue file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoopJob {
    pub job: String,
    pub origin: String,
    pub enqueued_at: DateTime<Utc>,
}

impl NoopJob {
    pub fn new() -> Self {
        Self {
            job: "noop".to_string(),
            origin: gethostname::gethostname().to_string_lossy().into_owned(),
            enqueued_at: Utc::now(),
        }
    }
}

impl Default for NoopJob {
    fn default() -> Self {
        Self::new()
    }
}

/// Directory layout: `flags/<key>`, `consumers/*.json`, `queues/<queue>.jsonl`.
#[derive(Debug, Clone)]
pub struct FileSuspensionStore {
    root: PathBuf,
}

impl FileSuspensionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn flag_path(&self, key: &str) -> PathBuf {
        self.root.join("flags").join(urlencoding::encode(key).as_ref())
    }

    pub fn consumers_dir(&self) -> PathBuf {
        self.root.join("consumers")
    }

    pub fn queue_path(&self, queue: &str) -> PathBuf {
        self.root
            .join("queues")
            .join(format!("{}.jsonl", urlencoding::encode(queue)))
    }
}

#[async_trait]
impl SuspensionStore for FileSuspensionStore {
    async fn set_flag(&self, key: &str) -> Result<(), DrainError> {
        let path = self.flag_path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DrainError::io(parent, e))?;
        }
        tokio::fs::write(&path, Utc::now().to_rfc3339())
            .await
            .map_err(|e| DrainError::io(&path, e))
    }

    async fn clear_flag(&self, key: &str) -> Result<bool, DrainError> {
        let path = self.flag_path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DrainError::io(&path, e)),
        }
    }

    async fn flag_exists(&self, key: &str) -> Result<bool, DrainError> {
        let path = self.flag_path(key);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| DrainError::io(&path, e))
    }

    async fn consumers(&self) -> Result<Vec<ConsumerStatus>, DrainError> {
        let dir = self.consumers_dir();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DrainError::io(&dir, e)),
        };

        let mut consumers = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| DrainError::io(&dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| DrainError::io(&path, e))?;
            let status: ConsumerStatus = serde_json::from_str(&content)
                .map_err(|source| DrainError::InvalidReport { path, source })?;
            consumers.push(status);
        }

        consumers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(consumers)
    }

    async fn enqueue_noop(&self, queue: &str) -> Result<(), DrainError> {
        let path = self.queue_path(queue);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DrainError::io(parent, e))?;
        }

        let line = serde_json::to_string(&NoopJob::new())
            .map_err(|e| DrainError::Unavailable(e.to_string()))?;

        // Front of the queue: the new job goes on the first line.
        let existing = match tokio::fs::read_to_string(&path).await {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(DrainError::io(&path, e)),
        };
        tokio::fs::write(&path, format!("{line}\n{existing}"))
            .await
            .map_err(|e| DrainError::io(&path, e))
    }
}
