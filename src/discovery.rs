// ABOUTME: Service domain discovery from a directory of supervisor sockets.
// ABOUTME: DomainRegistry is refreshed on demand and validates domain selections.

use serde::Serialize;
use std::collections::BTreeSet;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::DomainName;

pub const SOCKET_EXTENSION: &str = "sock";

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("cannot read socket directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unknown domain(s): {unknown}; available: {available}")]
    UnknownDomain { unknown: String, available: String },

    #[error("no supervisor domains found in {0}")]
    NoDomains(PathBuf),
}

/// One supervisor daemon: its name and control socket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ServiceDomain {
    pub name: DomainName,
    pub socket_path: PathBuf,
}

impl ServiceDomain {
    pub fn new(name: DomainName, socket_path: impl Into<PathBuf>) -> Self {
        Self {
            name,
            socket_path: socket_path.into(),
        }
    }
}

/// Domains discovered in a socket directory.
///
/// Owned by the caller and passed into the orchestrator; call
/// [`DomainRegistry::refresh`] to pick up sockets created since the last scan.
#[derive(Debug, Clone)]
pub struct DomainRegistry {
    socket_dir: PathBuf,
    domains: Vec<ServiceDomain>,
}

impl DomainRegistry {
    /// Scan `socket_dir` and build a registry.
    pub fn scan(socket_dir: impl Into<PathBuf>) -> Result<Self, DiscoveryError> {
        let mut registry = Self {
            socket_dir: socket_dir.into(),
            domains: Vec::new(),
        };
        registry.refresh()?;
        Ok(registry)
    }

    pub fn socket_dir(&self) -> &Path {
        &self.socket_dir
    }

    pub fn domains(&self) -> &[ServiceDomain] {
        &self.domains
    }

    /// Re-read the socket directory.
    pub fn refresh(&mut self) -> Result<(), DiscoveryError> {
        self.domains = scan_dir(&self.socket_dir)?;
        tracing::debug!(
            dir = %self.socket_dir.display(),
            count = self.domains.len(),
            "discovered supervisor domains"
        );
        Ok(())
    }

    /// Resolve requested names against the current scan. An empty request
    /// selects every domain.
    pub fn select(&self, requested: &[String]) -> Result<Vec<ServiceDomain>, DiscoveryError> {
        if self.domains.is_empty() {
            return Err(DiscoveryError::NoDomains(self.socket_dir.clone()));
        }

        if requested.is_empty() {
            return Ok(self.domains.clone());
        }

        let known: BTreeSet<&str> = self.domains.iter().map(|d| d.name.as_str()).collect();
        let unknown: Vec<&str> = requested
            .iter()
            .map(String::as_str)
            .filter(|name| !known.contains(name))
            .collect();

        if !unknown.is_empty() {
            return Err(DiscoveryError::UnknownDomain {
                unknown: unknown.join(", "),
                available: known.into_iter().collect::<Vec<_>>().join(", "),
            });
        }

        let wanted: BTreeSet<&str> = requested.iter().map(String::as_str).collect();
        Ok(self
            .domains
            .iter()
            .filter(|d| wanted.contains(d.name.as_str()))
            .cloned()
            .collect())
    }
}

fn scan_dir(dir: &Path) -> Result<Vec<ServiceDomain>, DiscoveryError> {
    let entries = std::fs::read_dir(dir).map_err(|source| DiscoveryError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut domains = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(SOCKET_EXTENSION) {
            continue;
        }

        // Plain files with a .sock suffix are left over from crashed daemons.
        match entry.file_type() {
            Ok(ft) if ft.is_socket() => {}
            _ => continue,
        }

        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        match DomainName::new(stem) {
            Ok(name) => domains.push(ServiceDomain::new(name, path.clone())),
            Err(e) => tracing::warn!(path = %path.display(), "skipping socket: {}", e),
        }
    }

    domains.sort();
    Ok(domains)
}
