// ABOUTME: Persisted active color per rolling group, one small text file each.
// ABOUTME: Writes go through a temp file and rename; files are world-readable.

use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use crate::process_state::{DEFAULT_INDEX, RollingGroupKey};
use crate::types::{Color, ColorPair};

pub const STATE_FILE_SUFFIX: &str = "active_suffix";

const DIR_MODE: u32 = 0o755;
const FILE_MODE: u32 = 0o644;

/// File-backed record of which color is active for each group.
#[derive(Debug, Clone)]
pub struct ActiveColorStore {
    dir: PathBuf,
    colors: ColorPair,
}

impl ActiveColorStore {
    pub fn new(dir: impl Into<PathBuf>, colors: ColorPair) -> Self {
        Self {
            dir: dir.into(),
            colors,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn colors(&self) -> &ColorPair {
        &self.colors
    }

    pub fn path_for(&self, key: &RollingGroupKey) -> PathBuf {
        let base = key.base.replace(['/', '\\'], "_");
        let file = if key.index == DEFAULT_INDEX {
            format!("{base}.{STATE_FILE_SUFFIX}")
        } else {
            format!("{base}.{}.{STATE_FILE_SUFFIX}", key.index)
        };
        self.dir.join(file)
    }

    /// Active color for `key`. Missing, unreadable, or unknown values fall
    /// back to the first configured color.
    pub fn active(&self, key: &RollingGroupKey) -> Color {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => {
                let token = content.trim();
                match self.colors.lookup(token) {
                    Some(color) => color.clone(),
                    None => {
                        tracing::warn!(
                            path = %path.display(),
                            value = token,
                            "invalid active color, using {}",
                            self.colors.first()
                        );
                        self.colors.first().clone()
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => self.colors.first().clone(),
            Err(e) => {
                tracing::warn!(path = %path.display(), "cannot read active color: {}", e);
                self.colors.first().clone()
            }
        }
    }

    /// Atomically replace the active color for `key`.
    pub fn set_active(&self, key: &RollingGroupKey, color: &Color) -> io::Result<()> {
        if !self.colors.contains(color) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{color}' is not one of the configured colors {}", self.colors),
            ));
        }

        fs::create_dir_all(&self.dir)?;
        fs::set_permissions(&self.dir, fs::Permissions::from_mode(DIR_MODE))?;

        let path = self.path_for(key);
        let tmp = tmp_path(&path);

        fs::write(&tmp, color.as_str())?;
        fs::set_permissions(&tmp, fs::Permissions::from_mode(FILE_MODE))?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        tracing::info!(group = %key, color = %color, "active color updated");
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp.{}", std::process::id()))
}
