//! Point-in-time backups of a configuration artifact.
//!
//! A backup is a sibling file named `<artifact>.<YYYYMMDDHHMMSS>.bak`.
//! Backups are never auto-deleted: an apply that succeeded keeps its backup
//! around so the prior state stays recoverable until an operator purges it.

use crate::error::ReconcileError;
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Collision suffixes tried when two applies share a timestamp key.
const MAX_KEY_SUFFIX: u32 = 9999;

/// A saved copy of an artifact's content, taken before mutation.
#[derive(Debug)]
pub struct Backup {
    path: PathBuf,
    content: Vec<u8>,
}

impl Backup {
    /// Snapshot the artifact's current content into a timestamped sibling
    /// file.
    ///
    /// The key has second resolution; two applies within the same second
    /// are disambiguated with an increasing suffix
    /// (`<artifact>.<key>.1.bak`, ...). `BackupCollision` is returned only
    /// when the suffix space is exhausted, before anything is written.
    pub fn create(artifact: &Path) -> Result<Self, ReconcileError> {
        let content = fs::read(artifact).map_err(|e| ReconcileError::io(artifact, e))?;
        let key = Local::now().format("%Y%m%d%H%M%S").to_string();

        let candidate = backup_path(artifact, &key, None);
        if write_exclusive(&candidate, &content)? {
            debug!(backup = %candidate.display(), "backup created");
            return Ok(Self {
                path: candidate,
                content,
            });
        }
        for suffix in 1..=MAX_KEY_SUFFIX {
            let candidate = backup_path(artifact, &key, Some(suffix));
            if write_exclusive(&candidate, &content)? {
                debug!(backup = %candidate.display(), "backup created");
                return Ok(Self {
                    path: candidate,
                    content,
                });
            }
        }
        Err(ReconcileError::BackupCollision(artifact.to_path_buf()))
    }

    /// Path of the backup file on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The artifact content captured at backup time.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Overwrite the artifact with the saved content.
    pub fn restore(&self, artifact: &Path) -> Result<(), ReconcileError> {
        fs::write(artifact, &self.content).map_err(|e| ReconcileError::io(artifact, e))
    }
}

/// List an artifact's retained backups, newest first.
pub fn list(artifact: &Path) -> Result<Vec<PathBuf>, ReconcileError> {
    let parent = artifact.parent().unwrap_or_else(|| Path::new("."));
    let Some(stem) = artifact.file_name().and_then(|n| n.to_str()) else {
        return Ok(Vec::new());
    };
    let prefix = format!("{stem}.");

    let mut backups = Vec::new();
    let entries = fs::read_dir(parent).map_err(|e| ReconcileError::io(parent, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| ReconcileError::io(parent, e))?;
        if let Some(name) = entry.file_name().to_str()
            && name.starts_with(&prefix)
            && name.ends_with(".bak")
        {
            backups.push(entry.path());
        }
    }
    backups.sort();
    backups.reverse();
    Ok(backups)
}

fn backup_path(artifact: &Path, key: &str, suffix: Option<u32>) -> PathBuf {
    let stem = artifact.file_name().and_then(|n| n.to_str()).unwrap_or("artifact");
    let name = match suffix {
        None => format!("{stem}.{key}.bak"),
        Some(n) => format!("{stem}.{key}.{n}.bak"),
    };
    artifact.with_file_name(name)
}

/// Create `path` exclusively and write `content` into it.
///
/// Returns `Ok(false)` if the path already exists (key taken by an earlier
/// apply in the same second).
fn write_exclusive(path: &Path, content: &[u8]) -> Result<bool, ReconcileError> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            file.write_all(content)
                .map_err(|e| ReconcileError::io(path, e))?;
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(ReconcileError::io(path, e)),
    }
}
