//! Unified error handling for reconcild.
//!
//! This module provides the error hierarchy for the reconciler, with
//! path-carrying I/O errors and metric labeling.

use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Reconcile Errors (apply preconditions and file operations)
// ============================================================================

/// Errors that can occur during an apply operation.
///
/// Precondition errors (`ArtifactNotFound`, `InvalidTimeout`, and
/// `BackupCollision`) are reported before anything is mutated. `Io` can
/// surface at any file step and carries the failing path.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("artifact not found: {0}")]
    ArtifactNotFound(PathBuf),

    #[error("ready timeout must be greater than zero")]
    InvalidTimeout,

    #[error("backup key space exhausted for {0}")]
    BackupCollision(PathBuf),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReconcileError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ArtifactNotFound(_) => "artifact_not_found",
            Self::InvalidTimeout => "invalid_timeout",
            Self::BackupCollision(_) => "backup_collision",
            Self::Io { .. } => "io_error",
        }
    }

    /// Wrap an I/O error with the path it occurred on.
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

// ============================================================================
// Service Errors (external restart/probe commands)
// ============================================================================

/// Errors from the external service handle.
///
/// "Could not be restarted at all" is distinct from "restarted but never
/// became ready"; the latter is a readiness timeout, not a `ServiceError`.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to spawn restart command: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("restart command exited with {0}")]
    Exited(std::process::ExitStatus),

    #[error("restart failed: {0}")]
    Failed(String),
}
