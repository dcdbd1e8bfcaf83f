//! Apply a changeset to a configuration artifact, with rollback on failure.
//!
//! The apply sequence is a two-phase commit with one compensating action:
//! back up, append, restart, poll readiness; on restart failure or
//! readiness timeout restore the backup and restart again best-effort. The
//! artifact is never left in the post-mutation state with the service down.

use crate::backup::Backup;
use crate::changeset::Changeset;
use crate::error::{ReconcileError, ServiceError};
use crate::service::ServiceHandle;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::time::{Instant, sleep};
use tracing::{info, warn};

/// Interval between readiness probes.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Why an apply was rolled back.
#[derive(Debug, Error)]
pub enum RevertReason {
    #[error("service restart failed: {0}")]
    RestartFailed(ServiceError),

    #[error("service not ready within {0:?}")]
    ReadyTimeout(Duration),
}

/// Final state of an apply operation.
///
/// `Reverted` is not an error: the requested change did not take effect and
/// the artifact was returned to its prior known-good state.
#[derive(Debug)]
pub enum Outcome {
    /// The changeset is live and the service reported ready. The backup is
    /// retained, never deleted by the reconciler.
    Applied { backup: Option<PathBuf> },

    /// The artifact was restored from the backup after the failure carried
    /// in `reason`.
    Reverted {
        reason: RevertReason,
        backup: PathBuf,
    },
}

/// Apply `changeset` to the artifact at `path`, restart `service`, and
/// verify readiness within `ready_timeout`.
///
/// Preconditions, checked before any side effect: the artifact must exist
/// (`ArtifactNotFound`) and `ready_timeout` must be positive
/// (`InvalidTimeout`). An empty changeset succeeds immediately with no
/// backup and no restart.
///
/// Concurrent applies against the same `path` are not supported; the caller
/// serializes reconciliations, one per artifact at a time.
///
/// Cancellation: if the returned future is dropped between the append and
/// the verdict, the artifact content is restored from the backup before the
/// drop completes. The post-revert service restart cannot run in that path
/// and is logged as skipped.
pub async fn apply(
    path: &Path,
    changeset: &Changeset,
    service: &dyn ServiceHandle,
    ready_timeout: Duration,
) -> Result<Outcome, ReconcileError> {
    if ready_timeout.is_zero() {
        return Err(ReconcileError::InvalidTimeout);
    }
    if !path.is_file() {
        return Err(ReconcileError::ArtifactNotFound(path.to_path_buf()));
    }
    if changeset.is_empty() {
        info!(path = %path.display(), "empty changeset, nothing to apply");
        return Ok(Outcome::Applied { backup: None });
    }

    let backup = Backup::create(path)?;
    info!(
        path = %path.display(),
        backup = %backup.path().display(),
        lines = changeset.lines().len(),
        "applying changeset"
    );
    append(path, &changeset.render(backup.content()))?;

    let mut guard = RevertGuard::armed(path, backup.content());

    let reason = match service.restart().await {
        Ok(()) => {
            if await_ready(service, ready_timeout).await {
                guard.disarm();
                info!(path = %path.display(), "changeset applied, service ready");
                return Ok(Outcome::Applied {
                    backup: Some(backup.path().to_path_buf()),
                });
            }
            RevertReason::ReadyTimeout(ready_timeout)
        }
        Err(e) => RevertReason::RestartFailed(e),
    };

    // Guard stays armed until the restore lands; if it fails here the drop
    // handler makes one more attempt before the error surfaces.
    backup.restore(path)?;
    guard.disarm();
    warn!(
        path = %path.display(),
        reason = %reason,
        backup = %backup.path().display(),
        "apply failed, artifact restored from backup"
    );
    if let Err(e) = service.restart().await {
        warn!(error = %e, "restart after revert failed; artifact matches backup");
    }
    Ok(Outcome::Reverted {
        reason,
        backup: backup.path().to_path_buf(),
    })
}

/// Poll `is_ready()` until it reports true or the timeout elapses.
///
/// Sleeps between probes so cooperative runtimes can schedule other work.
async fn await_ready(service: &dyn ServiceHandle, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if service.is_ready().await {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(POLL_INTERVAL).await;
    }
}

fn append(path: &Path, bytes: &[u8]) -> Result<(), ReconcileError> {
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| ReconcileError::io(path, e))?;
    file.write_all(bytes).map_err(|e| ReconcileError::io(path, e))
}

/// Restores the artifact content if the apply future is dropped between
/// mutation and verdict. Disarmed on both the applied and the reverted
/// paths, where restoration (if any) happens inline with error reporting.
struct RevertGuard<'a> {
    path: &'a Path,
    content: &'a [u8],
    armed: bool,
}

impl<'a> RevertGuard<'a> {
    fn armed(path: &'a Path, content: &'a [u8]) -> Self {
        Self {
            path,
            content,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for RevertGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::write(self.path, self.content) {
            Ok(()) => warn!(
                path = %self.path.display(),
                "apply cancelled, artifact restored from backup; service restart skipped"
            ),
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "apply cancelled and restore failed; recover manually from the backup file"
            ),
        }
    }
}
