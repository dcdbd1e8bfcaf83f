//! Integration test common infrastructure.
//!
//! Provides a scriptable in-process service and temp artifact helpers for
//! exercising the apply/revert flow without a real process manager.

use async_trait::async_trait;
use reconcild::error::ServiceError;
use reconcild::service::ServiceHandle;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Readiness behavior for [`FakeService`].
pub enum Ready {
    Always,
    Never,
    /// Ready from the nth probe onward (1-based).
    AfterProbes(usize),
}

/// Scriptable stand-in for the external service.
pub struct FakeService {
    ready: Ready,
    fail_restart: bool,
    pub restarts: AtomicUsize,
    pub probes: AtomicUsize,
}

impl FakeService {
    pub fn ready() -> Self {
        Self::new(Ready::Always, false)
    }

    pub fn never_ready() -> Self {
        Self::new(Ready::Never, false)
    }

    pub fn ready_after(probes: usize) -> Self {
        Self::new(Ready::AfterProbes(probes), false)
    }

    /// Every restart fails, including the best-effort one after a revert.
    pub fn failing_restart() -> Self {
        Self::new(Ready::Always, true)
    }

    fn new(ready: Ready, fail_restart: bool) -> Self {
        Self {
            ready,
            fail_restart,
            restarts: AtomicUsize::new(0),
            probes: AtomicUsize::new(0),
        }
    }

    pub fn restart_count(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceHandle for FakeService {
    async fn restart(&self) -> Result<(), ServiceError> {
        self.restarts.fetch_add(1, Ordering::SeqCst);
        if self.fail_restart {
            Err(ServiceError::Failed("injected restart failure".into()))
        } else {
            Ok(())
        }
    }

    async fn is_ready(&self) -> bool {
        let made = self.probes.fetch_add(1, Ordering::SeqCst) + 1;
        match self.ready {
            Ready::Always => true,
            Ready::Never => false,
            Ready::AfterProbes(n) => made >= n,
        }
    }
}

/// Create a temp directory holding an artifact with the given content.
pub fn artifact_with(content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("service.conf");
    std::fs::write(&path, content).expect("write artifact");
    (dir, path)
}

/// Read the artifact back as a string.
pub fn content_of(path: &Path) -> String {
    std::fs::read_to_string(path).expect("read artifact")
}
