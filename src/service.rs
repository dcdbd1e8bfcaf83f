//! External service control.
//!
//! The reconciler never owns the service process; it only asks it to
//! restart and probes whether it came back. Both actions are injected
//! through [`ServiceHandle`] so the core stays testable with an in-process
//! fake.

use crate::error::ServiceError;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Handle to the external service that consumes the configuration artifact.
#[async_trait]
pub trait ServiceHandle: Send + Sync {
    /// Restart the service so it rereads its configuration.
    async fn restart(&self) -> Result<(), ServiceError>;

    /// Probe whether the service is serving again.
    ///
    /// One bounded probe per call; the reconciler owns the polling loop and
    /// its deadline.
    async fn is_ready(&self) -> bool;
}

/// Drives a real service through external commands (a process manager,
/// `pg_ctl`, an init script, ...).
///
/// Commands run via `sh -c`; an exit status of zero means success for the
/// restart command and "ready" for the probe command.
pub struct CommandService {
    restart: String,
    probe: String,
}

impl CommandService {
    pub fn new(restart: impl Into<String>, probe: impl Into<String>) -> Self {
        Self {
            restart: restart.into(),
            probe: probe.into(),
        }
    }
}

#[async_trait]
impl ServiceHandle for CommandService {
    async fn restart(&self) -> Result<(), ServiceError> {
        debug!(command = %self.restart, "restarting service");
        let status = shell(&self.restart).status().await?;
        if status.success() {
            Ok(())
        } else {
            Err(ServiceError::Exited(status))
        }
    }

    async fn is_ready(&self) -> bool {
        match shell(&self.probe).status().await {
            Ok(status) => status.success(),
            Err(e) => {
                debug!(command = %self.probe, error = %e, "probe command failed to spawn");
                false
            }
        }
    }
}

fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_restart_success_on_zero_exit() {
        let service = CommandService::new("true", "true");
        assert!(service.restart().await.is_ok());
    }

    #[tokio::test]
    async fn test_restart_failure_on_nonzero_exit() {
        let service = CommandService::new("false", "true");
        assert!(matches!(
            service.restart().await,
            Err(ServiceError::Exited(_))
        ));
    }

    #[tokio::test]
    async fn test_probe_maps_exit_status_to_readiness() {
        let ready = CommandService::new("true", "true");
        assert!(ready.is_ready().await);
        let not_ready = CommandService::new("true", "false");
        assert!(!not_ready.is_ready().await);
    }
}
