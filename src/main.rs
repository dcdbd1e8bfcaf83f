//! reconcild - reversible configuration reconciler.
//!
//! Loads a reconciliation plan, appends the changeset to the artifact,
//! restarts the consuming service, and rolls back if it never becomes
//! ready. Exit codes: 0 applied, 1 reverted, 2 precondition or plan error.

use anyhow::Context;
use reconcild::backup;
use reconcild::changeset::Changeset;
use reconcild::config::{self, Config};
use reconcild::reconcile::{self, Outcome};
use reconcild::service::CommandService;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    match run().await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "reconciliation aborted");
            ExitCode::from(2)
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    let (plan_path, list_backups) = parse_args(std::env::args().skip(1))?;

    let config = Config::load(&plan_path)
        .with_context(|| format!("failed to load plan {plan_path}"))?;
    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "invalid plan");
        }
        anyhow::bail!("plan {plan_path} failed validation with {} error(s)", errors.len());
    }

    let artifact = Path::new(&config.artifact.path);

    if list_backups {
        for path in backup::list(artifact)? {
            println!("{}", path.display());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let changeset = Changeset::load(&config.artifact.changeset)
        .with_context(|| format!("failed to load changeset {}", config.artifact.changeset))?;
    let service = CommandService::new(&config.service.restart, &config.service.probe);
    let ready_timeout = Duration::from_secs(config.service.ready_timeout_secs);

    info!(
        artifact = %artifact.display(),
        changeset = %config.artifact.changeset,
        timeout_secs = config.service.ready_timeout_secs,
        "starting reconciliation"
    );

    match reconcile::apply(artifact, &changeset, &service, ready_timeout).await? {
        Outcome::Applied { backup } => {
            match backup {
                Some(path) => info!(backup = %path.display(), "applied; backup retained"),
                None => info!("applied; changeset was empty"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Reverted { reason, backup } => {
            warn!(
                reason = %reason,
                backup = %backup.display(),
                "changeset reverted; artifact matches pre-apply state"
            );
            Ok(ExitCode::from(1))
        }
    }
}

/// `reconcild [plan.toml] [--list-backups]`, plan defaults to
/// `reconcild.toml`. Unknown flags are rejected rather than mistaken for a
/// plan path.
fn parse_args(args: impl Iterator<Item = String>) -> anyhow::Result<(String, bool)> {
    let mut plan = "reconcild.toml".to_string();
    let mut list_backups = false;
    for arg in args {
        if arg == "--list-backups" {
            list_backups = true;
        } else if arg.starts_with('-') {
            anyhow::bail!("unknown flag: {arg}");
        } else {
            plan = arg;
        }
    }
    Ok((plan, list_backups))
}
