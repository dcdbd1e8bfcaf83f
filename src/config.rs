//! Reconciliation plan loading and validation.
//!
//! A plan is a TOML file naming the artifact to mutate, the changeset file
//! whose lines get appended, and the commands that restart and probe the
//! service consuming the artifact.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Plan file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read plan file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse plan: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A reconciliation plan.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// The artifact to mutate and the changeset to apply to it.
    pub artifact: ArtifactConfig,
    /// How to restart and probe the consuming service.
    pub service: ServiceConfig,
}

/// Artifact and changeset locations.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactConfig {
    /// Path of the configuration artifact to mutate.
    pub path: String,
    /// File whose lines form the changeset to append.
    pub changeset: String,
}

/// External service control commands.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Command that restarts the service (run via `sh -c`).
    pub restart: String,
    /// Readiness probe command; exit status zero means ready.
    pub probe: String,
    /// Maximum seconds to wait for readiness after restart.
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,
}

fn default_ready_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load a plan from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Validation errors for a plan.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("artifact.path is required")]
    MissingArtifactPath,
    #[error("artifact.changeset is required")]
    MissingChangesetPath,
    #[error("service.restart is required")]
    MissingRestartCommand,
    #[error("service.probe is required")]
    MissingProbeCommand,
    #[error("service.ready_timeout_secs must be greater than zero")]
    ZeroReadyTimeout,
}

/// Validate a plan, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.artifact.path.is_empty() {
        errors.push(ValidationError::MissingArtifactPath);
    }
    if config.artifact.changeset.is_empty() {
        errors.push(ValidationError::MissingChangesetPath);
    }
    if config.service.restart.is_empty() {
        errors.push(ValidationError::MissingRestartCommand);
    }
    if config.service.probe.is_empty() {
        errors.push(ValidationError::MissingProbeCommand);
    }
    if config.service.ready_timeout_secs == 0 {
        errors.push(ValidationError::ZeroReadyTimeout);
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
