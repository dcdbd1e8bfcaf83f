//! reconcild - reversible reconciliation of externally consumed
//! configuration files.
//!
//! The core primitive is [`reconcile::apply`]: back up the artifact, append
//! a changeset, restart the consuming service, poll readiness, and restore
//! the backup if the service never comes back. The caller always learns the
//! final state: [`Outcome::Applied`] or [`Outcome::Reverted`], never a
//! half-applied artifact.

pub mod backup;
pub mod changeset;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod service;

pub use changeset::Changeset;
pub use error::{ReconcileError, ServiceError};
pub use reconcile::{Outcome, RevertReason, apply};
pub use service::{CommandService, ServiceHandle};
