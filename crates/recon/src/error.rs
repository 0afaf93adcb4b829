//! Reconciliation error model.
//!
//! Two classes: fatal errors ([`ReconcileError`]) that abort the run, and
//! per-unit failures ([`UnitFailure`]) that are rolled back, logged, counted
//! and carried into the final report while the batch continues.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pricegraph_store::StoreError;

/// Fatal reconciliation error. Only connectivity and schema problems abort
/// a run; everything else is demoted to a counted unit failure.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("store unreachable: {0}")]
    Connection(String),

    #[error("schema assumption violated: {0}")]
    Schema(String),
}

impl ReconcileError {
    /// Promote a store error known to be fatal.
    pub(crate) fn from_fatal(err: StoreError) -> Self {
        match err {
            StoreError::Connection(msg) => Self::Connection(msg),
            StoreError::Schema(msg) => Self::Schema(msg),
            // Snapshot reads classify everything else as connectivity.
            other => Self::Connection(other.to_string()),
        }
    }
}

/// Category of a recovered unit-level failure.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A synthetic identifier collided twice (primary and retry derivation).
    Collision,
    /// The unit's statement timeout elapsed.
    Timeout,
    /// Any other row-level update failure.
    Repair,
}

/// One failed repair unit, rolled back and counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFailure {
    /// Pipeline stage the unit belonged to.
    pub stage: String,
    /// Entity the unit was repairing (variant, link or price-set id).
    pub subject: String,
    pub kind: FailureKind,
    pub message: String,
}

impl UnitFailure {
    pub fn new(
        stage: impl Into<String>,
        subject: impl Into<String>,
        kind: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            stage: stage.into(),
            subject: subject.into(),
            kind,
            message: message.into(),
        }
    }
}
