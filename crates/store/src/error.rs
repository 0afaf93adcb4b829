//! Store operation errors.
//!
//! These are **infrastructure errors** (connectivity, schema, row-level
//! update failures) as opposed to domain errors. Only [`StoreError::Connection`]
//! and [`StoreError::Schema`] abort a reconciliation run; everything else is
//! recovered per unit.

use thiserror::Error;

/// Catalog store operation error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot be reached. Fatal: aborts the run before any unit.
    #[error("store unreachable: {0}")]
    Connection(String),

    /// An expected relation or column is absent. Fatal: no safe repair
    /// strategy applies when the schema does not match assumptions.
    #[error("schema assumption violated: {0}")]
    Schema(String),

    /// A row with the given identifier already exists. The repairer retries
    /// derived-id creation once before demoting this to a unit failure.
    #[error("duplicate identifier: {0}")]
    DuplicateId(String),

    /// One unit's statement timeout elapsed. Counted as that unit's failure;
    /// the batch continues.
    #[error("unit timed out: {0}")]
    Timeout(String),

    /// A single unit failed to apply and was rolled back.
    #[error("unit failed: {0}")]
    Unit(String),
}

impl StoreError {
    /// Whether this error ends the whole run rather than one unit.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Connection(_) | StoreError::Schema(_))
    }
}
