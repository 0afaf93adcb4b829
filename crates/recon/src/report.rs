//! Structured reconciliation report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audit::AnomalyCounts;
use crate::error::UnitFailure;

/// Counts of successfully repaired units per stage.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairedCounts {
    /// Stale links resolved (restores plus re-mints).
    pub stale_links: u64,
    /// Unlinked variants paired with orphaned priced sets.
    pub pairings: u64,
    /// Duplicate price rows soft-deleted.
    pub duplicate_prices_removed: u64,
    /// Placeholder prices injected.
    pub placeholders_injected: u64,
}

/// What one reconciliation run found, fixed, and failed to fix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Anomaly counts from the opening audit.
    pub counts_before: AnomalyCounts,
    /// Anomaly counts from the closing audit.
    pub counts_after: AnomalyCounts,
    pub repaired: RepairedCounts,
    /// Unit-level failures: rolled back, logged, and carried here.
    pub failures: Vec<UnitFailure>,
    /// True when the run was cancelled between units.
    pub cancelled: bool,
}

impl ReconciliationReport {
    /// Whether the run finished its whole job: zero anomalies left and zero
    /// failed units. Drives the operator command's exit status.
    ///
    /// Failed units are checked on top of the closing audit because not
    /// every leftover is link-shaped: a failed dedupe unit leaves duplicate
    /// overrides behind, which the four link-anomaly categories cannot see.
    pub fn is_clean(&self) -> bool {
        self.counts_after.is_clean() && self.failures.is_empty()
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
