//! The `CatalogStore` seam.

use crate::error::StoreError;
use crate::mutation::RepairUnit;
use crate::snapshot::CatalogSnapshot;

/// Read/write contract against the catalog persistence.
///
/// Implementations must guarantee:
///
/// - `snapshot` returns every row **including soft-deleted ones**; two
///   snapshots with no intervening writes are identical.
/// - `apply_unit` is atomic: either every mutation in the unit commits, or
///   none do and the store is unchanged (per-unit rollback).
/// - No operation ever hard-deletes a row.
///
/// The orchestrator receives a handle to this trait at construction —
/// explicit dependency injection, no ambient lookup.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync {
    /// Read a point-in-time copy of the whole graph.
    async fn snapshot(&self) -> Result<CatalogSnapshot, StoreError>;

    /// Apply one repair unit atomically.
    async fn apply_unit(&self, unit: &RepairUnit) -> Result<(), StoreError>;
}
