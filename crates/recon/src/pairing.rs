//! Pairing strategies for unlinked variants and orphaned priced sets.
//!
//! The true historical variant↔price-set mapping is lost after migration, so
//! pairing is a named, swappable heuristic. If migration metadata that
//! recovers the exact mapping becomes available, implement this trait and
//! hand it to the orchestrator; nothing else in the pipeline changes.

use pricegraph_core::{PriceSetId, VariantId};
use pricegraph_store::CatalogSnapshot;

/// Decides which unlinked variant gets which orphaned priced set.
pub trait LinkPairingStrategy: Send + Sync {
    /// Produce (variant, price set) pairs. Inputs are the audit's unlinked
    /// and orphaned sets; every returned id must come from them. Surplus
    /// entries on either side are simply left unpaired.
    fn pair(
        &self,
        snapshot: &CatalogSnapshot,
        unlinked: &[VariantId],
        orphaned: &[PriceSetId],
    ) -> Vec<(VariantId, PriceSetId)>;

    /// Name used in logs and reports.
    fn name(&self) -> &'static str;
}

/// Default strategy: sort both sides by ascending creation time and pair
/// index-for-index up to the shorter list's length.
///
/// Best-effort, not a correctness guarantee: it reproduces the historical
/// mapping only when both counts are equal and creation order is meaningful.
/// It favors reusing migrated pricing data over discarding it; surplus
/// entries on either side stay unpaired, are reported as remaining
/// anomalies, and are left for manual review.
#[derive(Debug, Default)]
pub struct CreationOrderPairing;

impl LinkPairingStrategy for CreationOrderPairing {
    fn pair(
        &self,
        snapshot: &CatalogSnapshot,
        unlinked: &[VariantId],
        orphaned: &[PriceSetId],
    ) -> Vec<(VariantId, PriceSetId)> {
        let mut variants: Vec<VariantId> = unlinked.to_vec();
        variants.sort_by_key(|id| (snapshot.variant(*id).map(|v| v.created_at), *id));

        let mut sets: Vec<PriceSetId> = orphaned.to_vec();
        sets.sort_by_key(|id| (snapshot.price_set(*id).map(|ps| ps.created_at), *id));

        variants.into_iter().zip(sets).collect()
    }

    fn name(&self) -> &'static str {
        "creation-order"
    }
}
