//! Link Auditor: read-only anomaly classification.
//!
//! A pure function of the snapshot — auditing the same snapshot twice yields
//! identical sets, and nothing here mutates the store.

use serde::{Deserialize, Serialize};

use pricegraph_core::{LinkId, PriceSetId, VariantId};
use pricegraph_store::CatalogSnapshot;

/// The four anomaly categories in the variant→price graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Anomalies {
    /// (a) Active variants with no active link, creation order ascending.
    pub unlinked_variants: Vec<VariantId>,
    /// (b) Active links whose target price set is absent or soft-deleted.
    pub stale_links: Vec<LinkId>,
    /// (c) Active price sets reachable via an active link but holding zero
    /// active prices.
    pub empty_linked_sets: Vec<PriceSetId>,
    /// (d) Active price sets with at least one active price but no active
    /// link, creation order ascending.
    pub orphaned_priced_sets: Vec<PriceSetId>,
}

impl Anomalies {
    pub fn counts(&self) -> AnomalyCounts {
        AnomalyCounts {
            unlinked_variants: self.unlinked_variants.len(),
            stale_links: self.stale_links.len(),
            empty_linked_sets: self.empty_linked_sets.len(),
            orphaned_priced_sets: self.orphaned_priced_sets.len(),
        }
    }
}

/// Set sizes per anomaly category, as carried in the report.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyCounts {
    pub unlinked_variants: usize,
    pub stale_links: usize,
    pub empty_linked_sets: usize,
    pub orphaned_priced_sets: usize,
}

impl AnomalyCounts {
    pub fn total(&self) -> usize {
        self.unlinked_variants
            + self.stale_links
            + self.empty_linked_sets
            + self.orphaned_priced_sets
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }
}

/// Classify the current graph into the four anomaly sets.
pub fn audit(snapshot: &CatalogSnapshot) -> Anomalies {
    let linked_variants = snapshot.linked_variant_ids();
    let linked_sets = snapshot.linked_price_set_ids();
    let price_counts = snapshot.active_price_counts();

    let mut unlinked: Vec<_> = snapshot
        .active_variants()
        .filter(|v| !linked_variants.contains(&v.id))
        .map(|v| (v.created_at, v.id))
        .collect();
    unlinked.sort();
    let unlinked_variants = unlinked.into_iter().map(|(_, id)| id).collect();

    let mut stale_links: Vec<LinkId> = snapshot
        .active_links()
        .filter(|l| {
            snapshot
                .price_set(l.price_set_id)
                .is_none_or(|ps| !ps.is_active())
        })
        .map(|l| l.id)
        .collect();
    stale_links.sort();

    let mut empty_linked_sets: Vec<PriceSetId> = snapshot
        .price_sets
        .iter()
        .filter(|ps| ps.is_active() && linked_sets.contains(&ps.id))
        .filter(|ps| price_counts.get(&ps.id).copied().unwrap_or(0) == 0)
        .map(|ps| ps.id)
        .collect();
    empty_linked_sets.sort();

    let mut orphaned: Vec<_> = snapshot
        .price_sets
        .iter()
        .filter(|ps| ps.is_active() && !linked_sets.contains(&ps.id))
        .filter(|ps| price_counts.get(&ps.id).copied().unwrap_or(0) > 0)
        .map(|ps| (ps.created_at, ps.id))
        .collect();
    orphaned.sort();
    let orphaned_priced_sets = orphaned.into_iter().map(|(_, id)| id).collect();

    Anomalies {
        unlinked_variants,
        stale_links,
        empty_linked_sets,
        orphaned_priced_sets,
    }
}
