//! Read-only view of the catalog graph.

use std::collections::{HashMap, HashSet};

use pricegraph_core::{LinkId, PriceId, PriceSetId, VariantId};
use pricegraph_catalog::{Price, PriceSet, Variant, VariantPriceSetLink};

/// A point-in-time copy of all four row sets, **including soft-deleted rows**.
///
/// Soft-deleted rows are carried so the repairer can find restorable price
/// sets; the `active_*` accessors are what audit logic reads.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub variants: Vec<Variant>,
    pub price_sets: Vec<PriceSet>,
    pub prices: Vec<Price>,
    pub links: Vec<VariantPriceSetLink>,
}

impl CatalogSnapshot {
    pub fn active_variants(&self) -> impl Iterator<Item = &Variant> {
        self.variants.iter().filter(|v| v.is_active())
    }

    pub fn active_links(&self) -> impl Iterator<Item = &VariantPriceSetLink> {
        self.links.iter().filter(|l| l.is_active())
    }

    pub fn active_prices(&self) -> impl Iterator<Item = &Price> {
        self.prices.iter().filter(|p| p.is_active())
    }

    /// Look up a price set regardless of lifecycle state.
    pub fn price_set(&self, id: PriceSetId) -> Option<&PriceSet> {
        self.price_sets.iter().find(|ps| ps.id == id)
    }

    pub fn variant(&self, id: VariantId) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == id)
    }

    pub fn link(&self, id: LinkId) -> Option<&VariantPriceSetLink> {
        self.links.iter().find(|l| l.id == id)
    }

    pub fn price(&self, id: &PriceId) -> Option<&Price> {
        self.prices.iter().find(|p| &p.id == id)
    }

    /// Count of active prices per price set.
    pub fn active_price_counts(&self) -> HashMap<PriceSetId, usize> {
        let mut counts: HashMap<PriceSetId, usize> = HashMap::new();
        for price in self.active_prices() {
            *counts.entry(price.price_set_id).or_default() += 1;
        }
        counts
    }

    /// Price-set ids reachable via an active link.
    pub fn linked_price_set_ids(&self) -> HashSet<PriceSetId> {
        self.active_links().map(|l| l.price_set_id).collect()
    }

    /// Variant ids that hold at least one active link.
    pub fn linked_variant_ids(&self) -> HashSet<VariantId> {
        self.active_links().map(|l| l.variant_id).collect()
    }

    /// Active prices belonging to one price set.
    pub fn active_prices_of(&self, set: PriceSetId) -> impl Iterator<Item = &Price> {
        self.active_prices().filter(move |p| p.price_set_id == set)
    }
}
