//! In-memory catalog store.
//!
//! Intended for tests/dev. Applies each unit against a working copy and
//! swaps it in on success, which gives the same per-unit rollback semantics
//! as the Postgres implementation's transactions.

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use pricegraph_core::{Lifecycle, LinkId, PriceId, PriceSetId, VariantId};
use pricegraph_catalog::{Price, PriceSet, Variant, VariantPriceSetLink};

use crate::error::StoreError;
use crate::mutation::{CatalogMutation, RepairUnit};
use crate::snapshot::CatalogSnapshot;
use crate::r#trait::CatalogStore;

#[derive(Debug, Clone, Default)]
struct State {
    variants: BTreeMap<VariantId, Variant>,
    price_sets: BTreeMap<PriceSetId, PriceSet>,
    prices: BTreeMap<PriceId, Price>,
    links: BTreeMap<LinkId, VariantPriceSetLink>,
}

impl State {
    fn apply(&mut self, mutation: &CatalogMutation) -> Result<(), StoreError> {
        match mutation {
            CatalogMutation::CreatePriceSet(ps) => {
                if self.price_sets.contains_key(&ps.id) {
                    return Err(StoreError::DuplicateId(format!("price set {}", ps.id)));
                }
                self.price_sets.insert(ps.id, ps.clone());
            }
            CatalogMutation::CreateLink(link) => {
                if self.links.contains_key(&link.id) {
                    return Err(StoreError::DuplicateId(format!("link {}", link.id)));
                }
                self.links.insert(link.id, link.clone());
            }
            CatalogMutation::CreatePrice(price) => {
                if self.prices.contains_key(&price.id) {
                    return Err(StoreError::DuplicateId(format!("price {}", price.id)));
                }
                self.prices.insert(price.id.clone(), price.clone());
            }
            CatalogMutation::SoftDeleteLink(id) => {
                let link = self
                    .links
                    .get_mut(id)
                    .ok_or_else(|| StoreError::Unit(format!("link {id} not found")))?;
                link.lifecycle.delete();
            }
            CatalogMutation::SoftDeletePrice(id) => {
                let price = self
                    .prices
                    .get_mut(id)
                    .ok_or_else(|| StoreError::Unit(format!("price {id} not found")))?;
                price.lifecycle.delete();
            }
            CatalogMutation::RestorePriceSet(id) => {
                let set = self
                    .price_sets
                    .get_mut(id)
                    .ok_or_else(|| StoreError::Unit(format!("price set {id} not found")))?;
                set.lifecycle.restore();
            }
        }
        Ok(())
    }
}

/// In-memory catalog store with per-unit rollback.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    state: RwLock<State>,
    mutations_applied: AtomicU64,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total mutations committed since construction. Lets tests assert that
    /// a second pipeline run performed zero writes.
    pub fn mutations_applied(&self) -> u64 {
        self.mutations_applied.load(Ordering::SeqCst)
    }

    pub fn seed_variant(&self, variant: Variant) {
        self.state
            .write()
            .expect("store lock poisoned")
            .variants
            .insert(variant.id, variant);
    }

    pub fn seed_price_set(&self, set: PriceSet) {
        self.state
            .write()
            .expect("store lock poisoned")
            .price_sets
            .insert(set.id, set);
    }

    pub fn seed_price(&self, price: Price) {
        self.state
            .write()
            .expect("store lock poisoned")
            .prices
            .insert(price.id.clone(), price);
    }

    pub fn seed_link(&self, link: VariantPriceSetLink) {
        self.state
            .write()
            .expect("store lock poisoned")
            .links
            .insert(link.id, link);
    }

    /// Seed a row pre-marked as soft-deleted (migration debris).
    pub fn seed_deleted_price_set(&self, mut set: PriceSet) {
        set.lifecycle = Lifecycle::Deleted;
        self.seed_price_set(set);
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn snapshot(&self) -> Result<CatalogSnapshot, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Connection("store lock poisoned".to_string()))?;
        Ok(CatalogSnapshot {
            variants: state.variants.values().cloned().collect(),
            price_sets: state.price_sets.values().cloned().collect(),
            prices: state.prices.values().cloned().collect(),
            links: state.links.values().cloned().collect(),
        })
    }

    async fn apply_unit(&self, unit: &RepairUnit) -> Result<(), StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Connection("store lock poisoned".to_string()))?;

        // Work on a copy; swap in only if the whole unit applies cleanly.
        let mut working = state.clone();
        for mutation in &unit.mutations {
            working.apply(mutation)?;
        }
        *state = working;
        self.mutations_applied
            .fetch_add(unit.mutations.len() as u64, Ordering::SeqCst);
        Ok(())
    }
}
