//! Write units: batches of mutations the store applies atomically.
//!
//! The repairer plans work as [`RepairUnit`]s; the store commits each unit
//! in its own short transaction and rolls the whole unit back on failure.
//! Every mutation is lifecycle-respecting — nothing here can hard-delete.

use serde::{Deserialize, Serialize};

use pricegraph_core::{LinkId, PriceId, PriceSetId};
use pricegraph_catalog::{Price, PriceSet, VariantPriceSetLink};

/// One lifecycle-safe write against the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CatalogMutation {
    /// Insert a new price set. Fails with a duplicate-identifier error if a
    /// row with the id already exists in any lifecycle state.
    CreatePriceSet(PriceSet),
    /// Insert a new variant→price-set link.
    CreateLink(VariantPriceSetLink),
    /// Insert a new price row.
    CreatePrice(Price),
    /// Soft-delete an existing link.
    SoftDeleteLink(LinkId),
    /// Soft-delete an existing price row.
    SoftDeletePrice(PriceId),
    /// Clear the delete marker on a price set, preserving its prices.
    RestorePriceSet(PriceSetId),
}

/// An independently-committed batch of mutations.
///
/// `subject` names the entity the unit repairs (variant, link or price-set
/// id) and is what failure reports key on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairUnit {
    pub subject: String,
    pub mutations: Vec<CatalogMutation>,
}

impl RepairUnit {
    pub fn new(subject: impl Into<String>, mutations: Vec<CatalogMutation>) -> Self {
        Self {
            subject: subject.into(),
            mutations,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}
