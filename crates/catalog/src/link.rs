//! Variant→price-set link rows.

use serde::{Deserialize, Serialize};

use pricegraph_core::{Lifecycle, LinkId, PriceSetId, VariantId};

/// Join row mapping exactly one variant to one price set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantPriceSetLink {
    pub id: LinkId,
    pub variant_id: VariantId,
    pub price_set_id: PriceSetId,
    pub lifecycle: Lifecycle,
}

impl VariantPriceSetLink {
    pub fn new(variant_id: VariantId, price_set_id: PriceSetId) -> Self {
        Self {
            id: LinkId::new(),
            variant_id,
            price_set_id,
            lifecycle: Lifecycle::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }
}
