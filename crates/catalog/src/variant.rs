//! Variant rows: one purchasable configuration of a product.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pricegraph_core::{DomainError, DomainResult, Lifecycle, VariantId};

/// A sellable product variant as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,
    pub sku: String,
    pub created_at: DateTime<Utc>,
    pub lifecycle: Lifecycle,
}

impl Variant {
    pub fn new(
        id: VariantId,
        sku: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let sku = sku.into();
        if sku.trim().is_empty() {
            return Err(DomainError::validation("variant sku must not be empty"));
        }
        Ok(Self {
            id,
            sku,
            created_at,
            lifecycle: Lifecycle::Active,
        })
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }
}
