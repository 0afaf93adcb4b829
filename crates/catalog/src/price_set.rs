//! Price set rows and deterministic identifier derivation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pricegraph_core::{Lifecycle, PriceSetId, VariantId};

/// Namespace for UUIDv5 derivation of synthetic price-set ids.
///
/// Fixed so that repeated reconciliation runs regenerate the same id for the
/// same variant, letting collision detection stand in for duplicate creation.
const DERIVED_ID_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6b, 0x1c, 0x6f, 0x8a, 0x1d, 0x2e, 0x4f, 0x30, 0x9a, 0x51, 0xc0, 0xde, 0x70, 0x5e, 0x75, 0xd1,
]);

/// The group of prices for one sellable thing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSet {
    pub id: PriceSetId,
    pub created_at: DateTime<Utc>,
    pub lifecycle: Lifecycle,
}

impl PriceSet {
    pub fn new(id: PriceSetId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at,
            lifecycle: Lifecycle::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }
}

/// Derive the synthetic price-set id for a variant (UUIDv5, stable across runs).
pub fn derived_price_set_id(variant: VariantId) -> PriceSetId {
    PriceSetId::from_uuid(Uuid::new_v5(
        &DERIVED_ID_NAMESPACE,
        variant.as_uuid().as_bytes(),
    ))
}

/// Alternate derivation used for the single retry after an id collision.
pub fn retry_price_set_id(variant: VariantId) -> PriceSetId {
    let name = format!("{variant}#retry");
    PriceSetId::from_uuid(Uuid::new_v5(&DERIVED_ID_NAMESPACE, name.as_bytes()))
}
