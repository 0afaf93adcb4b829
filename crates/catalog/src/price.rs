//! Price rows: one (currency, amount) pair in a price set, optionally
//! scoped to a price list.

use serde::{Deserialize, Serialize};

use pricegraph_core::{Amount, CurrencyCode, Lifecycle, PriceId, PriceListId, PriceSetId};

/// A single price row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub id: PriceId,
    pub price_set_id: PriceSetId,
    /// `None` for base prices; `Some` when the row is a price-list override.
    pub price_list_id: Option<PriceListId>,
    pub currency: CurrencyCode,
    pub amount: Amount,
    pub lifecycle: Lifecycle,
}

impl Price {
    pub fn new(
        id: PriceId,
        price_set_id: PriceSetId,
        price_list_id: Option<PriceListId>,
        currency: CurrencyCode,
        amount: Amount,
    ) -> Self {
        Self {
            id,
            price_set_id,
            price_list_id,
            currency,
            amount,
            lifecycle: Lifecycle::Active,
        }
    }

    /// Build the synthetic last-resort price for an empty linked price set:
    /// minimal positive amount, default currency, no price-list reference.
    ///
    /// Expected to be superseded later by a real price.
    pub fn placeholder(price_set_id: PriceSetId, currency: CurrencyCode) -> Self {
        Self::new(
            PriceId::new(),
            price_set_id,
            None,
            currency,
            Amount::MIN_POSITIVE,
        )
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle.is_active()
    }

    /// Whether this row's id was minted by migration tooling for its
    /// price list (as opposed to a hand-entered "simple" id).
    pub fn has_derived_id(&self) -> bool {
        match &self.price_list_id {
            Some(list) => self.id.embeds(list),
            None => false,
        }
    }

    /// The dedupe grouping key: one active row may exist per key.
    pub fn override_key(&self) -> (PriceSetId, Option<PriceListId>, CurrencyCode) {
        (
            self.price_set_id,
            self.price_list_id.clone(),
            self.currency.clone(),
        )
    }
}
