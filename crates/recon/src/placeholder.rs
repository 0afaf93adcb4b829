//! Placeholder Price Injector: the last-resort guarantee that no linked
//! price set is exposed empty.
//!
//! Runs only after the link graph has stabilized — injecting earlier would
//! fill price sets that pairing could still have matched with real migrated
//! data. Never touches a set that already holds an active price.

use pricegraph_catalog::Price;
use pricegraph_core::{CurrencyCode, PriceSetId};
use pricegraph_store::{CatalogMutation, CatalogSnapshot, RepairUnit};

/// Plan one placeholder insertion per empty linked price set.
///
/// `empty_linked_sets` is the final audit's category (c); the snapshot is
/// re-checked so a set that gained a real price since the audit is skipped.
pub fn plan_placeholders(
    snapshot: &CatalogSnapshot,
    empty_linked_sets: &[PriceSetId],
    default_currency: &CurrencyCode,
) -> Vec<RepairUnit> {
    empty_linked_sets
        .iter()
        .filter(|set| snapshot.active_prices_of(**set).next().is_none())
        .map(|set| {
            RepairUnit::new(
                set.to_string(),
                vec![CatalogMutation::CreatePrice(Price::placeholder(
                    *set,
                    default_currency.clone(),
                ))],
            )
        })
        .collect()
}
