//! Price Deduplicator: collapse duplicate overrides to one canonical row.
//!
//! Groups active prices by `(price_set_id, price_list_id, currency_code)`
//! and soft-deletes all but one member of every group with more than one.
//! Idempotent: once every group is a singleton, a second pass plans nothing.

use std::collections::BTreeMap;

use pricegraph_catalog::Price;
use pricegraph_core::{CurrencyCode, PriceListId, PriceSetId};
use pricegraph_store::{CatalogMutation, CatalogSnapshot, RepairUnit};

type OverrideKey = (PriceSetId, Option<PriceListId>, CurrencyCode);

/// Pick the row to keep out of a duplicate group.
///
/// Precedence: a "simple" id (one that does not textually embed the
/// price-list id) beats a migration-derived one; then the amount with the
/// fewest significant decimal digits (a deliberately entered value rather
/// than a computed one); remaining ties break by id so the choice is stable
/// across runs.
fn keeper_rank(price: &Price) -> (bool, u8, pricegraph_core::PriceId) {
    (
        price.has_derived_id(),
        price.amount.significant_decimal_digits(),
        price.id.clone(),
    )
}

/// Plan one repair unit per duplicate group, soft-deleting every loser.
pub fn plan_dedupe(snapshot: &CatalogSnapshot) -> Vec<RepairUnit> {
    let mut groups: BTreeMap<OverrideKey, Vec<&Price>> = BTreeMap::new();
    for price in snapshot.active_prices() {
        groups.entry(price.override_key()).or_default().push(price);
    }

    let mut units = Vec::new();
    for ((set_id, _, _), mut members) in groups {
        if members.len() < 2 {
            continue;
        }
        members.sort_by_key(|p| keeper_rank(p));
        let losers = &members[1..];
        units.push(RepairUnit::new(
            set_id.to_string(),
            losers
                .iter()
                .map(|p| CatalogMutation::SoftDeletePrice(p.id.clone()))
                .collect(),
        ));
    }
    units
}
