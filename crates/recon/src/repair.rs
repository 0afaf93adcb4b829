//! Link Repairer: stale-link repair and unlinked↔orphaned pairing.
//!
//! Planning is pure (snapshot in, repair units out); the orchestrator
//! executes each unit in its own transaction. A planned repair may carry
//! fallback candidates: when a deterministically derived identifier turns
//! out to be taken, the next candidate (alternate derivation) is tried once
//! before the unit is counted as failed.

use chrono::Utc;

use pricegraph_catalog::{
    derived_price_set_id, retry_price_set_id, PriceSet, VariantPriceSetLink,
};
use pricegraph_core::{LinkId, PriceSetId, VariantId};
use pricegraph_store::{CatalogMutation, CatalogSnapshot, RepairUnit};

use crate::pairing::LinkPairingStrategy;

/// One planned repair: candidates are tried in order, moving on only when a
/// candidate fails with an identifier collision.
#[derive(Debug, Clone)]
pub struct PlannedRepair {
    pub subject: String,
    pub candidates: Vec<RepairUnit>,
}

impl PlannedRepair {
    fn single(subject: String, mutations: Vec<CatalogMutation>) -> Self {
        Self {
            candidates: vec![RepairUnit::new(subject.clone(), mutations)],
            subject,
        }
    }
}

impl From<RepairUnit> for PlannedRepair {
    fn from(unit: RepairUnit) -> Self {
        Self {
            subject: unit.subject.clone(),
            candidates: vec![unit],
        }
    }
}

/// Plan repairs for stale links: active links whose target price set is
/// soft-deleted or absent.
///
/// - Soft-deleted target: restore it in place (prices preserved, link kept).
/// - Absent target: mint a price set with an id derived from the variant id,
///   soft-delete the stale link, create a fresh link. If the derived id is
///   already a row: reuse it when it is unclaimed, otherwise fall back to
///   the alternate derivation.
pub fn plan_stale_link_repairs(
    snapshot: &CatalogSnapshot,
    stale_links: &[LinkId],
) -> Vec<PlannedRepair> {
    let mut planned = Vec::with_capacity(stale_links.len());
    for link_id in stale_links {
        let Some(link) = snapshot.link(*link_id) else {
            continue;
        };
        match snapshot.price_set(link.price_set_id) {
            Some(set) if !set.is_active() => {
                planned.push(PlannedRepair::single(
                    link.id.to_string(),
                    vec![CatalogMutation::RestorePriceSet(set.id)],
                ));
            }
            Some(_) => {
                // Active target: not actually stale; audit raced a writer.
                continue;
            }
            None => {
                planned.push(plan_missing_target(snapshot, link));
            }
        }
    }
    planned
}

fn plan_missing_target(snapshot: &CatalogSnapshot, link: &VariantPriceSetLink) -> PlannedRepair {
    let variant = link.variant_id;
    let mut candidates = Vec::new();
    for id in [derived_price_set_id(variant), retry_price_set_id(variant)] {
        if let Some(unit) = relink_candidate(snapshot, link, id) {
            candidates.push(unit);
        }
    }
    PlannedRepair {
        subject: link.id.to_string(),
        candidates,
    }
}

/// Build the unit that points `link`'s variant at price set `id`, creating,
/// restoring or reusing that set as the snapshot dictates. `None` when the
/// id is claimed by another variant's link (collision).
fn relink_candidate(
    snapshot: &CatalogSnapshot,
    link: &VariantPriceSetLink,
    id: PriceSetId,
) -> Option<RepairUnit> {
    let mut mutations = Vec::new();
    match snapshot.price_set(id) {
        None => {
            mutations.push(CatalogMutation::CreatePriceSet(PriceSet::new(
                id,
                Utc::now(),
            )));
        }
        Some(existing) => {
            let claimed_elsewhere = snapshot
                .active_links()
                .any(|l| l.price_set_id == id && l.variant_id != link.variant_id);
            if claimed_elsewhere {
                return None;
            }
            // A previous partial run already minted this set; reuse it,
            // restoring first if that run was rolled over mid-way.
            if !existing.is_active() {
                mutations.push(CatalogMutation::RestorePriceSet(id));
            }
        }
    }
    mutations.push(CatalogMutation::SoftDeleteLink(link.id));
    mutations.push(CatalogMutation::CreateLink(VariantPriceSetLink::new(
        link.variant_id,
        id,
    )));
    Some(RepairUnit::new(link.id.to_string(), mutations))
}

/// Plan pairings between unlinked variants and orphaned priced sets.
///
/// One unit per pair, each creating a single fresh link. Reuses migrated
/// pricing data instead of discarding it.
pub fn plan_pairings(
    snapshot: &CatalogSnapshot,
    strategy: &dyn LinkPairingStrategy,
    unlinked: &[VariantId],
    orphaned: &[PriceSetId],
) -> Vec<PlannedRepair> {
    strategy
        .pair(snapshot, unlinked, orphaned)
        .into_iter()
        .map(|(variant, set)| {
            PlannedRepair::single(
                variant.to_string(),
                vec![CatalogMutation::CreateLink(VariantPriceSetLink::new(
                    variant, set,
                ))],
            )
        })
        .collect()
}
