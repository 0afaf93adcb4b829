//! Black-box pipeline tests against the in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use pricegraph_catalog::{Price, PriceSet, Variant, VariantPriceSetLink};
use pricegraph_core::{Amount, CurrencyCode, Lifecycle, PriceSetId, VariantId};
use pricegraph_recon::{audit, ReconcileError, Reconciler, ReconcilerConfig};
use pricegraph_store::{
    CatalogMutation, CatalogSnapshot, CatalogStore, InMemoryCatalogStore, RepairUnit, StoreError,
};

fn aud() -> CurrencyCode {
    CurrencyCode::new("aud").unwrap()
}

fn usd() -> CurrencyCode {
    CurrencyCode::new("usd").unwrap()
}

fn reconciler(store: &Arc<InMemoryCatalogStore>) -> Reconciler {
    let handle: Arc<dyn CatalogStore> = Arc::clone(store) as Arc<dyn CatalogStore>;
    Reconciler::new(handle, ReconcilerConfig::new(usd()))
}

fn variant(sku: &str, offset_secs: i64) -> Variant {
    Variant::new(
        VariantId::new(),
        sku,
        Utc::now() + Duration::seconds(offset_secs),
    )
    .unwrap()
}

fn price_set(offset_secs: i64) -> PriceSet {
    PriceSet::new(PriceSetId::new(), Utc::now() + Duration::seconds(offset_secs))
}

fn real_price(set: PriceSetId, id: &str, major: i64) -> Price {
    Price::new(
        id.parse().unwrap(),
        set,
        None,
        aud(),
        Amount::from_major(major).unwrap(),
    )
}

/// Scenario A: an unlinked variant is paired with an orphaned priced set;
/// the migrated price survives and no placeholder is minted.
#[tokio::test]
async fn pairs_unlinked_variant_with_orphaned_priced_set() {
    let store = Arc::new(InMemoryCatalogStore::new());
    let v1 = variant("SKU-V1", 0);
    let p1 = price_set(0);
    store.seed_variant(v1.clone());
    store.seed_price_set(p1.clone());
    store.seed_price(real_price(p1.id, "price_p1", 120));

    let report = reconciler(&store).run().await.unwrap();

    assert!(report.is_clean());
    assert_eq!(report.repaired.pairings, 1);
    assert_eq!(report.repaired.placeholders_injected, 0);

    let snap = store.snapshot().await.unwrap();
    let link = snap
        .active_links()
        .find(|l| l.variant_id == v1.id)
        .expect("variant must be linked");
    assert_eq!(link.price_set_id, p1.id);

    let resolved: Vec<_> = snap.active_prices_of(p1.id).collect();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].amount, Amount::from_major(120).unwrap());
    assert_eq!(resolved[0].currency, aud());
}

/// Scenario B: a stale link to a soft-deleted price set is repaired by
/// restoring the set in place; its original price is intact and unduplicated.
#[tokio::test]
async fn restores_soft_deleted_price_set_behind_stale_link() {
    let store = Arc::new(InMemoryCatalogStore::new());
    let v2 = variant("SKU-V2", 0);
    let mut p2 = price_set(0);
    p2.lifecycle = Lifecycle::Deleted;
    let l1 = VariantPriceSetLink::new(v2.id, p2.id);
    store.seed_variant(v2.clone());
    store.seed_price_set(p2.clone());
    store.seed_price(real_price(p2.id, "price_p2", 80));
    store.seed_link(l1.clone());

    let report = reconciler(&store).run().await.unwrap();

    assert!(report.is_clean());
    assert_eq!(report.repaired.stale_links, 1);

    let snap = store.snapshot().await.unwrap();
    assert!(snap.price_set(p2.id).unwrap().is_active());
    let link = snap.link(l1.id).unwrap();
    assert!(link.is_active(), "original link must survive");
    assert_eq!(link.price_set_id, p2.id);
    assert_eq!(snap.active_prices_of(p2.id).count(), 1);
}

/// A stale link whose target row is gone entirely gets a freshly minted,
/// deterministically derived price set and a new link.
#[tokio::test]
async fn mints_derived_price_set_for_vanished_target() {
    let store = Arc::new(InMemoryCatalogStore::new());
    let v = variant("SKU-V3", 0);
    let gone = PriceSetId::new();
    let stale = VariantPriceSetLink::new(v.id, gone);
    store.seed_variant(v.clone());
    store.seed_link(stale.clone());

    let report = reconciler(&store).run().await.unwrap();

    assert!(report.is_clean());
    assert_eq!(report.repaired.stale_links, 1);
    // The empty minted set gets a placeholder in the same run.
    assert_eq!(report.repaired.placeholders_injected, 1);

    let snap = store.snapshot().await.unwrap();
    assert!(!snap.link(stale.id).unwrap().is_active());
    let derived = pricegraph_catalog::derived_price_set_id(v.id);
    let new_link = snap
        .active_links()
        .find(|l| l.variant_id == v.id)
        .expect("variant must be relinked");
    assert_eq!(new_link.price_set_id, derived);
    assert_eq!(snap.active_prices_of(derived).count(), 1);
}

/// Scenario C: of two duplicate overrides, the simple-id row survives and
/// the derived-id row is soft-deleted.
#[tokio::test]
async fn dedupe_keeps_the_simple_id_row() {
    let store = Arc::new(InMemoryCatalogStore::new());
    let v = variant("SKU-V4", 0);
    let p3 = price_set(0);
    store.seed_variant(v.clone());
    store.seed_price_set(p3.clone());
    store.seed_link(VariantPriceSetLink::new(v.id, p3.id));

    let list: pricegraph_core::PriceListId = "pl1".parse().unwrap();
    let row_a = Price::new(
        "price_abc".parse().unwrap(),
        p3.id,
        Some(list.clone()),
        aud(),
        Amount::from_major(199).unwrap(),
    );
    let row_b = Price::new(
        "price_pl1_aud".parse().unwrap(),
        p3.id,
        Some(list),
        aud(),
        Amount::from_major(199).unwrap(),
    );
    // A base price so the set is not "empty but linked".
    store.seed_price(real_price(p3.id, "price_base", 210));
    store.seed_price(row_a.clone());
    store.seed_price(row_b.clone());

    let report = reconciler(&store).run().await.unwrap();

    assert!(report.is_clean());
    assert_eq!(report.repaired.duplicate_prices_removed, 1);

    let snap = store.snapshot().await.unwrap();
    assert!(snap.price(&row_a.id).unwrap().is_active());
    assert!(!snap.price(&row_b.id).unwrap().is_active());
}

/// Scenario D: a linked price set with zero active prices receives exactly
/// one placeholder.
#[tokio::test]
async fn injects_placeholder_into_empty_linked_set() {
    let store = Arc::new(InMemoryCatalogStore::new());
    let v4 = variant("SKU-V5", 0);
    let p4 = price_set(0);
    store.seed_variant(v4.clone());
    store.seed_price_set(p4.clone());
    store.seed_link(VariantPriceSetLink::new(v4.id, p4.id));

    let report = reconciler(&store).run().await.unwrap();

    assert!(report.is_clean());
    assert_eq!(report.repaired.placeholders_injected, 1);

    let snap = store.snapshot().await.unwrap();
    let injected: Vec<_> = snap.active_prices_of(p4.id).collect();
    assert_eq!(injected.len(), 1);
    assert_eq!(injected[0].amount, Amount::MIN_POSITIVE);
    assert!(injected[0].price_list_id.is_none());
    assert_eq!(injected[0].currency, usd());
}

/// P5: N unlinked variants and N orphaned priced sets pair fully; zero
/// placeholders are created.
#[tokio::test]
async fn equal_counts_pair_without_any_placeholder() {
    let store = Arc::new(InMemoryCatalogStore::new());
    let mut variants = Vec::new();
    let mut sets = Vec::new();
    for i in 0..5 {
        let v = variant(&format!("SKU-{i}"), i);
        let ps = price_set(i);
        store.seed_variant(v.clone());
        store.seed_price_set(ps.clone());
        store.seed_price(real_price(ps.id, &format!("price_{i}"), 10 + i));
        variants.push(v);
        sets.push(ps);
    }

    let report = reconciler(&store).run().await.unwrap();

    assert!(report.is_clean());
    assert_eq!(report.repaired.pairings, 5);
    assert_eq!(report.repaired.placeholders_injected, 0);

    // Creation order is preserved pair-for-pair.
    let snap = store.snapshot().await.unwrap();
    for (v, ps) in variants.iter().zip(&sets) {
        let link = snap
            .active_links()
            .find(|l| l.variant_id == v.id)
            .expect("every variant linked");
        assert_eq!(link.price_set_id, ps.id);
    }
}

/// Surplus entries on either side stay unpaired and are reported as
/// remaining anomalies.
#[tokio::test]
async fn surplus_sides_are_handled_asymmetrically() {
    let store = Arc::new(InMemoryCatalogStore::new());
    // Two variants, one orphaned priced set.
    let v0 = variant("SKU-0", 0);
    let v1 = variant("SKU-1", 1);
    let ps = price_set(0);
    store.seed_variant(v0.clone());
    store.seed_variant(v1.clone());
    store.seed_price_set(ps.clone());
    store.seed_price(real_price(ps.id, "price_0", 40));

    let report = reconciler(&store).run().await.unwrap();

    assert_eq!(report.repaired.pairings, 1);
    // The unmatched variant has no link at all, so it stays anomalous
    // rather than receiving a synthetic price set.
    assert_eq!(report.counts_after.unlinked_variants, 1);
    assert!(!report.is_clean());

    let snap = store.snapshot().await.unwrap();
    let link = snap.active_links().next().unwrap();
    assert_eq!(link.variant_id, v0.id, "older variant pairs first");
}

/// P1: a second run over a reconciled store performs zero mutations.
#[tokio::test]
async fn second_run_writes_nothing() {
    let store = Arc::new(InMemoryCatalogStore::new());

    // A messy store: stale link, duplicate prices, unlinked variant with an
    // orphaned set, and an empty linked set.
    let v_stale = variant("SKU-A", 0);
    let mut dead_set = price_set(0);
    dead_set.lifecycle = Lifecycle::Deleted;
    store.seed_variant(v_stale.clone());
    store.seed_price_set(dead_set.clone());
    store.seed_price(real_price(dead_set.id, "price_dead", 15));
    store.seed_link(VariantPriceSetLink::new(v_stale.id, dead_set.id));

    let v_unlinked = variant("SKU-B", 1);
    let orphan = price_set(1);
    store.seed_variant(v_unlinked.clone());
    store.seed_price_set(orphan.clone());
    store.seed_price(real_price(orphan.id, "price_orphan", 25));
    store.seed_price(real_price(orphan.id, "price_orphan_dup", 25));

    let v_empty = variant("SKU-C", 2);
    let empty = price_set(2);
    store.seed_variant(v_empty.clone());
    store.seed_price_set(empty.clone());
    store.seed_link(VariantPriceSetLink::new(v_empty.id, empty.id));

    let first = reconciler(&store).run().await.unwrap();
    assert!(first.is_clean());
    let writes_after_first = store.mutations_applied();
    assert!(writes_after_first > 0);

    let second = reconciler(&store).run().await.unwrap();
    assert!(second.is_clean());
    assert_eq!(
        store.mutations_applied(),
        writes_after_first,
        "second run must be a no-op"
    );
    assert_eq!(second.counts_before.total(), 0);
}

/// P2–P4 over the same messy store: no dangling links, no empty exposed
/// sets, no duplicate overrides.
#[tokio::test]
async fn invariants_hold_after_a_run() {
    let store = Arc::new(InMemoryCatalogStore::new());
    let v = variant("SKU-A", 0);
    let mut dead_set = price_set(0);
    dead_set.lifecycle = Lifecycle::Deleted;
    store.seed_variant(v.clone());
    store.seed_price_set(dead_set.clone());
    store.seed_link(VariantPriceSetLink::new(v.id, dead_set.id));
    store.seed_price(real_price(dead_set.id, "price_x", 30));
    store.seed_price(real_price(dead_set.id, "price_y", 30));

    let report = reconciler(&store).run().await.unwrap();
    assert!(report.is_clean());

    let snap = store.snapshot().await.unwrap();
    // P2: every active link targets an active set.
    for link in snap.active_links() {
        assert!(snap.price_set(link.price_set_id).unwrap().is_active());
    }
    // P3: every linked set holds at least one active price.
    for set in snap.linked_price_set_ids() {
        assert!(snap.active_prices_of(set).next().is_some());
    }
    // P4: no two active prices share an override key.
    let mut keys = std::collections::HashSet::new();
    for price in snap.active_prices() {
        assert!(keys.insert(price.override_key()), "duplicate override");
    }
    // INV5: nothing was hard-deleted.
    assert_eq!(snap.prices.len(), 2, "soft-deleted rows remain present");

    // The audit agrees.
    assert!(audit(&snap).counts().is_clean());
}

/// Disabled stages are skipped and their anomalies survive the run.
#[tokio::test]
async fn stage_toggles_disable_repairs() {
    let store = Arc::new(InMemoryCatalogStore::new());
    let v = variant("SKU-A", 0);
    let ps = price_set(0);
    store.seed_variant(v.clone());
    store.seed_price_set(ps.clone());
    store.seed_link(VariantPriceSetLink::new(v.id, ps.id));

    let handle: Arc<dyn CatalogStore> = Arc::clone(&store) as Arc<dyn CatalogStore>;
    let mut config = ReconcilerConfig::new(usd());
    config.stages.placeholders = false;
    let report = Reconciler::new(handle, config).run().await.unwrap();

    assert_eq!(report.repaired.placeholders_injected, 0);
    assert_eq!(report.counts_after.empty_linked_sets, 1);
    assert!(!report.is_clean());
}

/// A pre-cancelled run touches nothing and says so in the report.
#[tokio::test]
async fn cancellation_takes_effect_between_units() {
    let store = Arc::new(InMemoryCatalogStore::new());
    let v = variant("SKU-A", 0);
    let ps = price_set(0);
    store.seed_variant(v.clone());
    store.seed_price_set(ps.clone());
    store.seed_price(real_price(ps.id, "price_a", 12));

    let recon = reconciler(&store);
    recon.cancel_flag().cancel();
    let report = recon.run().await.unwrap();

    assert!(report.cancelled);
    assert_eq!(store.mutations_applied(), 0);
    assert_eq!(report.counts_after.unlinked_variants, 1);
}

/// Store that rejects any unit containing a price soft-delete, simulating
/// row-level update failures on exactly the dedupe path.
struct PriceDeleteRejectingStore {
    inner: InMemoryCatalogStore,
}

#[async_trait]
impl CatalogStore for PriceDeleteRejectingStore {
    async fn snapshot(&self) -> Result<CatalogSnapshot, StoreError> {
        self.inner.snapshot().await
    }

    async fn apply_unit(&self, unit: &RepairUnit) -> Result<(), StoreError> {
        if unit
            .mutations
            .iter()
            .any(|m| matches!(m, CatalogMutation::SoftDeletePrice(_)))
        {
            return Err(StoreError::Unit("price row update failed".to_string()));
        }
        self.inner.apply_unit(unit).await
    }
}

/// A failed dedupe unit leaves duplicate overrides behind. The closing link
/// audit cannot see them, so the report must also weigh the failure list
/// before calling the run clean.
#[tokio::test]
async fn failed_dedupe_unit_means_not_clean() {
    let inner = InMemoryCatalogStore::new();
    let v = variant("SKU-A", 0);
    let ps = price_set(0);
    inner.seed_variant(v.clone());
    inner.seed_price_set(ps.clone());
    inner.seed_link(VariantPriceSetLink::new(v.id, ps.id));
    inner.seed_price(real_price(ps.id, "price_a", 30));
    inner.seed_price(real_price(ps.id, "price_b", 30));

    let store: Arc<dyn CatalogStore> = Arc::new(PriceDeleteRejectingStore { inner });
    let report = Reconciler::new(Arc::clone(&store), ReconcilerConfig::new(usd()))
        .run()
        .await
        .unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(
        report.failures[0].kind,
        pricegraph_recon::FailureKind::Repair
    );
    // Link categories look fine, but the duplicates are still there.
    assert!(report.counts_after.is_clean());
    let snap = store.snapshot().await.unwrap();
    assert_eq!(snap.active_prices_of(ps.id).count(), 2);
    assert!(
        !report.is_clean(),
        "a run with failed units must not report clean"
    );
}

/// Store that is down from the first read.
struct UnreachableStore;

#[async_trait]
impl CatalogStore for UnreachableStore {
    async fn snapshot(&self) -> Result<CatalogSnapshot, StoreError> {
        Err(StoreError::Connection("connection refused".to_string()))
    }

    async fn apply_unit(&self, _unit: &RepairUnit) -> Result<(), StoreError> {
        panic!("no unit may be attempted against an unreachable store");
    }
}

/// A connection failure aborts the run before any unit is attempted.
#[tokio::test]
async fn unreachable_store_aborts_before_any_unit() {
    let store: Arc<dyn CatalogStore> = Arc::new(UnreachableStore);
    let err = Reconciler::new(store, ReconcilerConfig::new(usd()))
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::Connection(_)));
}

/// Both the derived and the alternate identifier being claimed by other
/// variants demotes the unit to a counted collision failure.
#[tokio::test]
async fn double_collision_is_counted_not_fatal() {
    let store = Arc::new(InMemoryCatalogStore::new());
    let v = variant("SKU-A", 0);
    let stale = VariantPriceSetLink::new(v.id, PriceSetId::new());
    store.seed_variant(v.clone());
    store.seed_link(stale.clone());

    // Claim both derivations with other variants' active links.
    for id in [
        pricegraph_catalog::derived_price_set_id(v.id),
        pricegraph_catalog::retry_price_set_id(v.id),
    ] {
        let claimer = variant("SKU-X", 0);
        store.seed_variant(claimer.clone());
        let set = PriceSet::new(id, Utc::now());
        store.seed_price_set(set.clone());
        store.seed_price(real_price(id, &format!("price_{id}"), 9));
        store.seed_link(VariantPriceSetLink::new(claimer.id, id));
    }

    let report = reconciler(&store).run().await.unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(
        report.failures[0].kind,
        pricegraph_recon::FailureKind::Collision
    );
    assert_eq!(report.failures[0].subject, stale.id.to_string());
    // The stale link is still there; the run is honest about it.
    assert!(report.counts_after.stale_links >= 1);
    assert!(!report.is_clean());
}
