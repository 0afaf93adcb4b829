//! Reconciliation Orchestrator: sequences the stages into one idempotent,
//! re-runnable batch job.
//!
//! Fixed stage order: audit → stale-link repair → pairing → audit (re-scan)
//! → dedupe → audit (final) → placeholder injection → closing audit. The
//! ordering matters: injection must not run before the link graph has
//! stabilized, or it would fill price sets that pairing could still have
//! matched with real migrated data.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tracing::{info, warn};

use pricegraph_core::CurrencyCode;
use pricegraph_store::{CatalogStore, StoreError};

use crate::audit::audit;
use crate::dedupe::plan_dedupe;
use crate::error::{FailureKind, ReconcileError, UnitFailure};
use crate::pairing::{CreationOrderPairing, LinkPairingStrategy};
use crate::placeholder::plan_placeholders;
use crate::repair::{plan_pairings, plan_stale_link_repairs, PlannedRepair};
use crate::report::{ReconciliationReport, RepairedCounts};

/// Per-stage enable/disable switches.
#[derive(Debug, Copy, Clone)]
pub struct StageToggles {
    pub stale_links: bool,
    pub pairing: bool,
    pub dedupe: bool,
    pub placeholders: bool,
}

impl Default for StageToggles {
    fn default() -> Self {
        Self {
            stale_links: true,
            pairing: true,
            dedupe: true,
            placeholders: true,
        }
    }
}

/// Orchestrator configuration. Everything is injected; there is no ambient
/// state to look up.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Currency placeholder prices are minted in.
    pub default_currency: CurrencyCode,
    pub stages: StageToggles,
}

impl ReconcilerConfig {
    pub fn new(default_currency: CurrencyCode) -> Self {
        Self {
            default_currency,
            stages: StageToggles::default(),
        }
    }
}

/// Cooperative cancellation handle. Takes effect only between units, never
/// mid-transaction, so a cancelled run never leaves a half-committed unit.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The one entry point to the repair pipeline.
pub struct Reconciler {
    store: Arc<dyn CatalogStore>,
    config: ReconcilerConfig,
    strategy: Box<dyn LinkPairingStrategy>,
    cancel: CancelFlag,
}

impl Reconciler {
    pub fn new(store: Arc<dyn CatalogStore>, config: ReconcilerConfig) -> Self {
        Self {
            store,
            config,
            strategy: Box::new(CreationOrderPairing),
            cancel: CancelFlag::default(),
        }
    }

    /// Swap the pairing heuristic (e.g. once exact migration metadata exists).
    pub fn with_strategy(mut self, strategy: Box<dyn LinkPairingStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Handle for cancelling the run from another task.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Run the full pipeline once. Safe to re-run: every stage is
    /// idempotent, and a second run over a reconciled store writes nothing.
    pub async fn run(&self) -> Result<ReconciliationReport, ReconcileError> {
        let started_at = Utc::now();
        let mut failures = Vec::new();
        let mut repaired = RepairedCounts::default();
        let mut cancelled = false;
        let stages = self.config.stages;

        let opening = self
            .store
            .snapshot()
            .await
            .map_err(ReconcileError::from_fatal)?;
        let initial = audit(&opening);
        let counts_before = initial.counts();
        info!(
            unlinked_variants = counts_before.unlinked_variants,
            stale_links = counts_before.stale_links,
            empty_linked_sets = counts_before.empty_linked_sets,
            orphaned_priced_sets = counts_before.orphaned_priced_sets,
            "opening audit"
        );

        if stages.stale_links && !cancelled {
            let planned = plan_stale_link_repairs(&opening, &initial.stale_links);
            let (units, _) = self
                .execute("stale_links", planned, &mut failures, &mut cancelled)
                .await?;
            repaired.stale_links = units;
        }

        if stages.pairing && !cancelled {
            info!(strategy = self.strategy.name(), "pairing unlinked variants");
            let planned = plan_pairings(
                &opening,
                self.strategy.as_ref(),
                &initial.unlinked_variants,
                &initial.orphaned_priced_sets,
            );
            let (units, _) = self
                .execute("pairing", planned, &mut failures, &mut cancelled)
                .await?;
            repaired.pairings = units;
        }

        if stages.dedupe && !cancelled {
            let snapshot = self
                .store
                .snapshot()
                .await
                .map_err(ReconcileError::from_fatal)?;
            let rescan = audit(&snapshot).counts();
            info!(remaining = rescan.total(), "re-scan audit");

            let planned = plan_dedupe(&snapshot)
                .into_iter()
                .map(PlannedRepair::from)
                .collect();
            let (_, mutations) = self
                .execute("dedupe", planned, &mut failures, &mut cancelled)
                .await?;
            repaired.duplicate_prices_removed = mutations;
        }

        if stages.placeholders && !cancelled {
            let snapshot = self
                .store
                .snapshot()
                .await
                .map_err(ReconcileError::from_fatal)?;
            let final_audit = audit(&snapshot);
            info!(
                empty_linked_sets = final_audit.empty_linked_sets.len(),
                "final audit before injection"
            );

            let planned = plan_placeholders(
                &snapshot,
                &final_audit.empty_linked_sets,
                &self.config.default_currency,
            )
            .into_iter()
            .map(PlannedRepair::from)
            .collect();
            let (units, _) = self
                .execute("placeholder", planned, &mut failures, &mut cancelled)
                .await?;
            repaired.placeholders_injected = units;
        }

        let closing = self
            .store
            .snapshot()
            .await
            .map_err(ReconcileError::from_fatal)?;
        let counts_after = audit(&closing).counts();
        info!(
            remaining = counts_after.total(),
            failures = failures.len(),
            "closing audit"
        );

        Ok(ReconciliationReport {
            started_at,
            finished_at: Utc::now(),
            counts_before,
            counts_after,
            repaired,
            failures,
            cancelled,
        })
    }

    /// Apply one stage's planned repairs, unit by unit. Returns the number
    /// of units and mutations that committed. Fatal store errors abort;
    /// everything else is recorded and the batch continues.
    async fn execute(
        &self,
        stage: &str,
        planned: Vec<PlannedRepair>,
        failures: &mut Vec<UnitFailure>,
        cancelled: &mut bool,
    ) -> Result<(u64, u64), ReconcileError> {
        let total = planned.len();
        let mut units_ok = 0u64;
        let mut mutations_ok = 0u64;

        for plan in planned {
            if self.cancel.is_cancelled() {
                *cancelled = true;
                warn!(stage, "cancelled between units");
                break;
            }
            match self.apply_with_fallback(stage, &plan).await? {
                Ok(mutations) => {
                    units_ok += 1;
                    mutations_ok += mutations;
                }
                Err(failure) => {
                    warn!(
                        stage,
                        subject = %failure.subject,
                        kind = ?failure.kind,
                        message = %failure.message,
                        "unit failed, continuing"
                    );
                    failures.push(failure);
                }
            }
        }

        info!(stage, planned = total, repaired = units_ok, "stage done");
        Ok((units_ok, mutations_ok))
    }

    /// Try a plan's candidates in order; an identifier collision moves on to
    /// the alternate derivation, anything else settles the unit.
    async fn apply_with_fallback(
        &self,
        stage: &str,
        plan: &PlannedRepair,
    ) -> Result<Result<u64, UnitFailure>, ReconcileError> {
        let last = plan.candidates.len().saturating_sub(1);
        for (attempt, unit) in plan.candidates.iter().enumerate() {
            match self.store.apply_unit(unit).await {
                Ok(()) => return Ok(Ok(unit.mutations.len() as u64)),
                Err(err) if err.is_fatal() => return Err(ReconcileError::from_fatal(err)),
                Err(StoreError::DuplicateId(msg)) => {
                    if attempt < last {
                        warn!(
                            stage,
                            subject = %plan.subject,
                            %msg,
                            "identifier collision, retrying with alternate derivation"
                        );
                        continue;
                    }
                    return Ok(Err(UnitFailure::new(
                        stage,
                        &plan.subject,
                        FailureKind::Collision,
                        msg,
                    )));
                }
                Err(StoreError::Timeout(msg)) => {
                    return Ok(Err(UnitFailure::new(
                        stage,
                        &plan.subject,
                        FailureKind::Timeout,
                        msg,
                    )));
                }
                Err(err) => {
                    return Ok(Err(UnitFailure::new(
                        stage,
                        &plan.subject,
                        FailureKind::Repair,
                        err.to_string(),
                    )));
                }
            }
        }
        // Planning found both derivations claimed by unrelated rows.
        Ok(Err(UnitFailure::new(
            stage,
            &plan.subject,
            FailureKind::Collision,
            "derived and alternate identifiers are both claimed",
        )))
    }
}
