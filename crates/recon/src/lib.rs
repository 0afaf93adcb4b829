//! `pricegraph-recon` — the price-catalog consistency reconciler.
//!
//! Repairs the relational graph linking product variants to their price
//! records after a bulk migration, and guarantees every variant resolves to
//! a well-formed, non-empty price list.
//!
//! Five components behind one orchestrator entry point:
//!
//! - [`audit`]: read-only anomaly classification (pure function of a snapshot).
//! - [`repair`]: stale-link repair and unlinked↔orphaned pairing.
//! - [`dedupe`]: collapses duplicate price overrides to one canonical row.
//! - [`placeholder`]: injects a synthetic last-resort price into empty
//!   linked price sets.
//! - [`orchestrator`]: sequences the stages into an idempotent, re-runnable
//!   batch and produces a [`report::ReconciliationReport`].

pub mod audit;
pub mod dedupe;
pub mod error;
pub mod orchestrator;
pub mod pairing;
pub mod placeholder;
pub mod repair;
pub mod report;

pub use audit::{audit, Anomalies, AnomalyCounts};
pub use error::{FailureKind, ReconcileError, UnitFailure};
pub use orchestrator::{CancelFlag, Reconciler, ReconcilerConfig, StageToggles};
pub use pairing::{CreationOrderPairing, LinkPairingStrategy};
pub use report::ReconciliationReport;
