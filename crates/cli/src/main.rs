//! `pricegraph-reconcile` — one-shot batch repair of the price catalog.

mod args;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

use pricegraph_core::CurrencyCode;
use pricegraph_observability::LogFormat;
use pricegraph_recon::{ReconciliationReport, Reconciler, ReconcilerConfig};
use pricegraph_store::{CatalogStore, PostgresCatalogStore};

use crate::args::Args;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    pricegraph_observability::init(if args.log_json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    });

    let default_currency = CurrencyCode::new(&args.default_currency)
        .with_context(|| format!("invalid --default-currency '{}'", args.default_currency))?;

    let mut store = PostgresCatalogStore::connect(&args.database_url)
        .await
        .context("connecting to the catalog database")?;
    if let Some(ms) = args.unit_timeout_ms {
        store = store.with_unit_timeout(Duration::from_millis(ms));
    }
    let store: Arc<dyn CatalogStore> = Arc::new(store);

    let mut config = ReconcilerConfig::new(default_currency);
    config.stages.stale_links = !args.skip_stale_links;
    config.stages.pairing = !args.skip_pairing;
    config.stages.dedupe = !args.skip_dedupe;
    config.stages.placeholders = !args.skip_placeholders;

    let reconciler = Reconciler::new(store, config);

    // Ctrl-C requests cooperative cancellation; the run stops between
    // units, never mid-transaction.
    let cancel = reconciler.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling between units");
            cancel.cancel();
        }
    });

    let report = reconciler.run().await.context("reconciliation run")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_summary(report: &ReconciliationReport) {
    println!("reconciliation finished in {} ms", report.duration_ms());
    if report.cancelled {
        println!("  (cancelled before completion)");
    }
    println!(
        "  anomalies before: {} (unlinked {}, stale {}, empty {}, orphaned {})",
        report.counts_before.total(),
        report.counts_before.unlinked_variants,
        report.counts_before.stale_links,
        report.counts_before.empty_linked_sets,
        report.counts_before.orphaned_priced_sets,
    );
    println!(
        "  repaired: {} stale links, {} pairings, {} duplicate prices removed, {} placeholders",
        report.repaired.stale_links,
        report.repaired.pairings,
        report.repaired.duplicate_prices_removed,
        report.repaired.placeholders_injected,
    );
    println!(
        "  anomalies after: {} (unlinked {}, stale {}, empty {}, orphaned {})",
        report.counts_after.total(),
        report.counts_after.unlinked_variants,
        report.counts_after.stale_links,
        report.counts_after.empty_linked_sets,
        report.counts_after.orphaned_priced_sets,
    );
    if !report.failures.is_empty() {
        println!("  failures ({}):", report.failures.len());
        for failure in &report.failures {
            println!(
                "    [{}] {} {:?}: {}",
                failure.stage, failure.subject, failure.kind, failure.message
            );
        }
    }
}
