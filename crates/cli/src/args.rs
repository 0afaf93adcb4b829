//! Operator command-line surface.

use clap::Parser;

/// Repair the variant→price relational graph and report what was fixed.
///
/// Exit status is zero only when the catalog ends the run with zero
/// anomalies; anything else (remaining anomalies, unit failures) is
/// non-zero so the caller decides fatality.
#[derive(Debug, Parser)]
#[command(name = "pricegraph-reconcile", version)]
pub struct Args {
    /// Postgres connection string for the catalog database.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Currency placeholder prices are minted in.
    #[arg(long, default_value = "usd")]
    pub default_currency: String,

    /// Skip the stale-link repair stage.
    #[arg(long)]
    pub skip_stale_links: bool,

    /// Skip pairing unlinked variants with orphaned priced sets.
    #[arg(long)]
    pub skip_pairing: bool,

    /// Skip duplicate-price collapsing.
    #[arg(long)]
    pub skip_dedupe: bool,

    /// Skip placeholder-price injection.
    #[arg(long)]
    pub skip_placeholders: bool,

    /// Per-unit statement timeout in milliseconds. A unit that exceeds it
    /// fails alone; the batch continues.
    #[arg(long)]
    pub unit_timeout_ms: Option<u64>,

    /// Print the report as JSON instead of a human summary.
    #[arg(long)]
    pub json: bool,

    /// Emit JSON log lines instead of compact ones.
    #[arg(long)]
    pub log_json: bool,
}
