//! Postgres-backed catalog store.
//!
//! The schema is owned externally (the live catalog); this module only reads
//! and repairs it. Soft deletion is a nullable `deleted_at` column (NULL =
//! active), translated to the domain [`Lifecycle`] at this boundary.
//!
//! ## Error mapping
//!
//! | SQLx error | Postgres code | `StoreError` | Scenario |
//! |---|---|---|---|
//! | Database (unique violation) | `23505` | `DuplicateId` | Derived id already taken |
//! | Database (query canceled) | `57014` | `Timeout` | Per-unit statement timeout elapsed |
//! | Database (undefined table/column) | `42P01` / `42703` | `Schema` | Schema assumption broken |
//! | Io / PoolTimedOut / PoolClosed / Tls | — | `Connection` | Store unreachable |
//! | anything else | — | `Unit` | Row-level failure, unit rolls back |

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use pricegraph_core::{Amount, CurrencyCode, Lifecycle, PriceId, PriceListId};
use pricegraph_catalog::{Price, PriceSet, Variant, VariantPriceSetLink};

use crate::error::StoreError;
use crate::mutation::{CatalogMutation, RepairUnit};
use crate::snapshot::CatalogSnapshot;
use crate::r#trait::CatalogStore;

/// Postgres-backed catalog store. One transaction per repair unit.
#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: Arc<PgPool>,
    unit_timeout: Option<Duration>,
}

impl PostgresCatalogStore {
    /// Connect to the catalog database.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| StoreError::Connection(format!("connect: {e}")))?;
        Ok(Self::new(pool))
    }

    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
            unit_timeout: None,
        }
    }

    /// Set a per-unit statement timeout. A timeout elapsing fails only the
    /// unit it interrupted.
    pub fn with_unit_timeout(mut self, timeout: Duration) -> Self {
        self.unit_timeout = Some(timeout);
        self
    }

    async fn apply_mutation(
        tx: &mut Transaction<'_, Postgres>,
        mutation: &CatalogMutation,
    ) -> Result<(), StoreError> {
        match mutation {
            CatalogMutation::CreatePriceSet(set) => {
                sqlx::query(
                    "INSERT INTO price_sets (id, created_at, deleted_at) VALUES ($1, $2, NULL)",
                )
                .bind(set.id.as_uuid())
                .bind(set.created_at)
                .execute(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error("create_price_set", e))?;
            }
            CatalogMutation::CreateLink(link) => {
                sqlx::query(
                    "INSERT INTO variant_price_set_links (id, variant_id, price_set_id, deleted_at) \
                     VALUES ($1, $2, $3, NULL)",
                )
                .bind(link.id.as_uuid())
                .bind(link.variant_id.as_uuid())
                .bind(link.price_set_id.as_uuid())
                .execute(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error("create_link", e))?;
            }
            CatalogMutation::CreatePrice(price) => {
                sqlx::query(
                    "INSERT INTO prices (id, price_set_id, price_list_id, currency_code, amount, deleted_at) \
                     VALUES ($1, $2, $3, $4, $5, NULL)",
                )
                .bind(price.id.as_str())
                .bind(price.price_set_id.as_uuid())
                .bind(price.price_list_id.as_ref().map(|l| l.as_str()))
                .bind(price.currency.as_str())
                .bind(price.amount.minor_units())
                .execute(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error("create_price", e))?;
            }
            CatalogMutation::SoftDeleteLink(id) => {
                let result = sqlx::query(
                    "UPDATE variant_price_set_links \
                     SET deleted_at = COALESCE(deleted_at, now()) WHERE id = $1",
                )
                .bind(id.as_uuid())
                .execute(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error("soft_delete_link", e))?;
                if result.rows_affected() == 0 {
                    return Err(StoreError::Unit(format!("link {id} not found")));
                }
            }
            CatalogMutation::SoftDeletePrice(id) => {
                let result = sqlx::query(
                    "UPDATE prices SET deleted_at = COALESCE(deleted_at, now()) WHERE id = $1",
                )
                .bind(id.as_str())
                .execute(&mut **tx)
                .await
                .map_err(|e| map_sqlx_error("soft_delete_price", e))?;
                if result.rows_affected() == 0 {
                    return Err(StoreError::Unit(format!("price {id} not found")));
                }
            }
            CatalogMutation::RestorePriceSet(id) => {
                let result =
                    sqlx::query("UPDATE price_sets SET deleted_at = NULL WHERE id = $1")
                        .bind(id.as_uuid())
                        .execute(&mut **tx)
                        .await
                        .map_err(|e| map_sqlx_error("restore_price_set", e))?;
                if result.rows_affected() == 0 {
                    return Err(StoreError::Unit(format!("price set {id} not found")));
                }
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl CatalogStore for PostgresCatalogStore {
    #[instrument(skip(self), err)]
    async fn snapshot(&self) -> Result<CatalogSnapshot, StoreError> {
        // All four reads run inside one REPEATABLE READ transaction so the
        // snapshot is a single point in time. Independent autocommit reads
        // could be torn by a concurrent catalog writer (a link read after
        // its price set was created but before our price_sets read would
        // look stale and trigger a bogus relink).
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Connection(format!("begin snapshot: {e}")))?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_read_error("set_isolation", e))?;

        let variant_rows =
            sqlx::query("SELECT id, sku, created_at, deleted_at FROM product_variants")
                .fetch_all(&mut *tx)
                .await
                .map_err(|e| map_read_error("select_variants", e))?;
        let mut variants = Vec::with_capacity(variant_rows.len());
        for row in variant_rows {
            let id: Uuid = row.try_get("id").map_err(row_error)?;
            let sku: String = row.try_get("sku").map_err(row_error)?;
            let created_at: DateTime<Utc> = row.try_get("created_at").map_err(row_error)?;
            variants.push(Variant {
                id: id.into(),
                sku,
                created_at,
                lifecycle: lifecycle_from(row.try_get("deleted_at").map_err(row_error)?),
            });
        }

        let set_rows = sqlx::query("SELECT id, created_at, deleted_at FROM price_sets")
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| map_read_error("select_price_sets", e))?;
        let mut price_sets = Vec::with_capacity(set_rows.len());
        for row in set_rows {
            let id: Uuid = row.try_get("id").map_err(row_error)?;
            let created_at: DateTime<Utc> = row.try_get("created_at").map_err(row_error)?;
            price_sets.push(PriceSet {
                id: id.into(),
                created_at,
                lifecycle: lifecycle_from(row.try_get("deleted_at").map_err(row_error)?),
            });
        }

        let price_rows = sqlx::query(
            "SELECT id, price_set_id, price_list_id, currency_code, amount, deleted_at FROM prices",
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_read_error("select_prices", e))?;
        let mut prices = Vec::with_capacity(price_rows.len());
        for row in price_rows {
            let id: String = row.try_get("id").map_err(row_error)?;
            let price_set_id: Uuid = row.try_get("price_set_id").map_err(row_error)?;
            let price_list_id: Option<String> =
                row.try_get("price_list_id").map_err(row_error)?;
            let currency: String = row.try_get("currency_code").map_err(row_error)?;
            let amount: i64 = row.try_get("amount").map_err(row_error)?;
            prices.push(Price {
                id: PriceId::from_str(&id)
                    .map_err(|e| StoreError::Schema(format!("price id: {e}")))?,
                price_set_id: price_set_id.into(),
                price_list_id: price_list_id
                    .as_deref()
                    .map(PriceListId::from_str)
                    .transpose()
                    .map_err(|e| StoreError::Schema(format!("price list id: {e}")))?,
                currency: CurrencyCode::new(&currency)
                    .map_err(|e| StoreError::Schema(format!("currency on price {id}: {e}")))?,
                amount: Amount::from_minor(amount)
                    .map_err(|e| StoreError::Schema(format!("amount on price {id}: {e}")))?,
                lifecycle: lifecycle_from(row.try_get("deleted_at").map_err(row_error)?),
            });
        }

        let link_rows = sqlx::query(
            "SELECT id, variant_id, price_set_id, deleted_at FROM variant_price_set_links",
        )
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| map_read_error("select_links", e))?;
        let mut links = Vec::with_capacity(link_rows.len());
        for row in link_rows {
            let id: Uuid = row.try_get("id").map_err(row_error)?;
            let variant_id: Uuid = row.try_get("variant_id").map_err(row_error)?;
            let price_set_id: Uuid = row.try_get("price_set_id").map_err(row_error)?;
            links.push(VariantPriceSetLink {
                id: id.into(),
                variant_id: variant_id.into(),
                price_set_id: price_set_id.into(),
                lifecycle: lifecycle_from(row.try_get("deleted_at").map_err(row_error)?),
            });
        }

        // Read-only transaction; commit just releases the snapshot.
        tx.commit()
            .await
            .map_err(|e| StoreError::Connection(format!("commit snapshot: {e}")))?;

        Ok(CatalogSnapshot {
            variants,
            price_sets,
            prices,
            links,
        })
    }

    #[instrument(skip(self, unit), fields(subject = %unit.subject), err)]
    async fn apply_unit(&self, unit: &RepairUnit) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Connection(format!("begin: {e}")))?;

        if let Some(timeout) = self.unit_timeout {
            // SET LOCAL scopes the timeout to this transaction only.
            sqlx::query(&format!(
                "SET LOCAL statement_timeout = {}",
                timeout.as_millis()
            ))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_timeout", e))?;
        }

        for mutation in &unit.mutations {
            if let Err(err) = Self::apply_mutation(&mut tx, mutation).await {
                // Explicit rollback; dropping the tx would roll back too,
                // but the error from rollback itself is worth surfacing.
                if let Err(rb) = tx.rollback().await {
                    tracing::error!(subject = %unit.subject, error = %rb, "rollback failed");
                }
                return Err(err);
            }
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;
        Ok(())
    }
}

fn lifecycle_from(deleted_at: Option<DateTime<Utc>>) -> Lifecycle {
    if deleted_at.is_some() {
        Lifecycle::Deleted
    } else {
        Lifecycle::Active
    }
}

fn row_error(err: sqlx::Error) -> StoreError {
    StoreError::Schema(format!("row decode: {err}"))
}

/// Read-path errors: anything broken here aborts the run.
fn map_read_error(operation: &str, err: sqlx::Error) -> StoreError {
    match map_sqlx_error(operation, err) {
        StoreError::Unit(msg) => StoreError::Connection(msg),
        other => other,
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // Unique violation: an identifier is already taken.
                Some("23505") => StoreError::DuplicateId(msg),
                // Statement timeout / query canceled.
                Some("57014") => StoreError::Timeout(msg),
                // Undefined table / undefined column.
                Some("42P01") | Some("42703") => StoreError::Schema(msg),
                _ => StoreError::Unit(msg),
            }
        }
        sqlx::Error::Io(e) => StoreError::Connection(format!("io in {operation}: {e}")),
        sqlx::Error::PoolTimedOut => {
            StoreError::Connection(format!("pool timed out in {operation}"))
        }
        sqlx::Error::PoolClosed => StoreError::Connection(format!("pool closed in {operation}")),
        sqlx::Error::Tls(e) => StoreError::Connection(format!("tls in {operation}: {e}")),
        other => StoreError::Unit(format!("sqlx error in {operation}: {other}")),
    }
}
