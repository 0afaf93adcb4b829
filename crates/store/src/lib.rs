//! `pricegraph-store` — the catalog store boundary.
//!
//! The reconciler never talks to persistence directly; it reads a
//! [`CatalogSnapshot`] and writes [`RepairUnit`]s through the
//! [`CatalogStore`] trait. Two implementations are provided:
//!
//! - [`InMemoryCatalogStore`]: tests and development.
//! - [`PostgresCatalogStore`]: production, one transaction per repair unit.
//!
//! Soft-delete state transitions happen only here; callers express intent as
//! [`CatalogMutation`]s and the store enforces the two-state lifecycle.

pub mod error;
pub mod in_memory;
pub mod mutation;
pub mod postgres;
pub mod snapshot;
mod r#trait;

pub use error::StoreError;
pub use in_memory::InMemoryCatalogStore;
pub use mutation::{CatalogMutation, RepairUnit};
pub use postgres::PostgresCatalogStore;
pub use r#trait::CatalogStore;
pub use snapshot::CatalogSnapshot;
