//! `pricegraph-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod lifecycle;
pub mod money;

pub use error::{DomainError, DomainResult};
pub use id::{LinkId, PriceId, PriceListId, PriceSetId, VariantId};
pub use lifecycle::Lifecycle;
pub use money::{Amount, CurrencyCode};
