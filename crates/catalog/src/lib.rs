//! `pricegraph-catalog` — catalog row entities.
//!
//! The four row types the reconciler reads and repairs: [`Variant`],
//! [`PriceSet`], [`Price`] and [`VariantPriceSetLink`]. Price lists are
//! referenced weakly (by id) from price rows and have no row type here.

pub mod link;
pub mod price;
pub mod price_set;
pub mod variant;

pub use link::VariantPriceSetLink;
pub use price::Price;
pub use price_set::{derived_price_set_id, retry_price_set_id, PriceSet};
pub use variant::Variant;
