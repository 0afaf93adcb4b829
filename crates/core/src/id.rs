//! Strongly-typed identifiers used across the catalog domain.
//!
//! Variant, price-set and link rows carry UUID identifiers (v7 for organic
//! rows, v5 for deterministically derived ones). Price and price-list rows
//! keep the opaque text identifiers they were imported with; repair logic
//! inspects their text (derived price ids embed the price-list id).

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a sellable product variant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantId(Uuid);

/// Identifier of a price set (the anchor a variant's prices hang off).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceSetId(Uuid);

/// Identifier of a variant→price-set link row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(Uuid);

macro_rules! impl_uuid_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(VariantId, "VariantId");
impl_uuid_newtype!(PriceSetId, "PriceSetId");
impl_uuid_newtype!(LinkId, "LinkId");

/// Identifier of a single price row.
///
/// Imported rows keep whatever text id the source system assigned
/// (e.g. `price_abc`); rows minted here use a `price_` prefix over a UUIDv7.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceId(String);

/// Identifier of a price list (override bucket). Referenced weakly from
/// price rows; no row type of its own in this subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceListId(String);

macro_rules! impl_text_newtype {
    ($t:ty, $name:literal, $prefix:literal) => {
        impl $t {
            /// Create a fresh identifier (prefix + UUIDv7).
            pub fn new() -> Self {
                Self(format!(concat!($prefix, "_{}"), Uuid::now_v7().simple()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                if s.is_empty() {
                    return Err(DomainError::invalid_id(concat!($name, ": empty")));
                }
                Ok(Self(s.to_string()))
            }
        }
    };
}

impl_text_newtype!(PriceId, "PriceId", "price");
impl_text_newtype!(PriceListId, "PriceListId", "plist");

impl PriceId {
    /// Whether this id textually embeds the given price-list id.
    ///
    /// Migration tooling in the source system minted override rows whose ids
    /// concatenate the price-list id; hand-entered rows do not.
    pub fn embeds(&self, list: &PriceListId) -> bool {
        self.0.contains(list.as_str())
    }
}
