//! Money value objects: currency codes and minor-unit amounts.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// ISO-4217 currency code, normalized to lowercase (e.g. `aud`, `usd`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse and normalize a currency code.
    pub fn new(code: impl AsRef<str>) -> Result<Self, DomainError> {
        let code = code.as_ref().trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DomainError::validation(format!(
                "currency code must be three ASCII letters, got '{code}'"
            )));
        }
        Ok(Self(code.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Monetary amount in minor units (two decimal places), e.g. `12000` == 120.00.
///
/// Stored as `i64` in the smallest currency unit, matching how the catalog
/// schema stores prices. Negative amounts never occur on price rows; the
/// constructor rejects them.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// The smallest representable positive amount (one minor unit).
    ///
    /// This is what placeholder prices carry.
    pub const MIN_POSITIVE: Amount = Amount(1);

    /// Build from minor units. Rejects non-positive values.
    pub fn from_minor(minor: i64) -> Result<Self, DomainError> {
        if minor <= 0 {
            return Err(DomainError::validation(format!(
                "amount must be positive, got {minor} minor units"
            )));
        }
        Ok(Self(minor))
    }

    /// Build from whole major units (e.g. `from_major(120)` == 120.00).
    pub fn from_major(major: i64) -> Result<Self, DomainError> {
        Self::from_minor(major.saturating_mul(100))
    }

    pub fn minor_units(self) -> i64 {
        self.0
    }

    /// Number of significant decimal digits: 0 for `199.00`, 1 for `199.50`,
    /// 2 for `199.99`.
    ///
    /// Used by deduplication to prefer deliberately-entered round amounts
    /// over computed ones.
    pub fn significant_decimal_digits(self) -> u8 {
        if self.0 % 100 == 0 {
            0
        } else if self.0 % 10 == 0 {
            1
        } else {
            2
        }
    }
}

impl core::fmt::Display for Amount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}
