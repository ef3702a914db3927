//! Monetary amounts.
//!
//! Balances are plain signed [`Decimal`]s. Transaction amounts are always
//! strictly positive; the direction lives in the transaction kind.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Largest absolute value accepted for an amount or an opening balance.
///
/// Keeps every reachable running balance far inside `Decimal`'s range.
pub fn magnitude_limit() -> Decimal {
    Decimal::new(1_000_000_000_000, 0)
}

/// Reject values whose absolute value exceeds [`magnitude_limit`].
pub fn ensure_within_limit(value: Decimal, field: &str) -> DomainResult<Decimal> {
    if value.abs() > magnitude_limit() {
        return Err(DomainError::validation(format!(
            "{field} exceeds the supported magnitude ({})",
            magnitude_limit()
        )));
    }
    Ok(value)
}

/// A strictly positive decimal amount.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// Validate and wrap a decimal. Zero, negative and oversized values are
    /// rejected.
    pub fn new(value: Decimal) -> DomainResult<Self> {
        if value <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "amount must be positive (got {value})"
            )));
        }
        Ok(Self(ensure_within_limit(value, "amount")?))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl ValueObject for Amount {}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Amount {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(parse_decimal(s, "amount")?)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(value: Amount) -> Self {
        value.0
    }
}

// Persisted data goes through the same positivity check as fresh input.
impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Amount::new(value).map_err(serde::de::Error::custom)
    }
}

/// Parse a user-supplied decimal string (surrounding whitespace allowed).
///
/// `field` names the input in the validation message.
pub fn parse_decimal(raw: &str, field: &str) -> DomainResult<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Decimal::from_str(trimmed)
        .map_err(|e| DomainError::validation(format!("{field} is not a number: {e}")))
}
