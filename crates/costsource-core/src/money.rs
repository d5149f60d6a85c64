//! Monetary and currency newtypes.
//!
//! `Money` makes the spec.md §3 invariant ("NaN and ±∞ are invalid and
//! must be rejected") a construction-time guarantee rather than a
//! validator rule that runs after the fact: once you hold a `Money`,
//! it is finite.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A finite 64-bit floating-point monetary amount. Negative values are
/// allowed (credits, adjustments, anomaly overspend impact) — only
/// non-finite values are rejected.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Money(f64);

impl Money {
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::new(
                "cost",
                format!("cost value `{value}` is not finite (NaN/±∞ are invalid)"),
            ));
        }
        Ok(Self(value))
    }

    pub fn zero() -> Self {
        Self(0.0)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

impl TryFrom<f64> for Money {
    type Error = ValidationError;
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Money::new(value)
    }
}

impl From<Money> for f64 {
    fn from(m: Money) -> f64 {
        m.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

/// A validated 3-letter ISO 4217 currency code, e.g. `USD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub fn new(code: impl Into<String>) -> Result<Self, ValidationError> {
        let code = code.into();
        let valid = code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase());
        if !valid {
            return Err(ValidationError::new(
                "currency",
                format!("`{code}` is not a 3-letter ISO 4217 code"),
            )
            .with_suggestion("use an uppercase 3-letter code such as USD or EUR"));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Currency {
    type Error = ValidationError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Currency::new(value)
    }
}

impl From<Currency> for String {
    fn from(c: Currency) -> String {
        c.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_nan_and_infinite() {
        assert!(Money::new(f64::NAN).is_err());
        assert!(Money::new(f64::INFINITY).is_err());
        assert!(Money::new(f64::NEG_INFINITY).is_err());
        assert!(Money::new(-42.5).is_ok());
        assert!(Money::new(0.0).is_ok());
    }

    #[test]
    fn currency_validates_iso4217_shape() {
        assert!(Currency::new("USD").is_ok());
        assert!(Currency::new("usd").is_err());
        assert!(Currency::new("US").is_err());
        assert!(Currency::new("USDA").is_err());
    }
}
