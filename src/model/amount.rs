//! Amount type for monetary values.
//!
//! Users type amounts with or without a dollar sign and thousands separators. The server sends
//! decimals either as JSON strings (`"12.50"`) or as JSON numbers, and accepts strings back.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Represents a monetary amount.
///
/// Parsing from user text:
/// ```
/// # use budget_planner::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("$1,200.50").unwrap();
/// assert_eq!(amount.value().to_string(), "1200.50");
/// assert_eq!(amount.to_string(), "$1,200.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    pub const fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is greater than zero.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }

    /// Parses user text and requires the result to be greater than zero, as outcome amounts must
    /// be.
    pub fn parse_positive(text: &str) -> Result<Self, AmountError> {
        let amount = Self::from_str(text)?;
        if !amount.is_positive() {
            return Err(AmountError::NotPositive(text.trim().to_string()));
        }
        Ok(amount)
    }

    /// Parses user text and requires the result to be zero or greater, as the balance must be.
    pub fn parse_non_negative(text: &str) -> Result<Self, AmountError> {
        let amount = Self::from_str(text)?;
        if amount.is_negative() {
            return Err(AmountError::Negative(text.trim().to_string()));
        }
        Ok(amount)
    }
}

/// An error that can occur when parsing user text into an `Amount`.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum AmountError {
    #[error("an amount is required")]
    Empty,
    #[error("'{0}' is not a number")]
    Invalid(String),
    #[error("'{0}' must be greater than zero")]
    NotPositive(String),
    #[error("'{0}' must not be negative")]
    Negative(String),
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Empty);
        }

        // "-$50.00", "-50.00", "$50.00" or "50.00"
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let digits = unsigned.strip_prefix('$').unwrap_or(unsigned).replace(',', "");

        let value = Decimal::from_str(&digits)
            .or_else(|_| Decimal::from_scientific(&digits))
            .map_err(|_| AmountError::Invalid(trimmed.to_string()))?;
        Ok(Amount(if negative { -value } else { value }))
    }
}

/// Formats as dollars with thousands separators, e.g. `-$60,000.00`.
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let num = self.0.abs().round_dp(2).to_f64().unwrap_or_default();
        write!(f, "{sign}${}", format_num::format_num!(",.2", num))
    }
}

/// Serializes as a plain decimal string, which the server's decimal fields accept.
impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Lenient::deserialize(deserializer)?
            .into_decimal()
            .map(Amount)
            .map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

/// A decimal that arrived either as a JSON string or a JSON number.
#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Text(String),
    Number(serde_json::Number),
}

impl Lenient {
    fn into_decimal(self) -> Result<Decimal, String> {
        let text = match self {
            Lenient::Text(s) => s,
            Lenient::Number(n) => n.to_string(),
        };
        let text = text.trim();
        Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .map_err(|e| format!("'{text}' is not a decimal: {e}"))
    }
}

/// Deserializes an optional decimal that may be a string, a number, or `null`.
pub(crate) fn optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Lenient>::deserialize(deserializer)? {
        Some(raw) => raw
            .into_decimal()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}
