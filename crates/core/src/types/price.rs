//! Type-safe price representation using decimal arithmetic.
//!
//! The REST API sends prices either as JSON strings (`"19.99"`) or as JSON
//! numbers (`19.99`). Both deserialize into a [`Price`]. The storefront sells
//! in a single currency, so no currency code is carried.

use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`] from user input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is not a decimal number.
    #[error("price must be a number, got {0:?}")]
    Invalid(String),
    /// The input is below zero.
    #[error("price cannot be negative")]
    Negative,
}

/// A non-negative monetary amount in the store currency.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Build a price from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Parse a price typed into a form (`"19.99"`, `"$19.99"`, `" 20 "`).
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Invalid`] for non-numeric input and
    /// [`PriceError::Negative`] for amounts below zero.
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let trimmed = input.trim();
        let digits = trimmed.strip_prefix('$').unwrap_or(trimmed);
        let amount =
            Decimal::from_str(digits).map_err(|_| PriceError::Invalid(input.to_string()))?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// This price multiplied by a quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Format for display, e.g. `$19.99`.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        format!("${rounded:.2}")
    }

    /// Plain two-decimal amount without the currency sign, for form inputs.
    #[must_use]
    pub fn to_input_value(&self) -> String {
        let rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        format!("{rounded:.2}")
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_from_string_and_number() {
        let from_string: Price = serde_json::from_str("\"19.99\"").unwrap();
        let from_number: Price = serde_json::from_str("19.99").unwrap();
        assert_eq!(from_string, Price::from_cents(1999));
        assert_eq!(from_number, Price::from_cents(1999));
    }

    #[test]
    fn test_display_pads_and_rounds() {
        assert_eq!(Price::parse("20").unwrap().display(), "$20.00");
        assert_eq!(Price::parse("19.9").unwrap().display(), "$19.90");
        assert_eq!(Price::parse("1.005").unwrap().display(), "$1.01");
    }

    #[test]
    fn test_parse_accepts_dollar_sign() {
        assert_eq!(Price::parse(" $12.50 ").unwrap(), Price::from_cents(1250));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(Price::parse("abc"), Err(PriceError::Invalid(_))));
        assert_eq!(Price::parse("-1"), Err(PriceError::Negative));
    }

    #[test]
    fn test_times_and_sum() {
        let unit = Price::from_cents(1999);
        assert_eq!(unit.times(3), Price::from_cents(5997));

        let total: Price = [unit, unit.times(2)].into_iter().sum();
        assert_eq!(total.display(), "$59.97");
    }

    #[test]
    fn test_input_value_has_no_sign() {
        assert_eq!(Price::from_cents(500).to_input_value(), "5.00");
    }
}
