//! Type-safe money representation using decimal arithmetic.
//!
//! The backend is loose about how it transports prices: most responses carry
//! a JSON number, some carry a decimal string (`"4800.00"`). [`Money`]
//! accepts both on decode and always encodes as a JSON number.
//!
//! Arithmetic keeps full decimal precision. Rounding to cents happens only
//! when formatting for display.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Quantity;

/// An amount of money in the store currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Build an amount from a whole number of minor units (cents).
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Build an amount from a whole number of major units.
    #[must_use]
    pub fn from_major(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// The exact, unrounded amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns `true` for an amount of exactly zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Multiply by a rate (e.g. a tax rate of `0.07`).
    #[must_use]
    pub fn scale(self, rate: Decimal) -> Self {
        Self(self.0 * rate)
    }

    /// Amount rounded to two decimal places, for display only.
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        self.0.round_dp(2)
    }

    /// Format for display in the given currency (e.g., `"$19.99"`).
    #[must_use]
    pub fn display(&self, currency: CurrencyCode) -> String {
        format!("{}{:.2}", currency.symbol(), self.rounded())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display(CurrencyCode::default()))
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<Quantity> for Money {
    type Output = Self;

    fn mul(self, rhs: Quantity) -> Self {
        Self(self.0 * Decimal::from(rhs.get()))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.to_f64() {
            Some(value) => serializer.serialize_f64(value),
            None => serializer.serialize_str(&self.0.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Decimal's own visitor accepts numbers and numeric strings alike.
        <Decimal as Deserialize>::deserialize(deserializer).map(Self)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// Three-letter ISO code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_deserialize_number_and_string() {
        let from_number: Money = serde_json::from_str("12.5").unwrap();
        let from_string: Money = serde_json::from_str("\"12.50\"").unwrap();
        let from_int: Money = serde_json::from_str("4800").unwrap();

        assert_eq!(from_number, Money::from_cents(1250));
        assert_eq!(from_string, Money::from_cents(1250));
        assert_eq!(from_int, Money::from_major(4800));
    }

    #[test]
    fn test_deserialize_as_struct_field() {
        #[derive(Deserialize)]
        struct Line {
            price: Money,
            list_price: Option<Money>,
        }

        let line: Line =
            serde_json::from_str(r#"{ "price": "4800.00", "list_price": 5200 }"#).unwrap();
        assert_eq!(line.price, Money::from_major(4800));
        assert_eq!(line.list_price, Some(Money::from_major(5200)));
        assert!(serde_json::from_str::<Line>(r#"{ "price": "a lot" }"#).is_err());
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&Money::from_cents(1999)).unwrap();
        assert_eq!(json, "19.99");
    }

    #[test]
    fn test_display_rounds_only_at_presentation() {
        let tax = Money::from_major(35).scale(Decimal::from_str("0.07").unwrap());
        assert_eq!(tax.amount(), Decimal::from_str("2.45").unwrap());
        assert_eq!(tax.to_string(), "$2.45");

        let third = Money::new(Decimal::from_str("3.3333").unwrap());
        assert_eq!(third.amount(), Decimal::from_str("3.3333").unwrap());
        assert_eq!(third.display(CurrencyCode::GBP), "£3.33");
    }

    #[test]
    fn test_multiply_by_quantity_and_sum() {
        let lines = [
            Money::from_major(10) * Quantity::new(2).unwrap(),
            Money::from_major(5) * Quantity::new(3).unwrap(),
        ];
        let total: Money = lines.into_iter().sum();
        assert_eq!(total, Money::from_major(35));
    }

    #[test]
    fn test_currency_code() {
        assert_eq!(CurrencyCode::default().code(), "USD");
        assert_eq!(CurrencyCode::EUR.symbol(), "€");
    }
}
