//! Order pricing.
//!
//! Pure functions from line items and a [`PricingConfig`] to the four figures
//! shown at checkout. Amounts keep full decimal precision; only display
//! rounds.

use heirloom_core::{CurrencyCode, Money, Quantity};

use crate::config::PricingConfig;

/// Σ unit price × quantity.
pub fn subtotal<I>(lines: I) -> Money
where
    I: IntoIterator<Item = (Money, Quantity)>,
{
    lines.into_iter().map(|(price, quantity)| price * quantity).sum()
}

/// Free when the subtotal is strictly above the threshold, flat rate
/// otherwise. An empty cart is still charged shipping.
#[must_use]
pub fn shipping(subtotal: Money, config: &PricingConfig) -> Money {
    if subtotal > config.free_shipping_threshold {
        Money::ZERO
    } else {
        config.flat_shipping
    }
}

/// `subtotal × tax_rate`, unrounded.
#[must_use]
pub fn tax(subtotal: Money, config: &PricingConfig) -> Money {
    subtotal.scale(config.tax_rate)
}

/// `subtotal + tax + shipping`.
#[must_use]
pub fn total(subtotal: Money, config: &PricingConfig) -> Money {
    subtotal + tax(subtotal, config) + shipping(subtotal, config)
}

/// Every figure of an order summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBreakdown {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
    pub currency: CurrencyCode,
}

impl PriceBreakdown {
    /// Derive tax, shipping and total from a subtotal.
    #[must_use]
    pub fn from_subtotal(subtotal: Money, config: &PricingConfig) -> Self {
        let tax = tax(subtotal, config);
        let shipping = shipping(subtotal, config);
        Self {
            subtotal,
            tax,
            shipping,
            total: subtotal + tax + shipping,
            currency: config.currency,
        }
    }

    /// Price a set of lines.
    pub fn from_lines<I>(lines: I, config: &PricingConfig) -> Self
    where
        I: IntoIterator<Item = (Money, Quantity)>,
    {
        Self::from_subtotal(subtotal(lines), config)
    }

    /// Returns `true` when shipping was waived.
    #[must_use]
    pub const fn free_shipping(&self) -> bool {
        self.shipping.is_zero()
    }

    /// Format an amount in this breakdown's currency.
    #[must_use]
    pub fn format(&self, amount: Money) -> String {
        amount.display(self.currency)
    }
}
