//! Display model for the cart page.

use heirloom_core::CurrencyCode;

use super::pricing::PriceBreakdown;
use super::store::CartSnapshot;
use crate::api::CartItem;
use crate::config::PricingConfig;

/// The one call-to-action under the cart summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryAction {
    /// Empty cart: go back to the catalog.
    ContinueShopping,
    /// Non-empty cart: start checkout.
    Checkout,
}

impl PrimaryAction {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ContinueShopping => "Continue Shopping",
            Self::Checkout => "Proceed to Checkout",
        }
    }
}

/// Cart line formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItemView {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
    /// The `+` control is enabled.
    pub can_increment: bool,
    /// The `-` control is enabled.
    pub can_decrement: bool,
}

impl CartItemView {
    fn new(item: &CartItem, currency: CurrencyCode) -> Self {
        let quantity = item.quantity.get();
        Self {
            id: item.id.to_string(),
            product_id: item.product_id.to_string(),
            name: item.product.name.clone(),
            image: item.product.image_url.clone(),
            quantity,
            price: item.price.display(currency),
            line_price: item.line_total().display(currency),
            can_increment: item.stock().is_none_or(|stock| quantity < stock),
            can_decrement: quantity > 1,
        }
    }
}

/// Cart page model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub subtotal: String,
    pub tax: String,
    pub shipping: String,
    pub total: String,
    pub free_shipping: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub primary_action: PrimaryAction,
}

impl CartView {
    /// Build the page model from a store snapshot.
    #[must_use]
    pub fn new(snapshot: &CartSnapshot, pricing: &PricingConfig) -> Self {
        let items = snapshot.items();
        let breakdown = PriceBreakdown::from_subtotal(snapshot.subtotal(), pricing);

        Self {
            items: items
                .iter()
                .map(|item| CartItemView::new(item, pricing.currency))
                .collect(),
            item_count: snapshot.item_count(),
            subtotal: breakdown.format(breakdown.subtotal),
            tax: breakdown.format(breakdown.tax),
            shipping: if breakdown.free_shipping() {
                "Free".to_string()
            } else {
                breakdown.format(breakdown.shipping)
            },
            total: breakdown.format(breakdown.total),
            free_shipping: breakdown.free_shipping(),
            loading: snapshot.loading,
            error: snapshot.error.clone(),
            primary_action: if items.is_empty() {
                PrimaryAction::ContinueShopping
            } else {
                PrimaryAction::Checkout
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::Cart;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn pricing() -> PricingConfig {
        PricingConfig::with_tax_rate(Decimal::from_str("0.07").unwrap())
    }

    fn snapshot(cart: serde_json::Value) -> CartSnapshot {
        CartSnapshot {
            cart: Some(serde_json::from_value::<Cart>(cart).unwrap()),
            loading: false,
            error: None,
        }
    }

    #[test]
    fn test_empty_cart_offers_continue_shopping() {
        let view = CartView::new(&CartSnapshot::default(), &pricing());
        assert_eq!(view.primary_action, PrimaryAction::ContinueShopping);
        assert_eq!(view.primary_action.label(), "Continue Shopping");
        assert_eq!(view.subtotal, "$0.00");
        assert_eq!(view.shipping, "$10.00");
    }

    #[test]
    fn test_worked_example_view() {
        let view = CartView::new(
            &snapshot(serde_json::json!({
                "id": "c", "sessionId": "s",
                "items": [
                    { "id": "i1", "cartId": "c", "productId": "p1", "quantity": 2, "price": 10,
                      "product": { "id": "p1", "name": "Dan Mask", "price": 10, "inventory": 2 } },
                    { "id": "i2", "cartId": "c", "productId": "p2", "quantity": 3, "price": 5,
                      "product": { "id": "p2", "name": "Bead Strand", "price": 5 } }
                ]
            })),
            &pricing(),
        );

        assert_eq!(view.primary_action, PrimaryAction::Checkout);
        assert_eq!(view.item_count, 5);
        assert_eq!(view.subtotal, "$35.00");
        assert_eq!(view.tax, "$2.45");
        assert_eq!(view.total, "$47.45");
        assert_eq!(view.items[0].line_price, "$20.00");
        assert!(!view.items[0].can_increment);
        assert!(view.items[0].can_decrement);
        assert!(view.items[1].can_increment);
    }
}
