//! Review step: the read-only order summary.

use heirloom_core::{Money, Quantity};

use super::payment::PaymentMethod;
use super::shipping::ShippingAddress;
use crate::api::{CartItem, OrderItemRequest, OrderRequest};
use crate::cart::PriceBreakdown;
use crate::config::PricingConfig;

fn cents(amount: Money) -> Money {
    Money::new(amount.rounded())
}

/// One line of the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewLine {
    pub name: String,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub line_total: Money,
}

/// Everything shown on the review step.
#[derive(Debug, Clone)]
pub struct OrderReview {
    items: Vec<CartItem>,
    pub pricing: PriceBreakdown,
    pub shipping: ShippingAddress,
    pub payment: PaymentMethod,
}

impl OrderReview {
    pub(super) fn new(
        items: Vec<CartItem>,
        shipping: ShippingAddress,
        payment: PaymentMethod,
        pricing: &PricingConfig,
    ) -> Self {
        let breakdown =
            PriceBreakdown::from_lines(items.iter().map(|item| (item.price, item.quantity)), pricing);
        Self {
            items,
            pricing: breakdown,
            shipping,
            payment,
        }
    }

    /// Summary lines in cart order.
    #[must_use]
    pub fn lines(&self) -> Vec<ReviewLine> {
        self.items
            .iter()
            .map(|item| ReviewLine {
                name: item.product.name.clone(),
                quantity: item.quantity,
                unit_price: item.price,
                line_total: item.line_total(),
            })
            .collect()
    }

    /// Payment line, with card numbers masked.
    #[must_use]
    pub fn payment_summary(&self) -> String {
        self.payment.summary()
    }

    /// The body submitted to the orders API, amounts rounded to cents. Card
    /// details are not included.
    #[must_use]
    pub fn order_request(&self) -> OrderRequest {
        OrderRequest {
            order_items: self
                .items
                .iter()
                .map(|item| OrderItemRequest {
                    product: item.product_id.clone(),
                    name: item.product.name.clone(),
                    image: item.product.image_url.clone(),
                    price: item.price,
                    quantity: item.quantity,
                })
                .collect(),
            shipping_address: self.shipping.to_payload(),
            payment_method: self.payment.kind(),
            items_price: cents(self.pricing.subtotal),
            tax_price: cents(self.pricing.tax),
            shipping_price: cents(self.pricing.shipping),
            total_price: cents(self.pricing.total),
            currency: self.pricing.currency.code(),
        }
    }
}
