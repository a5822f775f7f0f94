//! Checkout errors.

use thiserror::Error;

use super::CheckoutStep;
use crate::api::ApiError;

/// A form field failed validation. Rendered as the customer-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Errors from the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// There is nothing to check out.
    #[error("your cart is empty")]
    EmptyCart,

    /// The operation belongs to a different step.
    #[error("expected the {expected} step, checkout is on {current}")]
    WrongStep {
        expected: CheckoutStep,
        current: CheckoutStep,
    },

    /// An order submission is already running.
    #[error("an order is already being placed")]
    InFlight,

    /// This flow already produced an order.
    #[error("this order has already been placed")]
    AlreadyPlaced,

    /// Submitting the order failed.
    #[error("order submission failed: {0}")]
    Submit(#[from] ApiError),
}
