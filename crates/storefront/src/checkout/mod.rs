//! Checkout flow: shipping, then payment, then review and submission.
//!
//! Moving forward requires the current step's form to validate; a failed
//! validation records the message and leaves the step unchanged. Moving
//! back is always allowed and keeps what was already entered.

mod error;
pub mod payment;
pub mod review;
pub mod shipping;

pub use error::{CheckoutError, ValidationError};
pub use payment::{CardDetails, PaymentForm, PaymentMethod};
pub use review::{OrderReview, ReviewLine};
pub use shipping::{ShippingAddress, ShippingForm};

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::api::{CartGateway, OrderPlacement, OrderSubmitter};
use crate::cart::{CartStore, PriceBreakdown};
use crate::config::PricingConfig;
use crate::error::add_breadcrumb;

/// Message shown when submission fails without a usable server message.
pub const ORDER_FAILED: &str = "Failed to create order";

/// Customer-visible checkout step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutStep {
    Shipping,
    Payment,
    Review,
}

impl CheckoutStep {
    /// 1-based position, for "Step 2 of 3" indicators.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Shipping => 1,
            Self::Payment => 2,
            Self::Review => 3,
        }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shipping => write!(f, "shipping"),
            Self::Payment => write!(f, "payment"),
            Self::Review => write!(f, "review"),
        }
    }
}

/// Internal stage; later stages carry the data validated by earlier ones.
enum Stage {
    Shipping,
    Payment { address: ShippingAddress },
    Review {
        address: ShippingAddress,
        payment: PaymentMethod,
    },
}

impl Stage {
    const fn step(&self) -> CheckoutStep {
        match self {
            Self::Shipping => CheckoutStep::Shipping,
            Self::Payment { .. } => CheckoutStep::Payment,
            Self::Review { .. } => CheckoutStep::Review,
        }
    }
}

struct FlowState {
    stage: Stage,
    /// Last validated address, kept when stepping back to shipping.
    address: Option<ShippingAddress>,
    error: Option<String>,
    placed: Option<OrderPlacement>,
}

/// Checkout controller over a cart store and an order submitter.
pub struct CheckoutFlow<'a, G, S> {
    store: &'a CartStore<G>,
    submitter: &'a S,
    pricing: PricingConfig,
    state: Mutex<FlowState>,
    placing: AtomicBool,
}

impl<'a, G: CartGateway, S: OrderSubmitter> CheckoutFlow<'a, G, S> {
    /// Start at the shipping step.
    pub fn new(store: &'a CartStore<G>, submitter: &'a S, pricing: PricingConfig) -> Self {
        Self {
            store,
            submitter,
            pricing,
            state: Mutex::new(FlowState {
                stage: Stage::Shipping,
                address: None,
                error: None,
                placed: None,
            }),
            placing: AtomicBool::new(false),
        }
    }

    pub fn step(&self) -> CheckoutStep {
        self.lock().stage.step()
    }

    /// Message from the last failed validation or submission.
    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// An order submission is running.
    pub fn is_placing(&self) -> bool {
        self.placing.load(Ordering::Acquire)
    }

    /// The order this flow produced, once placed.
    pub fn placed(&self) -> Option<OrderPlacement> {
        self.lock().placed.clone()
    }

    /// Checkout needs a non-empty cart.
    pub fn can_checkout(&self) -> bool {
        !self.store.snapshot().is_empty()
    }

    /// Current prices for the cart.
    pub fn pricing(&self) -> PriceBreakdown {
        PriceBreakdown::from_subtotal(self.store.subtotal(), &self.pricing)
    }

    /// Last validated address, for pre-filling the shipping form.
    pub fn shipping_address(&self) -> Option<ShippingAddress> {
        self.lock().address.clone()
    }

    /// Validate the shipping form and advance to payment.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`], [`CheckoutError::WrongStep`] or
    /// the validation error. Validation errors are also recorded in
    /// [`Self::error`].
    pub fn submit_shipping(&self, form: &ShippingForm) -> Result<(), CheckoutError> {
        self.ensure_cart()?;
        let mut state = self.lock();
        expect_step(&state, CheckoutStep::Shipping)?;

        let address = record(&mut state, form.validate())?;
        state.address = Some(address.clone());
        state.stage = Stage::Payment { address };
        drop(state);

        add_breadcrumb("checkout", "Shipping entered", None);
        Ok(())
    }

    /// Validate the payment form and advance to review.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`], [`CheckoutError::WrongStep`] or
    /// the validation error. Validation errors are also recorded in
    /// [`Self::error`].
    pub fn submit_payment(&self, form: &PaymentForm) -> Result<(), CheckoutError> {
        self.ensure_cart()?;
        let mut state = self.lock();
        expect_step(&state, CheckoutStep::Payment)?;

        let payment = record(&mut state, form.validate())?;
        let kind = payment.kind().to_string();
        state.stage = match std::mem::replace(&mut state.stage, Stage::Shipping) {
            Stage::Payment { address } => Stage::Review { address, payment },
            other => other,
        };
        drop(state);

        add_breadcrumb("checkout", "Payment selected", Some(&[("method", &kind)]));
        Ok(())
    }

    /// Go back one step. Does nothing on the shipping step.
    pub fn back(&self) -> CheckoutStep {
        let mut state = self.lock();
        state.error = None;
        state.stage = match std::mem::replace(&mut state.stage, Stage::Shipping) {
            Stage::Shipping | Stage::Payment { .. } => Stage::Shipping,
            Stage::Review { address, .. } => Stage::Payment { address },
        };
        state.stage.step()
    }

    /// The order summary, available on the review step.
    pub fn review(&self) -> Option<OrderReview> {
        let items = self.store.items();
        let state = self.lock();
        match &state.stage {
            Stage::Review { address, payment } => Some(OrderReview::new(
                items,
                address.clone(),
                payment.clone(),
                &self.pricing,
            )),
            _ => None,
        }
    }

    /// Submit the order and clear the cart.
    ///
    /// On failure the flow stays on review with the error recorded; nothing
    /// is retried.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::InFlight`] while another submission runs
    /// - [`CheckoutError::AlreadyPlaced`] after a successful submission
    /// - [`CheckoutError::WrongStep`] outside the review step
    /// - [`CheckoutError::EmptyCart`] for an empty cart
    /// - [`CheckoutError::Submit`] if the submitter fails
    pub async fn place_order(&self) -> Result<OrderPlacement, CheckoutError> {
        let _placing = Placing::acquire(&self.placing)?;

        let review = {
            let state = self.lock();
            if state.placed.is_some() {
                return Err(CheckoutError::AlreadyPlaced);
            }
            expect_step(&state, CheckoutStep::Review)?;
            drop(state);
            self.ensure_cart()?;
            self.review().ok_or_else(|| CheckoutError::WrongStep {
                expected: CheckoutStep::Review,
                current: self.step(),
            })?
        };

        let request = review.order_request();
        add_breadcrumb(
            "checkout",
            "Place order",
            Some(&[("method", &request.payment_method.to_string())]),
        );

        let placement = match self.submitter.submit(&request).await {
            Ok(placement) => placement,
            Err(e) => {
                let event_id = sentry::capture_error(&e);
                tracing::error!(error = %e, sentry_event_id = %event_id, "Order submission failed");
                let message = match e.server_message() {
                    crate::api::DEFAULT_ERROR_MESSAGE => ORDER_FAILED,
                    message => message,
                };
                self.lock().error = Some(message.to_string());
                return Err(e.into());
            }
        };

        if let Err(e) = self.store.clear_cart().await {
            tracing::warn!(order_id = %placement.order.id, error = %e, "Order placed but cart was not cleared");
        }

        let mut state = self.lock();
        state.error = None;
        state.placed = Some(placement.clone());
        Ok(placement)
    }

    fn lock(&self) -> MutexGuard<'_, FlowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_cart(&self) -> Result<(), CheckoutError> {
        if self.can_checkout() {
            Ok(())
        } else {
            Err(CheckoutError::EmptyCart)
        }
    }
}

fn expect_step(state: &FlowState, expected: CheckoutStep) -> Result<(), CheckoutError> {
    let current = state.stage.step();
    if current == expected {
        Ok(())
    } else {
        Err(CheckoutError::WrongStep { expected, current })
    }
}

/// Record the outcome of a validation in the flow's error slot.
fn record<T>(state: &mut FlowState, result: Result<T, ValidationError>) -> Result<T, CheckoutError> {
    match result {
        Ok(value) => {
            state.error = None;
            Ok(value)
        }
        Err(e) => {
            state.error = Some(e.to_string());
            Err(e.into())
        }
    }
}

struct Placing<'a>(&'a AtomicBool);

impl<'a> Placing<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, CheckoutError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| CheckoutError::InFlight)
    }
}

impl Drop for Placing<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
