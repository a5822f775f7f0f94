//! Non-interactive checkout.
//!
//! Runs the three checkout steps from flags. Without `--yes` the command
//! stops after printing the review.

use clap::Args;
use heirloom_core::PaymentMethodKind;
use heirloom_storefront::api::PaymentNext;
use heirloom_storefront::checkout::{CheckoutError, PaymentForm, ShippingForm};
use heirloom_storefront::error::AppError;
use heirloom_storefront::state::Storefront;

use crate::output;

#[derive(Args)]
pub struct CheckoutArgs {
    #[arg(long, default_value = "")]
    full_name: String,
    #[arg(long, default_value = "")]
    address: String,
    #[arg(long, default_value = "")]
    city: String,
    #[arg(long, default_value = "")]
    postal_code: String,
    #[arg(long, default_value = "")]
    country: String,
    #[arg(long, default_value = "")]
    phone: String,

    /// `paypal` or `card`
    #[arg(long, default_value = "paypal")]
    method: PaymentMethodKind,

    #[arg(long, default_value = "")]
    cardholder_name: String,
    #[arg(long, env = "HEIRLOOM_CARD_NUMBER", hide_env_values = true, default_value = "")]
    card_number: String,
    /// MM/YY
    #[arg(long, default_value = "")]
    expiry_date: String,
    #[arg(long, env = "HEIRLOOM_CARD_CVV", hide_env_values = true, default_value = "")]
    cvv: String,

    /// Place the order after showing the review
    #[arg(long, short)]
    yes: bool,
}

impl CheckoutArgs {
    fn shipping(&self) -> ShippingForm {
        ShippingForm {
            full_name: self.full_name.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            postal_code: self.postal_code.clone(),
            country: self.country.clone(),
            phone: self.phone.clone(),
        }
    }

    fn payment(self) -> PaymentForm {
        match self.method {
            PaymentMethodKind::PayPal => PaymentForm::paypal(),
            PaymentMethodKind::Card => PaymentForm::card(
                self.cardholder_name,
                self.card_number,
                self.expiry_date,
                self.cvv,
            ),
        }
    }
}

pub async fn run(args: CheckoutArgs, state: &Storefront) -> Result<(), AppError> {
    super::auth::require_login(state)?;

    let yes = args.yes;
    let flow = state.checkout();
    if !flow.can_checkout() {
        return Err(CheckoutError::EmptyCart.into());
    }

    flow.submit_shipping(&args.shipping())?;
    flow.submit_payment(&args.payment())?;

    let review = flow.review().ok_or(CheckoutError::EmptyCart)?;
    output::review(&review);

    if !yes {
        output::line("");
        output::line("Re-run with --yes to place this order.");
        return Ok(());
    }

    let placement = flow.place_order().await?;
    output::line("");
    output::line(&format!("Order {} placed.", placement.order.id));
    match placement.next {
        PaymentNext::RedirectToPaypal { approval_url } => {
            output::line(&format!("Approve the PayPal payment at: {approval_url}"));
        }
        PaymentNext::CardCapturePending => {
            output::line("Your card payment is being processed.");
        }
    }
    Ok(())
}
