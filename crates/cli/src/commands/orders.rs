//! Order history and payment follow-up.

use chrono::Utc;
use clap::Subcommand;
use heirloom_core::OrderId;
use heirloom_storefront::api::PaymentResult;
use heirloom_storefront::error::AppError;
use heirloom_storefront::state::Storefront;

use super::auth::require_login;
use crate::output;

#[derive(Subcommand)]
pub enum OrdersAction {
    /// List your orders
    List,
    /// Show one order
    Get {
        /// Order id
        id: String,
    },
    /// Cancel an order that has not shipped
    Cancel {
        /// Order id
        id: String,
    },
    /// Confirm a PayPal payment after approving it on PayPal
    Confirm {
        /// `paymentId` from the PayPal return URL
        #[arg(long)]
        payment_id: String,
        /// `PayerID` from the PayPal return URL
        #[arg(long)]
        payer_id: String,
    },
    /// Show where the PayPal payment for an order stands
    PaypalStatus {
        /// Order id
        id: String,
    },
    /// Record a payment receipt against an order
    Pay {
        /// Order id
        id: String,
        /// Payment id issued by the payment provider
        #[arg(long)]
        payment_id: String,
        /// Payment status reported by the provider
        #[arg(long, default_value = "COMPLETED")]
        status: String,
        /// Payer email address
        #[arg(long)]
        email: Option<String>,
    },
}

pub async fn run(action: OrdersAction, state: &Storefront) -> Result<(), AppError> {
    // The PayPal return URL is usable without a session
    if !matches!(action, OrdersAction::Confirm { .. }) {
        require_login(state)?;
    }
    let client = state.client();
    let currency = state.config().pricing.currency;

    match action {
        OrdersAction::List => {
            let orders = client.get_user_orders().await?;
            output::orders(&orders, currency);
        }
        OrdersAction::Get { id } => {
            let order = client.get_order(&OrderId::new(id)).await?;
            output::order(&order, currency);
        }
        OrdersAction::Cancel { id } => {
            let order = client.cancel_order(&OrderId::new(id)).await?;
            output::line(&format!("Order {} is now {}.", order.id, order.status));
        }
        OrdersAction::Confirm {
            payment_id,
            payer_id,
        } => {
            let status = client.confirm_paypal_payment(&payment_id, &payer_id).await?;
            output::paypal_status(&status);
        }
        OrdersAction::PaypalStatus { id } => {
            let status = client.paypal_payment_status(&OrderId::new(id)).await?;
            output::paypal_status(&status);
        }
        OrdersAction::Pay {
            id,
            payment_id,
            status,
            email,
        } => {
            let receipt = PaymentResult {
                id: payment_id,
                status,
                update_time: Utc::now(),
                email_address: email,
            };
            let order = client.mark_order_paid(&OrderId::new(id), &receipt).await?;
            output::order(&order, currency);
        }
    }
    Ok(())
}
