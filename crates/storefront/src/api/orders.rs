//! Order gateway.
//!
//! Checkout hands a finished [`OrderRequest`] to an [`OrderSubmitter`]. The
//! REST implementation creates the order and, for PayPal, asks the backend
//! for an approval URL. Card capture belongs to the card processor and is
//! never routed through this API.
//!
//! After the customer approves on PayPal, the return URL carries
//! `paymentId` and `PayerID`; [`ApiClient::confirm_paypal_payment`] hands
//! them back to the backend.

use std::future::Future;

use heirloom_core::{OrderId, PaymentMethodKind};
use reqwest::Method;
use tracing::instrument;

use super::types::{Order, OrderRequest, PaymentResult, PaypalInitiation, PaypalPaymentStatus};
use super::{ApiClient, ApiError};

/// What the customer has to do after the order exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentNext {
    /// Send the customer to PayPal to approve the payment.
    RedirectToPaypal { approval_url: String },
    /// The order is recorded; the card processor still has to capture payment.
    CardCapturePending,
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPlacement {
    pub order: Order,
    pub next: PaymentNext,
}

/// Accepts a finished order from checkout.
pub trait OrderSubmitter: Send + Sync {
    /// Submit the order. Not idempotent.
    fn submit(
        &self,
        request: &OrderRequest,
    ) -> impl Future<Output = Result<OrderPlacement, ApiError>> + Send;
}

impl ApiClient {
    /// Create an order for the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects the order.
    #[instrument(skip_all, fields(items = request.order_items.len(), total = %request.total_price))]
    pub async fn create_order(&self, request: &OrderRequest) -> Result<Order, ApiError> {
        let url = self.endpoint(&["orders"])?;
        self.send_json(self.request(Method::POST, url).json(request))
            .await
    }

    /// Start a PayPal payment for an existing order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn initiate_paypal_payment(
        &self,
        order_id: &OrderId,
    ) -> Result<PaypalInitiation, ApiError> {
        let url = self.endpoint(&["orders", order_id.as_str(), "paypal"])?;
        self.send_json(
            self.request(Method::POST, url)
                .json(&serde_json::json!({})),
        )
        .await
    }

    /// Confirm a PayPal payment the customer approved.
    ///
    /// `payment_id` and `payer_id` come from the PayPal return URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects the
    /// confirmation.
    #[instrument(skip(self), fields(payment_id = %payment_id))]
    pub async fn confirm_paypal_payment(
        &self,
        payment_id: &str,
        payer_id: &str,
    ) -> Result<PaypalPaymentStatus, ApiError> {
        let mut url = self.endpoint(&["orders", "confirm"])?;
        url.query_pairs_mut()
            .append_pair("paymentId", payment_id)
            .append_pair("PayerID", payer_id);
        let status: PaypalPaymentStatus = self.send_json(self.request(Method::GET, url)).await?;
        tracing::info!(paid = status.paid(), "PayPal payment confirmed");
        Ok(status)
    }

    /// Where the PayPal payment for an order stands.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown order, or another error if
    /// the request fails.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn paypal_payment_status(
        &self,
        order_id: &OrderId,
    ) -> Result<PaypalPaymentStatus, ApiError> {
        let url = self.endpoint(&["orders", order_id.as_str(), "paypal", "status"])?;
        self.send_json(self.request(Method::GET, url)).await
    }

    /// Record a payment receipt against an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend refuses the
    /// receipt.
    #[instrument(skip(self, receipt), fields(order_id = %order_id, payment_id = %receipt.id))]
    pub async fn mark_order_paid(
        &self,
        order_id: &OrderId,
        receipt: &PaymentResult,
    ) -> Result<Order, ApiError> {
        let url = self.endpoint(&["orders", order_id.as_str(), "pay"])?;
        let order: Order = self
            .send_json(self.request(Method::POST, url).json(receipt))
            .await?;
        tracing::info!(order_id = %order.id, "Order marked paid");
        Ok(order)
    }

    /// Orders placed by the signed-in customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_user_orders(&self) -> Result<Vec<Order>, ApiError> {
        let url = self.endpoint(&["orders"])?;
        self.send_json(self.request(Method::GET, url)).await
    }

    /// A single order by id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown order, or another error if
    /// the request fails.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn get_order(&self, order_id: &OrderId) -> Result<Order, ApiError> {
        let url = self.endpoint(&["orders", order_id.as_str()])?;
        self.send_json(self.request(Method::GET, url)).await
    }

    /// Cancel an order that has not shipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the order can no longer be
    /// cancelled.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(&self, order_id: &OrderId) -> Result<Order, ApiError> {
        let url = self.endpoint(&["orders", order_id.as_str(), "cancel"])?;
        self.send_json(self.request(Method::PUT, url).json(&serde_json::json!({})))
            .await
    }
}

impl OrderSubmitter for ApiClient {
    async fn submit(&self, request: &OrderRequest) -> Result<OrderPlacement, ApiError> {
        let order = self.create_order(request).await?;

        let next = match request.payment_method {
            PaymentMethodKind::PayPal => {
                let initiation = self
                    .initiate_paypal_payment(&order.id)
                    .await
                    .inspect_err(|e| {
                        tracing::error!(
                            order_id = %order.id,
                            error = %e,
                            "Order created but PayPal initiation failed"
                        );
                    })?;
                PaymentNext::RedirectToPaypal {
                    approval_url: initiation.approval_url,
                }
            }
            PaymentMethodKind::Card => PaymentNext::CardCapturePending,
        };

        tracing::info!(order_id = %order.id, "Order placed");
        Ok(OrderPlacement { order, next })
    }
}
