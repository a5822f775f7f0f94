//! Cart data gateway.
//!
//! Every call here is a single round-trip with no retries. None of the
//! mutations are idempotent, so callers must not issue the same action twice.

use std::future::Future;

use heirloom_core::{CartId, CartItemId, CartSessionId, Money, ProductId, Quantity};
use reqwest::Method;
use tracing::instrument;

use super::types::{AddToCartRequest, Cart, CartItem, UpdateQuantityRequest};
use super::{ApiClient, ApiError};

/// Remote cart operations.
///
/// Implemented by [`ApiClient`] for the REST backend; the cart store is
/// generic over this so it can run against an in-process fake.
pub trait CartGateway: Send + Sync {
    /// Fetch the cart for a session, creating it on the backend if needed.
    fn get_cart(
        &self,
        session_id: &CartSessionId,
    ) -> impl Future<Output = Result<Cart, ApiError>> + Send;

    /// Add a product line. `price` overrides the catalog price and is
    /// normally `None`.
    fn add_to_cart(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
        quantity: Quantity,
        price: Option<Money>,
    ) -> impl Future<Output = Result<CartItem, ApiError>> + Send;

    /// Set a line's quantity. No clamping happens at this layer.
    fn update_cart_item_quantity(
        &self,
        item_id: &CartItemId,
        quantity: Quantity,
    ) -> impl Future<Output = Result<CartItem, ApiError>> + Send;

    /// Delete one line.
    fn remove_from_cart(
        &self,
        item_id: &CartItemId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Delete every line of a cart.
    fn clear_cart(&self, cart_id: &CartId) -> impl Future<Output = Result<(), ApiError>> + Send;
}

impl CartGateway for ApiClient {
    #[instrument(skip(self), fields(session_id = %session_id))]
    async fn get_cart(&self, session_id: &CartSessionId) -> Result<Cart, ApiError> {
        let url = self.endpoint(&["carts", session_id.as_str()])?;
        self.send_json(self.request(Method::GET, url)).await
    }

    #[instrument(skip(self), fields(cart_id = %cart_id, product_id = %product_id, quantity = %quantity))]
    async fn add_to_cart(
        &self,
        cart_id: &CartId,
        product_id: &ProductId,
        quantity: Quantity,
        price: Option<Money>,
    ) -> Result<CartItem, ApiError> {
        let url = self.endpoint(&["carts", cart_id.as_str(), "items"])?;
        let body = AddToCartRequest {
            product_id,
            quantity,
            price,
        };
        self.send_json(self.request(Method::POST, url).json(&body))
            .await
    }

    #[instrument(skip(self), fields(item_id = %item_id, quantity = %quantity))]
    async fn update_cart_item_quantity(
        &self,
        item_id: &CartItemId,
        quantity: Quantity,
    ) -> Result<CartItem, ApiError> {
        let url = self.endpoint(&["carts", "items", item_id.as_str()])?;
        self.send_json(
            self.request(Method::PATCH, url)
                .json(&UpdateQuantityRequest { quantity }),
        )
        .await
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    async fn remove_from_cart(&self, item_id: &CartItemId) -> Result<(), ApiError> {
        let url = self.endpoint(&["carts", "items", item_id.as_str()])?;
        self.send_empty(self.request(Method::DELETE, url)).await
    }

    #[instrument(skip(self), fields(cart_id = %cart_id))]
    async fn clear_cart(&self, cart_id: &CartId) -> Result<(), ApiError> {
        let url = self.endpoint(&["carts", cart_id.as_str()])?;
        self.send_empty(self.request(Method::DELETE, url)).await
    }
}
