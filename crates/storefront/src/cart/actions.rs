//! Per-control cart actions.
//!
//! A [`CartActions`] belongs to one button or quantity control. It keeps its
//! own busy flag and error message on top of the store's, clamps requested
//! quantities into `[1, stock]`, and refuses a second action while the first
//! is still running.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use heirloom_core::{CartItemId, ProductId, Quantity};

use super::messages::action as msg;
use super::{CartError, CartStore};
use crate::api::{CartGateway, Product};

/// The product a control adds to the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionProduct {
    pub id: ProductId,
    /// Units in stock, if known.
    pub stock: Option<u32>,
}

impl ActionProduct {
    #[must_use]
    pub fn new(id: impl Into<ProductId>, stock: Option<u32>) -> Self {
        Self {
            id: id.into(),
            stock,
        }
    }
}

impl From<&Product> for ActionProduct {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            stock: Some(product.inventory),
        }
    }
}

struct Busy<'a>(&'a AtomicBool);

impl<'a> Busy<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, CartError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| CartError::InFlight)
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Cart actions bound to an optional product.
pub struct CartActions<'a, G> {
    store: &'a CartStore<G>,
    product: Option<ActionProduct>,
    busy: AtomicBool,
    error: Mutex<Option<String>>,
}

impl<'a, G: CartGateway> CartActions<'a, G> {
    /// Actions for a specific product (product page, collection card).
    pub fn for_product(store: &'a CartStore<G>, product: impl Into<ActionProduct>) -> Self {
        Self::with_product(store, Some(product.into()))
    }

    /// Actions for controls that only touch existing lines (cart page).
    pub fn new(store: &'a CartStore<G>) -> Self {
        Self::with_product(store, None)
    }

    fn with_product(store: &'a CartStore<G>, product: Option<ActionProduct>) -> Self {
        Self {
            store,
            product,
            busy: AtomicBool::new(false),
            error: Mutex::new(None),
        }
    }

    /// This control is busy, or the store is.
    pub fn is_loading(&self) -> bool {
        self.busy.load(Ordering::Acquire) || self.store.loading()
    }

    /// This control's error, falling back to the store's.
    pub fn error(&self) -> Option<String> {
        self.local_error().or_else(|| self.store.error())
    }

    /// Add the bound product.
    ///
    /// The requested quantity is clamped so the line never exceeds stock,
    /// counting units already in the cart.
    ///
    /// # Errors
    ///
    /// - [`CartError::InFlight`] if another action on this control is running
    /// - [`CartError::NoProduct`] if no product is bound
    /// - [`CartError::OutOfStock`] if no more units can be added
    /// - any error from the store
    pub async fn add_to_cart(&self, quantity: i64) -> Result<(), CartError> {
        let _busy = Busy::acquire(&self.busy)?;

        let Some(product) = &self.product else {
            self.set_error(Some(msg::NO_PRODUCT));
            return Err(CartError::NoProduct);
        };

        let in_cart = self
            .store
            .snapshot()
            .cart
            .as_ref()
            .and_then(|cart| cart.item_for_product(&product.id))
            .map_or(0, |item| item.quantity.get());
        let remaining = product.stock.map(|stock| stock.saturating_sub(in_cart));
        if remaining == Some(0) {
            self.set_error(Some(msg::OUT_OF_STOCK));
            return Err(CartError::OutOfStock);
        }

        let quantity = Quantity::clamped(quantity, remaining);
        self.set_error(None);

        self.store
            .add_item(&product.id, quantity, None)
            .await
            .inspect_err(|e| self.fail(msg::ADD_FAILED, e))
    }

    /// Set a line's quantity, clamped into `[1, stock]`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InFlight`] if another action is running, or any
    /// error from the store.
    pub async fn update_quantity(&self, item_id: &CartItemId, quantity: i64) -> Result<(), CartError> {
        let _busy = Busy::acquire(&self.busy)?;

        let stock = self
            .store
            .snapshot()
            .cart
            .as_ref()
            .and_then(|cart| cart.item(item_id))
            .and_then(|item| item.stock());
        let quantity = Quantity::clamped(quantity, stock);
        self.set_error(None);

        self.store
            .update_item(item_id, quantity)
            .await
            .inspect_err(|e| self.fail(msg::UPDATE_FAILED, e))
    }

    /// Step a line's quantity by `delta`, staying within `[1, stock]`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownItem`] if the line is not in the cart,
    /// otherwise as [`Self::update_quantity`].
    pub async fn step_quantity(&self, item_id: &CartItemId, delta: i64) -> Result<(), CartError> {
        let current = self
            .store
            .snapshot()
            .cart
            .as_ref()
            .and_then(|cart| cart.item(item_id))
            .map(|item| i64::from(item.quantity.get()))
            .ok_or_else(|| CartError::UnknownItem(item_id.clone()))?;

        self.update_quantity(item_id, current.saturating_add(delta))
            .await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InFlight`] if another action is running, or any
    /// error from the store.
    pub async fn remove_from_cart(&self, item_id: &CartItemId) -> Result<(), CartError> {
        let _busy = Busy::acquire(&self.busy)?;
        self.set_error(None);

        self.store
            .remove_item(item_id)
            .await
            .inspect_err(|e| self.fail(msg::REMOVE_FAILED, e))
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InFlight`] if another action is running, or any
    /// error from the store.
    pub async fn clear_cart(&self) -> Result<(), CartError> {
        let _busy = Busy::acquire(&self.busy)?;
        self.set_error(None);

        self.store
            .clear_cart()
            .await
            .inspect_err(|e| self.fail(msg::CLEAR_FAILED, e))
    }

    fn local_error(&self) -> Option<String> {
        self.error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_error(&self, message: Option<&str>) {
        *self.error.lock().unwrap_or_else(PoisonError::into_inner) = message.map(str::to_owned);
    }

    fn fail(&self, message: &'static str, err: &CartError) {
        tracing::error!(error = %err, "{message}");
        self.set_error(Some(message));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use heirloom_core::{CartSessionId, Money};

    use super::*;
    use crate::cart::messages;
    use crate::cart::testing::{FakeGateway, Op};

    async fn loaded(gateway: FakeGateway) -> CartStore<FakeGateway> {
        let store = CartStore::new(gateway, CartSessionId::new("session-1"));
        store.init().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_add_without_product_sets_message() {
        let store = loaded(FakeGateway::new()).await;
        let actions = CartActions::new(&store);

        assert!(matches!(actions.add_to_cart(1).await, Err(CartError::NoProduct)));
        assert_eq!(actions.error().as_deref(), Some(msg::NO_PRODUCT));
        assert_eq!(store.gateway().count(Op::Add), 0);
    }

    #[tokio::test]
    async fn test_add_clamps_to_stock() {
        let store = loaded(FakeGateway::new().with_product("mask", Money::from_major(10), Some(3))).await;
        let actions = CartActions::for_product(&store, ActionProduct::new("mask", Some(3)));

        actions.add_to_cart(10).await.unwrap();
        assert_eq!(store.items()[0].quantity.get(), 3);
    }

    #[tokio::test]
    async fn test_add_clamps_nonpositive_to_one() {
        let store = loaded(FakeGateway::new()).await;
        let actions = CartActions::for_product(&store, ActionProduct::new("mask", None));

        actions.add_to_cart(0).await.unwrap();
        assert_eq!(store.items()[0].quantity.get(), 1);
    }

    #[tokio::test]
    async fn test_add_counts_units_already_in_cart() {
        let store = loaded(FakeGateway::new().with_line("mask", Money::from_major(10), 2, Some(3))).await;
        let actions = CartActions::for_product(&store, ActionProduct::new("mask", Some(3)));

        actions.add_to_cart(5).await.unwrap();
        assert_eq!(store.items()[0].quantity.get(), 3);

        assert!(matches!(actions.add_to_cart(1).await, Err(CartError::OutOfStock)));
        assert_eq!(actions.error().as_deref(), Some(msg::OUT_OF_STOCK));
    }

    #[tokio::test]
    async fn test_zero_stock_is_out_of_stock() {
        let store = loaded(FakeGateway::new()).await;
        let actions = CartActions::for_product(&store, ActionProduct::new("mask", Some(0)));

        assert!(matches!(actions.add_to_cart(1).await, Err(CartError::OutOfStock)));
        assert_eq!(store.gateway().count(Op::Add), 0);
    }

    #[tokio::test]
    async fn test_update_clamps_into_range() {
        let store = loaded(FakeGateway::new().with_line("mask", Money::from_major(10), 2, Some(4))).await;
        let actions = CartActions::new(&store);
        let item_id = store.items()[0].id.clone();

        actions.update_quantity(&item_id, 99).await.unwrap();
        assert_eq!(store.items()[0].quantity.get(), 4);

        actions.update_quantity(&item_id, -5).await.unwrap();
        assert_eq!(store.items()[0].quantity.get(), 1);
    }

    #[tokio::test]
    async fn test_step_quantity_stays_at_one() {
        let store = loaded(FakeGateway::new().with_line("mask", Money::from_major(10), 1, Some(4))).await;
        let actions = CartActions::new(&store);
        let item_id = store.items()[0].id.clone();

        actions.step_quantity(&item_id, -1).await.unwrap();
        assert_eq!(store.items()[0].quantity.get(), 1);
        actions.step_quantity(&item_id, 1).await.unwrap();
        assert_eq!(store.items()[0].quantity.get(), 2);

        let missing = CartItemId::new("nope");
        assert!(matches!(
            actions.step_quantity(&missing, 1).await,
            Err(CartError::UnknownItem(_))
        ));
    }

    #[tokio::test]
    async fn test_local_error_shadows_store_error() {
        let store = loaded(FakeGateway::new().with_line("mask", Money::from_major(10), 1, None)).await;
        let actions = CartActions::new(&store);
        store.gateway().fail(Op::Remove);
        let item_id = store.items()[0].id.clone();

        assert!(actions.remove_from_cart(&item_id).await.is_err());
        assert_eq!(actions.error().as_deref(), Some(msg::REMOVE_FAILED));
        assert_eq!(store.error().as_deref(), Some(messages::REMOVE_FAILED));
        assert!(!actions.is_loading());
    }

    #[tokio::test]
    async fn test_clear_cart_failure_message() {
        let store = loaded(FakeGateway::new().with_line("mask", Money::from_major(10), 1, None)).await;
        store.gateway().fail(Op::Clear);
        let actions = CartActions::new(&store);

        assert!(actions.clear_cart().await.is_err());
        assert_eq!(actions.error().as_deref(), Some(msg::CLEAR_FAILED));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_action_is_refused_while_first_runs() {
        let store = loaded(FakeGateway::new()).await;
        store.gateway().script_get(Duration::from_millis(100), None);
        let actions = CartActions::for_product(&store, ActionProduct::new("mask", None));

        let (first, second) = tokio::join!(actions.add_to_cart(1), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert!(actions.is_loading());
            actions.add_to_cart(1).await
        });

        first.unwrap();
        assert!(matches!(second, Err(CartError::InFlight)));
        assert_eq!(store.gateway().count(Op::Add), 1);
        assert_eq!(store.items()[0].quantity.get(), 1);
        assert!(!actions.is_loading());
    }
}
