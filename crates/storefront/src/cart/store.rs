//! Shared cart container.
//!
//! Holds the current cart plus `loading`/`error` flags and publishes every
//! change on a `watch` channel. Mutations never update the cart in place:
//! each one calls the gateway and then refetches the whole cart.
//!
//! `loading` is an in-flight counter, so two overlapping mutations keep it
//! set until both finish. A refetch that started before the one already
//! applied is dropped when it lands.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use heirloom_core::{CartId, CartItemId, CartSessionId, Money, ProductId, Quantity};
use tokio::sync::watch;

use super::{CartError, messages};
use crate::api::{ApiError, Cart, CartGateway, CartItem};
use crate::error::add_breadcrumb;

/// Point-in-time view of the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartSnapshot {
    pub cart: Option<Cart>,
    pub loading: bool,
    pub error: Option<String>,
}

impl CartSnapshot {
    /// Lines of the current cart, empty when no cart is loaded.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        self.cart.as_ref().map_or(&[], |cart| cart.items.as_slice())
    }

    /// Σ price × quantity over [`Self::items`].
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.cart.as_ref().map_or(Money::ZERO, Cart::subtotal)
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart.as_ref().map_or(0, Cart::item_count)
    }

    /// Returns `true` if there is nothing to check out.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }
}

#[derive(Default)]
struct State {
    cart: Option<Cart>,
    error: Option<String>,
    in_flight: usize,
    /// Sequence number of the refetch whose result is currently shown.
    applied_seq: u64,
}

struct Shared {
    state: Mutex<State>,
    tx: watch::Sender<CartSnapshot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` and publish the result. The lock is held only for the
    /// synchronous update.
    fn update<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut state = self.lock();
        let result = f(&mut state);
        self.tx.send_replace(CartSnapshot {
            cart: state.cart.clone(),
            loading: state.in_flight > 0,
            error: state.error.clone(),
        });
        result
    }
}

/// Decrements the in-flight counter when dropped, including when the
/// operation's future is cancelled.
struct Loading<'a> {
    shared: &'a Shared,
}

impl<'a> Loading<'a> {
    fn begin(shared: &'a Shared) -> Self {
        shared.update(|state| state.in_flight += 1);
        Self { shared }
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.shared
            .update(|state| state.in_flight = state.in_flight.saturating_sub(1));
    }
}

/// Reactive cart container for one cart session.
pub struct CartStore<G> {
    gateway: G,
    session_id: CartSessionId,
    shared: Shared,
    next_seq: AtomicU64,
}

impl<G> std::fmt::Debug for CartStore<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("session_id", &self.session_id)
            .field("snapshot", &*self.shared.tx.borrow())
            .finish_non_exhaustive()
    }
}

impl<G: CartGateway> CartStore<G> {
    /// Create an empty store. Nothing is fetched until [`Self::init`].
    pub fn new(gateway: G, session_id: CartSessionId) -> Self {
        let (tx, _) = watch::channel(CartSnapshot::default());
        Self {
            gateway,
            session_id,
            shared: Shared {
                state: Mutex::new(State::default()),
                tx,
            },
            next_seq: AtomicU64::new(0),
        }
    }

    /// The gateway this store talks to.
    pub const fn gateway(&self) -> &G {
        &self.gateway
    }

    /// The anonymous session this cart belongs to.
    pub const fn session_id(&self) -> &CartSessionId {
        &self.session_id
    }

    /// Receive every future state change.
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.shared.tx.subscribe()
    }

    /// Current state.
    pub fn snapshot(&self) -> CartSnapshot {
        self.shared.tx.borrow().clone()
    }

    pub fn cart(&self) -> Option<Cart> {
        self.shared.lock().cart.clone()
    }

    pub fn loading(&self) -> bool {
        self.shared.lock().in_flight > 0
    }

    pub fn error(&self) -> Option<String> {
        self.shared.lock().error.clone()
    }

    pub fn items(&self) -> Vec<CartItem> {
        self.shared
            .lock()
            .cart
            .as_ref()
            .map(|cart| cart.items.clone())
            .unwrap_or_default()
    }

    pub fn subtotal(&self) -> Money {
        self.shared.lock().cart.as_ref().map_or(Money::ZERO, Cart::subtotal)
    }

    pub fn item_count(&self) -> u32 {
        self.shared.lock().cart.as_ref().map_or(0, Cart::item_count)
    }

    /// Drop the current error message.
    pub fn clear_error(&self) {
        self.shared.update(|state| state.error = None);
    }

    /// First load for the session. The backend creates the cart if needed.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; the store's error is set to
    /// "Failed to initialize cart".
    pub async fn init(&self) -> Result<(), CartError> {
        let _loading = Loading::begin(&self.shared);
        self.fetch(messages::INIT_FAILED).await
    }

    /// Refetch the cart.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; the store's error is set to
    /// "Failed to fetch cart" and the previous cart is kept.
    pub async fn refresh_cart(&self) -> Result<(), CartError> {
        let _loading = Loading::begin(&self.shared);
        self.fetch(messages::FETCH_FAILED).await
    }

    /// Add a product, then refetch.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NoCart`] without any I/O when no cart is loaded,
    /// or the gateway error.
    pub async fn add_item(
        &self,
        product_id: &ProductId,
        quantity: Quantity,
        price: Option<Money>,
    ) -> Result<(), CartError> {
        let cart_id = self.cart_id().ok_or(CartError::NoCart)?;
        let quantity_label = quantity.to_string();
        add_breadcrumb(
            "cart",
            "Add item",
            Some(&[
                ("product_id", product_id.as_str()),
                ("quantity", &quantity_label),
            ]),
        );

        self.mutate(
            messages::ADD_FAILED,
            self.gateway
                .add_to_cart(&cart_id, product_id, quantity, price),
        )
        .await
    }

    /// Set a line's quantity, then refetch.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub async fn update_item(
        &self,
        item_id: &CartItemId,
        quantity: Quantity,
    ) -> Result<(), CartError> {
        let quantity_label = quantity.to_string();
        add_breadcrumb(
            "cart",
            "Update item",
            Some(&[("item_id", item_id.as_str()), ("quantity", &quantity_label)]),
        );

        self.mutate(
            messages::UPDATE_FAILED,
            self.gateway.update_cart_item_quantity(item_id, quantity),
        )
        .await
    }

    /// Remove a line, then refetch.
    ///
    /// # Errors
    ///
    /// Returns the gateway error.
    pub async fn remove_item(&self, item_id: &CartItemId) -> Result<(), CartError> {
        add_breadcrumb("cart", "Remove item", Some(&[("item_id", item_id.as_str())]));

        self.mutate(messages::REMOVE_FAILED, self.gateway.remove_from_cart(item_id))
            .await
    }

    /// Empty the cart, then refetch.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NoCart`] without any I/O when no cart is loaded,
    /// or the gateway error.
    pub async fn clear_cart(&self) -> Result<(), CartError> {
        let cart_id = self.cart_id().ok_or(CartError::NoCart)?;
        add_breadcrumb("cart", "Clear cart", Some(&[("cart_id", cart_id.as_str())]));

        self.mutate(messages::CLEAR_FAILED, self.gateway.clear_cart(&cart_id))
            .await
    }

    fn cart_id(&self) -> Option<CartId> {
        self.shared.lock().cart.as_ref().map(|cart| cart.id.clone())
    }

    async fn mutate<T>(
        &self,
        failure: &'static str,
        call: impl Future<Output = Result<T, ApiError>>,
    ) -> Result<(), CartError> {
        let _loading = Loading::begin(&self.shared);

        if let Err(e) = call.await {
            tracing::error!(error = %e, "{failure}");
            self.shared
                .update(|state| state.error = Some(failure.to_string()));
            return Err(e.into());
        }

        // The change is on the server now; a failed refetch only leaves the
        // shown cart stale and is reported through the store's error.
        if let Err(e) = self.fetch(messages::FETCH_FAILED).await {
            tracing::warn!(error = %e, "Cart changed but refetch failed");
        }
        Ok(())
    }

    async fn fetch(&self, failure: &'static str) -> Result<(), CartError> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;

        match self.gateway.get_cart(&self.session_id).await {
            Ok(cart) => {
                self.shared.update(|state| {
                    if seq < state.applied_seq {
                        tracing::debug!(seq, applied = state.applied_seq, "Discarding stale cart");
                        return;
                    }
                    state.applied_seq = seq;
                    state.cart = Some(cart);
                    state.error = None;
                });
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, session_id = %self.session_id, "{failure}");
                self.shared.update(|state| {
                    if seq >= state.applied_seq {
                        state.error = Some(failure.to_string());
                    }
                });
                Err(e.into())
            }
        }
    }
}
