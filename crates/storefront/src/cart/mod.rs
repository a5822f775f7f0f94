//! Cart state, actions and pricing.
//!
//! - [`pricing`] - pure subtotal/tax/shipping/total functions
//! - [`store`] - the shared cart container, refetching after every mutation
//! - [`actions`] - per-control wrapper with its own loading/error flags
//! - [`view`] - display model for the cart page

pub mod actions;
pub mod pricing;
pub mod store;
#[cfg(test)]
pub(crate) mod testing;
pub mod view;

pub use actions::{ActionProduct, CartActions};
pub use pricing::PriceBreakdown;
pub use store::{CartSnapshot, CartStore};
pub use view::{CartItemView, CartView, PrimaryAction};

use heirloom_core::CartItemId;
use thiserror::Error;

use crate::api::ApiError;
use crate::storage::StorageError;

/// Fixed customer-facing messages set by the cart store.
pub mod messages {
    pub const INIT_FAILED: &str = "Failed to initialize cart";
    pub const FETCH_FAILED: &str = "Failed to fetch cart";
    pub const ADD_FAILED: &str = "Failed to add item to cart";
    pub const UPDATE_FAILED: &str = "Failed to update item";
    pub const REMOVE_FAILED: &str = "Failed to remove item";
    pub const CLEAR_FAILED: &str = "Failed to clear cart";

    /// Messages set by [`super::CartActions`].
    pub mod action {
        pub const NO_PRODUCT: &str = "No product specified for add to cart";
        pub const OUT_OF_STOCK: &str = "This item is out of stock";
        pub const ADD_FAILED: &str = "Failed to add product to cart";
        pub const UPDATE_FAILED: &str = "Failed to update cart item";
        pub const REMOVE_FAILED: &str = "Failed to remove item from cart";
        pub const CLEAR_FAILED: &str = "Failed to clear cart";
    }
}

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The operation needs a loaded cart and none is present.
    #[error("no cart is loaded")]
    NoCart,

    /// Another action on the same control has not finished.
    #[error("another cart action is still in progress")]
    InFlight,

    /// `add_to_cart` was called on a control with no product bound.
    #[error("no product specified")]
    NoProduct,

    /// The product has no stock left.
    #[error("product is out of stock")]
    OutOfStock,

    /// The item id is not in the current cart.
    #[error("cart item not found: {0}")]
    UnknownItem(CartItemId),

    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The session id could not be persisted.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
