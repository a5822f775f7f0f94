//! Cart commands.

use clap::Subcommand;
use heirloom_core::{CartItemId, ProductId};
use heirloom_storefront::api::ApiClient;
use heirloom_storefront::cart::{ActionProduct, CartActions, CartError, CartView};
use heirloom_storefront::error::AppError;
use heirloom_storefront::state::Storefront;

use crate::output;

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart with totals
    Show,
    /// Add a product
    Add {
        /// Product id
        product_id: String,

        /// Units to add; clamped to the stock left
        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Set the quantity of a cart line
    Update {
        /// Cart item id
        item_id: String,

        /// New quantity; clamped to 1..=stock
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a cart line
    Remove {
        /// Cart item id
        item_id: String,
    },
    /// Remove every line
    Clear,
}

pub async fn run(action: CartAction, state: &Storefront) -> Result<(), AppError> {
    match action {
        CartAction::Show => {}
        CartAction::Add {
            product_id,
            quantity,
        } => {
            let product = state
                .client()
                .get_product(&ProductId::new(product_id))
                .await?;
            let actions = state.cart_actions(Some(ActionProduct::from(&product)));
            settle(&actions, actions.add_to_cart(quantity).await)?;
            output::line(&format!("Added {} to your cart.", product.name));
        }
        CartAction::Update { item_id, quantity } => {
            let actions = state.cart_actions(None);
            let item_id = CartItemId::new(item_id);
            settle(&actions, actions.update_quantity(&item_id, quantity).await)?;
        }
        CartAction::Remove { item_id } => {
            let actions = state.cart_actions(None);
            let item_id = CartItemId::new(item_id);
            settle(&actions, actions.remove_from_cart(&item_id).await)?;
        }
        CartAction::Clear => {
            let actions = state.cart_actions(None);
            settle(&actions, actions.clear_cart().await)?;
        }
    }

    let view = CartView::new(&state.cart().snapshot(), &state.config().pricing);
    output::cart(&view);
    Ok(())
}

/// Surface the control's own message for backend failures, which is what a
/// customer would see next to the button.
fn settle(actions: &CartActions<'_, ApiClient>, result: Result<(), CartError>) -> Result<(), AppError> {
    match result {
        Ok(()) => Ok(()),
        Err(CartError::Api(e)) => {
            let message = actions.error().unwrap_or_else(|| e.server_message().to_string());
            AppError::from(e).report();
            Err(AppError::BadRequest(message))
        }
        Err(e) => Err(e.into()),
    }
}
