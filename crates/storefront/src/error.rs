//! Unified error handling with Sentry integration.
//!
//! Every layer has its own `thiserror` enum. [`AppError`] gathers them for
//! front ends: [`AppError::user_message`] gives text that is safe to show a
//! customer and [`AppError::report`] captures unexpected failures to Sentry
//! before logging them.

use thiserror::Error;

use crate::api::{ApiError, DEFAULT_ERROR_MESSAGE, is_client_facing};
use crate::auth::AuthError;
use crate::cart::{CartError, messages};
use crate::checkout::{CheckoutError, ORDER_FAILED};
use crate::config::ConfigError;
use crate::storage::StorageError;

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Backend request failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout operation failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Local storage could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad input from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether this error is unexpected and worth reporting to Sentry.
    ///
    /// Rejections of the customer's own input (4xx answers, validation, stock
    /// checks) are not.
    #[must_use]
    pub fn is_unexpected(&self) -> bool {
        match self {
            Self::Api(err)
            | Self::Cart(CartError::Api(err))
            | Self::Checkout(CheckoutError::Submit(err))
            | Self::Auth(AuthError::Api(err)) => api_unexpected(err),
            Self::Storage(_)
            | Self::Cart(CartError::Storage(_))
            | Self::Auth(AuthError::Storage(_) | AuthError::Incomplete(_))
            | Self::Internal(_) => true,
            _ => false,
        }
    }

    /// Text safe to show the user. Internal details never pass through.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.to_string(),
            Self::Api(err) => err.server_message().to_string(),
            Self::Cart(err) => cart_message(err),
            Self::Checkout(err) => checkout_message(err),
            Self::Auth(err) => err.user_message(),
            Self::NotFound(what) => format!("Not found: {what}"),
            Self::BadRequest(msg) => msg.clone(),
            Self::Storage(_) | Self::Internal(_) => DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }

    /// Capture unexpected errors to Sentry and log them with the event id.
    /// Expected errors are logged at `warn`.
    pub fn report(&self) {
        if self.is_unexpected() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Storefront error"
            );
        } else {
            tracing::warn!(error = %self, "Storefront request rejected");
        }
    }
}

fn api_unexpected(err: &ApiError) -> bool {
    !err.status().is_some_and(is_client_facing)
}

fn cart_message(err: &CartError) -> String {
    match err {
        CartError::NoCart => messages::FETCH_FAILED.to_string(),
        CartError::InFlight => "Please wait for the current cart update to finish".to_string(),
        CartError::NoProduct => messages::action::NO_PRODUCT.to_string(),
        CartError::OutOfStock => messages::action::OUT_OF_STOCK.to_string(),
        CartError::UnknownItem(_) => "That item is no longer in your cart".to_string(),
        CartError::Api(err) => err.server_message().to_string(),
        CartError::Storage(_) => DEFAULT_ERROR_MESSAGE.to_string(),
    }
}

fn checkout_message(err: &CheckoutError) -> String {
    match err {
        CheckoutError::Validation(v) => v.to_string(),
        CheckoutError::EmptyCart => "Your cart is empty".to_string(),
        CheckoutError::Submit(err) if !api_unexpected(err) => err.server_message().to_string(),
        CheckoutError::Submit(_) => ORDER_FAILED.to_string(),
        other => other.to_string(),
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of cart and
/// checkout actions leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
