//! Storefront state shared across commands.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::auth::AuthSession;
use crate::cart::{ActionProduct, CartActions, CartStore};
use crate::checkout::CheckoutFlow;
use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::storage::LocalStorage;

/// Application state shared across the front end.
///
/// Owns the API client, local storage, the cart store and the auth session.
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: StorefrontConfig,
    client: ApiClient,
    storage: Arc<LocalStorage>,
    cart: CartStore<ApiClient>,
    auth: AuthSession,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("api", &self.inner.config.api_base_url.as_str())
            .field("session_id", self.inner.cart.session_id())
            .finish_non_exhaustive()
    }
}

impl Storefront {
    /// Build the state with file-backed storage under the configured data
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the storage
    /// directory cannot be created.
    pub fn new(config: StorefrontConfig) -> Result<Self, AppError> {
        let storage = LocalStorage::open(config.storage_path())?;
        Self::with_storage(config, storage)
    }

    /// Build the state over the given storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or a new cart
    /// session id cannot be persisted.
    pub fn with_storage(config: StorefrontConfig, storage: LocalStorage) -> Result<Self, AppError> {
        let client = ApiClient::new(&config)?;
        let storage = Arc::new(storage);
        let session_id = storage.cart_session_id()?;
        let cart = CartStore::new(client.clone(), session_id);
        let auth = AuthSession::new(client.clone(), Arc::clone(&storage));

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config,
                client,
                storage,
                cart,
                auth,
            }),
        })
    }

    /// Restore the signed-in user and load the cart.
    ///
    /// Neither step is fatal: a cart failure is recorded in the cart store's
    /// error and an auth failure leaves the session signed out.
    pub async fn init(&self) {
        if let Err(e) = self.inner.auth.restore().await {
            AppError::from(e).report();
        }
        if let Err(e) = self.inner.cart.init().await {
            tracing::warn!(error = %e, "Cart failed to load");
        }
    }

    /// Flush local storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage file cannot be written.
    pub fn shutdown(&self) -> Result<(), AppError> {
        self.inner.storage.flush()?;
        tracing::debug!("Storefront state flushed");
        Ok(())
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the REST API client.
    #[must_use]
    pub fn client(&self) -> &ApiClient {
        &self.inner.client
    }

    /// Get a reference to local storage.
    #[must_use]
    pub fn storage(&self) -> &LocalStorage {
        &self.inner.storage
    }

    /// Get a reference to the cart store.
    #[must_use]
    pub fn cart(&self) -> &CartStore<ApiClient> {
        &self.inner.cart
    }

    /// Get a reference to the auth session.
    #[must_use]
    pub fn auth(&self) -> &AuthSession {
        &self.inner.auth
    }

    /// Cart controls bound to `product`, or unbound for cart-page actions.
    #[must_use]
    pub fn cart_actions(&self, product: Option<ActionProduct>) -> CartActions<'_, ApiClient> {
        match product {
            Some(product) => CartActions::for_product(&self.inner.cart, product),
            None => CartActions::new(&self.inner.cart),
        }
    }

    /// A fresh checkout flow over the cart, submitting through the API client.
    #[must_use]
    pub fn checkout(&self) -> CheckoutFlow<'_, ApiClient, ApiClient> {
        CheckoutFlow::new(
            &self.inner.cart,
            &self.inner.client,
            self.inner.config.pricing.clone(),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::keys;

    fn config() -> StorefrontConfig {
        StorefrontConfig::from_lookup(|key| match key {
            "HEIRLOOM_TAX_RATE" => Some("0.07".to_string()),
            "HEIRLOOM_API_URL" => Some("http://127.0.0.1:9/api".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn test_session_id_is_persisted() {
        let state = Storefront::with_storage(config(), LocalStorage::in_memory()).unwrap();
        let stored = state.storage().get(keys::CART_SESSION_ID).unwrap();
        assert_eq!(state.cart().session_id().as_str(), stored);
    }

    #[test]
    fn test_existing_session_id_is_reused() {
        let storage = LocalStorage::in_memory();
        storage.set(keys::CART_SESSION_ID, "session-existing").unwrap();
        let state = Storefront::with_storage(config(), storage).unwrap();
        assert_eq!(state.cart().session_id().as_str(), "session-existing");
    }

    #[test]
    fn test_clones_share_state() {
        let state = Storefront::with_storage(config(), LocalStorage::in_memory()).unwrap();
        let clone = state.clone();
        assert_eq!(state.cart().session_id(), clone.cart().session_id());
        assert!(!clone.auth().is_authenticated());
    }
}
