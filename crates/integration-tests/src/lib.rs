//! Integration tests for Heirloom.
//!
//! Every test runs the real `reqwest` client against a `wiremock` server that
//! stands in for the Heirloom REST backend, so no external services are
//! needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p heirloom-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_gateway` - cart endpoints, bodies and error mapping
//! - `products` - product envelopes and caching
//! - `categories` - category payloads, caching and the featured filter
//! - `cart_store` - cart store and cart actions over HTTP
//! - `checkout` - checkout flow through order submission
//! - `auth` - token persistence and restore
//! - `orders` - order history and PayPal confirmation

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use std::time::Duration;

use heirloom_storefront::api::ApiClient;
use heirloom_storefront::config::StorefrontConfig;
use heirloom_storefront::state::Storefront;
use heirloom_storefront::storage::{LocalStorage, keys};
use serde_json::{Value, json};
use wiremock::MockServer;

/// Session id every test storefront starts with.
pub const SESSION_ID: &str = "session-1";

/// Cart id returned by the fixtures.
pub const CART_ID: &str = "cart-1";

/// A mock backend plus helpers for building clients against it.
pub struct TestBackend {
    pub server: MockServer,
}

impl TestBackend {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the mock API, including the `/api` prefix.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("{}/api", self.server.uri())
    }

    /// Configuration pointing at the mock, with a 7% tax rate.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        let api_url = self.api_url();
        StorefrontConfig::from_lookup(move |key| match key {
            "HEIRLOOM_API_URL" => Some(api_url.clone()),
            "HEIRLOOM_TAX_RATE" => Some("0.07".to_string()),
            "STOREFRONT_REQUEST_TIMEOUT_SECS" => Some("2".to_string()),
            _ => None,
        })
        .expect("test config")
    }

    /// A bare client with the given timeout.
    #[must_use]
    pub fn client_with_timeout(&self, timeout: Duration) -> ApiClient {
        ApiClient::with_base_url(self.api_url().parse().expect("mock url"), timeout)
            .expect("client")
    }

    /// A bare client with the default test timeout.
    #[must_use]
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.config()).expect("client")
    }

    /// A storefront over in-memory storage, pinned to [`SESSION_ID`].
    #[must_use]
    pub fn storefront(&self) -> Storefront {
        let storage = LocalStorage::in_memory();
        storage
            .set(keys::CART_SESSION_ID, SESSION_ID)
            .expect("seed session id");
        self.storefront_with(storage)
    }

    /// A storefront over the given storage.
    #[must_use]
    pub fn storefront_with(&self, storage: LocalStorage) -> Storefront {
        Storefront::with_storage(self.config(), storage).expect("storefront")
    }
}

/// JSON fixtures in the backend's wire format.
pub mod fixtures {
    use super::{CART_ID, SESSION_ID, Value, json};

    /// A cart line. `stock` of `None` leaves the stock level out.
    #[must_use]
    pub fn line(item_id: &str, product_id: &str, quantity: u32, price: f64, stock: Option<u32>) -> Value {
        let mut product = json!({
            "id": product_id,
            "name": format!("Artifact {product_id}"),
            "price": price,
            "imageUrl": format!("https://cdn.example/{product_id}.jpg"),
        });
        if let Some(stock) = stock {
            product["stockQuantity"] = json!(stock);
        }
        json!({
            "id": item_id,
            "cartId": CART_ID,
            "productId": product_id,
            "quantity": quantity,
            "price": price,
            "product": product,
        })
    }

    /// A cart holding `items`.
    #[must_use]
    pub fn cart(items: &[Value]) -> Value {
        json!({
            "id": CART_ID,
            "sessionId": SESSION_ID,
            "items": items,
        })
    }

    /// A catalog product.
    #[must_use]
    pub fn product(id: &str, name: &str, price: f64, stock: u32) -> Value {
        json!({
            "id": id,
            "name": name,
            "slug": name.to_lowercase().replace(' ', "-"),
            "description": format!("{name}, collected in the field"),
            "price": price,
            "stockQuantity": stock,
            "images": [format!("https://cdn.example/{id}.jpg")],
            "tribe": { "id": "t-1", "name": "Dogon", "region": "West Africa" },
            "category": { "id": "c-1", "name": "Sculpture" },
        })
    }

    /// A `{success, data: {products}, pagination}` envelope.
    #[must_use]
    pub fn product_page(products: &[Value]) -> Value {
        json!({
            "success": true,
            "data": { "products": products },
            "pagination": { "total": products.len(), "page": 1, "limit": 12, "totalPages": 1 },
        })
    }

    /// A `{success, data: {product}}` envelope.
    #[must_use]
    pub fn product_envelope(product: &Value) -> Value {
        json!({ "success": true, "data": { "product": product } })
    }

    /// A category using the `image` spelling of the picture field.
    #[must_use]
    pub fn category(id: &str, name: &str, featured: bool) -> Value {
        json!({
            "id": id,
            "name": name,
            "slug": name.to_lowercase().replace(' ', "-"),
            "image": format!("https://cdn.example/categories/{id}.jpg"),
            "featured": featured,
        })
    }

    /// A successful auth response carrying `token`.
    #[must_use]
    pub fn auth_success(token: &str) -> Value {
        json!({
            "success": true,
            "token": token,
            "data": { "user": user() },
        })
    }

    #[must_use]
    pub fn user() -> Value {
        json!({
            "id": "user-1",
            "email": "collector@example.com",
            "role": "user",
            "firstName": "Ada",
            "lastName": "Collector",
        })
    }

    /// An order as echoed back by `POST /orders`.
    #[must_use]
    pub fn order(id: &str, total: f64) -> Value {
        json!({
            "_id": id,
            "orderItems": [],
            "totalPrice": total,
            "status": "PENDING",
        })
    }
}
