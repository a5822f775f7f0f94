//! REST client for the Heirloom backend.
//!
//! # Architecture
//!
//! - One `reqwest` client per process, shared through `Arc`
//! - Every request carries the configured timeout, so a hung backend
//!   surfaces as [`ApiError::Timeout`] instead of a stuck loading flag
//! - Product listings, single products and categories are cached via `moka`
//!   (5 minute TTL); carts, auth and orders are never cached
//!
//! # Example
//!
//! ```rust,ignore
//! use heirloom_storefront::api::{ApiClient, CartGateway};
//!
//! let client = ApiClient::new(&config)?;
//! let cart = client.get_cart(&session_id).await?;
//! ```

pub mod auth;
mod cache;
pub mod cart;
pub mod categories;
pub mod orders;
pub mod products;
pub mod types;

pub use cart::CartGateway;
pub use orders::{OrderPlacement, OrderSubmitter, PaymentNext};
pub use types::*;

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::config::StorefrontConfig;

use cache::CacheValue;

/// Message used when the backend gives no usable error text.
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// How much of a response body goes into a log line.
const LOG_BODY_LIMIT: usize = 500;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connection refused, TLS, decode of the raw body).
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The backend answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The requested resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The body could not be decoded into the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A request URL could not be built from the base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }
}

impl ApiError {
    /// HTTP status associated with this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::NotFound(_) => Some(StatusCode::NOT_FOUND.as_u16()),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            Self::Timeout | Self::Parse(_) | Self::InvalidUrl(_) => None,
        }
    }

    /// Message suitable for showing to a customer.
    ///
    /// Backend messages are passed through for 4xx answers and `success: false`
    /// envelopes (they describe the customer's input); everything else
    /// collapses to [`DEFAULT_ERROR_MESSAGE`].
    #[must_use]
    pub fn server_message(&self) -> &str {
        match self {
            Self::Api { status, message } if is_client_facing(*status) => message,
            Self::NotFound(message) => message,
            _ => DEFAULT_ERROR_MESSAGE,
        }
    }
}

/// Statuses whose message describes the customer's own request: 4xx answers
/// and 200 answers carrying `success: false`.
pub(crate) fn is_client_facing(status: u16) -> bool {
    status == 200 || (400..500).contains(&status)
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront REST API.
///
/// Cheap to clone; clones share the connection pool, bearer token and cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<SecretString>>,
    cache: Cache<String, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("authenticated", &self.has_token())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client from the storefront configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        Self::with_base_url(config.api_base_url.clone(), config.request_timeout)
    }

    /// Create a client against an explicit base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_base_url(base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("heirloom/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url,
                token: RwLock::new(None),
                cache,
            }),
        })
    }

    /// The configured API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Install or remove the bearer token sent with authenticated requests.
    pub fn set_token(&self, token: Option<SecretString>) {
        let mut guard = self
            .inner
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = token;
    }

    /// Returns `true` if a bearer token is installed.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Drop every cached catalog response.
    pub fn invalidate_cache(&self) {
        self.inner.cache.invalidate_all();
    }

    /// Build an absolute URL from path segments below the base URL.
    ///
    /// Segments are percent-encoded individually, so ids containing `/` or
    /// `?` cannot escape their position in the path.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start a request, attaching the bearer token when one is installed.
    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.inner.client.request(method, url);
        let token = self
            .inner
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match token.as_ref() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and decode a JSON body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let body = self.execute(request).await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&body, LOG_BODY_LIMIT),
                "Failed to parse storefront API response"
            );
            ApiError::Parse(e.to_string())
        })
    }

    /// Send a request whose body is irrelevant on success.
    pub(crate) async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        self.execute(request).await.map(drop)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = error_message(&body);
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(message = %message, "Storefront API resource not found");
            return Err(ApiError::NotFound(message));
        }

        tracing::error!(
            status = %status,
            body = %truncate(&body, LOG_BODY_LIMIT),
            "Storefront API returned non-success status"
        );
        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }

    pub(crate) async fn cached(&self, key: &str) -> Option<CacheValue> {
        self.inner.cache.get(key).await
    }

    pub(crate) async fn cache(&self, key: String, value: CacheValue) {
        self.inner.cache.insert(key, value).await;
    }
}

/// Pull the `message` field out of an error body, falling back to
/// [`DEFAULT_ERROR_MESSAGE`].
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned)
        })
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string())
}

fn truncate(body: &str, limit: usize) -> String {
    body.chars().take(limit).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::with_base_url(Url::parse(base).unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let client = client("http://localhost:5000/api");
        let url = client.endpoint(&["carts", "items", "item-1"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/carts/items/item-1");
    }

    #[test]
    fn test_endpoint_tolerates_trailing_slash() {
        let client = client("http://localhost:5000/api/");
        let url = client.endpoint(&["products", "featured"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/products/featured");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = client("http://localhost:5000/api");
        let url = client.endpoint(&["carts", "a/b?c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/carts/a%2Fb%3Fc");
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"message":"Out of stock"}"#), "Out of stock");
        assert_eq!(error_message(r#"{"message":"  "}"#), DEFAULT_ERROR_MESSAGE);
        assert_eq!(error_message("<html>Bad Gateway</html>"), DEFAULT_ERROR_MESSAGE);
        assert_eq!(error_message(""), DEFAULT_ERROR_MESSAGE);
    }

    #[test]
    fn test_server_message_hides_5xx() {
        let bad_request = ApiError::Api {
            status: 400,
            message: "Invalid quantity".to_string(),
        };
        let server = ApiError::Api {
            status: 500,
            message: "stack trace".to_string(),
        };
        assert_eq!(bad_request.server_message(), "Invalid quantity");
        assert_eq!(server.server_message(), DEFAULT_ERROR_MESSAGE);
        assert_eq!(ApiError::Timeout.server_message(), DEFAULT_ERROR_MESSAGE);
        assert_eq!(ApiError::Timeout.status(), None);
        assert_eq!(ApiError::NotFound("x".into()).status(), Some(404));
    }

    #[test]
    fn test_token_roundtrip() {
        let client = client("http://localhost:5000/api");
        assert!(!client.has_token());
        client.set_token(Some(SecretString::from("tok".to_string())));
        assert!(client.has_token());
        client.set_token(None);
        assert!(!client.has_token());
    }
}
