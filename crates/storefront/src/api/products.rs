//! Product gateway.
//!
//! Listings and single products are cached for five minutes. Search results
//! depend on free text and are always fetched fresh.

use heirloom_core::{CategoryId, ProductId, TribeId};
use reqwest::Method;
use tracing::{debug, instrument};
use url::Url;

use super::cache::{self, CacheValue};
use super::types::{Envelope, Product, ProductData, ProductPage, ProductsData};
use super::{ApiClient, ApiError, DEFAULT_ERROR_MESSAGE};

/// Default page number for listings.
pub const DEFAULT_PAGE: u32 = 1;

/// Default page size for listings.
pub const DEFAULT_LIMIT: u32 = 12;

/// Page selection for listing endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Create a page request; zero values fall back to the defaults.
    #[must_use]
    pub const fn new(page: u32, limit: u32) -> Self {
        Self {
            page: if page == 0 { DEFAULT_PAGE } else { page },
            limit: if limit == 0 { DEFAULT_LIMIT } else { limit },
        }
    }

    fn apply(self, url: &mut Url) {
        url.query_pairs_mut()
            .append_pair("page", &self.page.to_string())
            .append_pair("limit", &self.limit.to_string());
    }
}

impl ApiClient {
    // =========================================================================
    // Product Methods
    // =========================================================================

    /// List all published products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or reports `success: false`.
    #[instrument(skip(self), fields(page = page.page, limit = page.limit))]
    pub async fn get_products(&self, page: PageRequest) -> Result<ProductPage, ApiError> {
        self.cached_page("all", &["products"], page).await
    }

    /// List featured products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or reports `success: false`.
    #[instrument(skip(self), fields(page = page.page, limit = page.limit))]
    pub async fn featured_products(&self, page: PageRequest) -> Result<ProductPage, ApiError> {
        self.cached_page("featured", &["products", "featured"], page)
            .await
    }

    /// List products in a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or reports `success: false`.
    #[instrument(skip(self), fields(category_id = %category_id))]
    pub async fn products_by_category(
        &self,
        category_id: &CategoryId,
        page: PageRequest,
    ) -> Result<ProductPage, ApiError> {
        let scope = format!("category:{category_id}");
        self.cached_page(&scope, &["products", "category", category_id.as_str()], page)
            .await
    }

    /// List products from a tribe.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or reports `success: false`.
    #[instrument(skip(self), fields(tribe_id = %tribe_id))]
    pub async fn products_by_tribe(
        &self,
        tribe_id: &TribeId,
        page: PageRequest,
    ) -> Result<ProductPage, ApiError> {
        let scope = format!("tribe:{tribe_id}");
        self.cached_page(&scope, &["products", "tribe", tribe_id.as_str()], page)
            .await
    }

    /// Full-text product search. Never cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or reports `success: false`.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search_products(
        &self,
        query: &str,
        page: PageRequest,
    ) -> Result<ProductPage, ApiError> {
        let mut url = self.endpoint(&["products", "search"])?;
        url.query_pairs_mut().append_pair("query", query);
        page.apply(&mut url);
        self.fetch_page(url).await
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the product does not exist, or
    /// another error if the API request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(&self, product_id: &ProductId) -> Result<Product, ApiError> {
        let cache_key = cache::product_key(product_id.as_str());

        if let Some(CacheValue::Product(product)) = self.cached(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&["products", product_id.as_str()])?;
        let product = self.fetch_product(url, product_id.as_str()).await?;

        self.cache(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get a product by its URL slug.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if no product has this slug, or another
    /// error if the API request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<Product, ApiError> {
        let url = self.endpoint(&["products", "slug", slug])?;
        self.fetch_product(url, slug).await
    }

    async fn cached_page(
        &self,
        scope: &str,
        segments: &[&str],
        page: PageRequest,
    ) -> Result<ProductPage, ApiError> {
        let cache_key = cache::page_key(scope, page.page, page.limit);

        if let Some(CacheValue::Page(cached)) = self.cached(&cache_key).await {
            debug!(scope, "Cache hit for product listing");
            return Ok(cached);
        }

        let mut url = self.endpoint(segments)?;
        page.apply(&mut url);
        let result = self.fetch_page(url).await?;

        self.cache(cache_key, CacheValue::Page(result.clone())).await;

        Ok(result)
    }

    async fn fetch_page(&self, url: Url) -> Result<ProductPage, ApiError> {
        let envelope: Envelope<ProductsData> =
            self.send_json(self.request(Method::GET, url)).await?;
        let pagination = envelope.pagination;
        let data = unwrap_envelope(envelope)?;

        Ok(ProductPage {
            products: data.products,
            pagination,
        })
    }

    async fn fetch_product(&self, url: Url, what: &str) -> Result<Product, ApiError> {
        let envelope: Envelope<ProductData> =
            self.send_json(self.request(Method::GET, url)).await?;

        match unwrap_envelope(envelope) {
            Ok(data) => Ok(data.product),
            Err(ApiError::Parse(_)) => Err(ApiError::NotFound(format!("Product not found: {what}"))),
            Err(e) => Err(e),
        }
    }
}

/// Turn a `{success, data, message}` envelope into its payload.
///
/// `success: false` becomes [`ApiError::Api`] carrying the server message; a
/// successful envelope without `data` becomes [`ApiError::Parse`].
pub(super) fn unwrap_envelope<T>(envelope: Envelope<T>) -> Result<T, ApiError> {
    if !envelope.success {
        return Err(ApiError::Api {
            status: 200,
            message: envelope
                .message
                .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
        });
    }

    envelope
        .data
        .ok_or_else(|| ApiError::Parse("response envelope has no data".to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults() {
        assert_eq!(PageRequest::default(), PageRequest::new(1, 12));
        assert_eq!(PageRequest::new(0, 0), PageRequest::default());
        assert_eq!(PageRequest::new(3, 24).limit, 24);
    }

    #[test]
    fn test_page_request_query() {
        let mut url = Url::parse("http://localhost/api/products").unwrap();
        PageRequest::new(2, 6).apply(&mut url);
        assert_eq!(url.query(), Some("page=2&limit=6"));
    }

    #[test]
    fn test_unwrap_envelope_failure_carries_message() {
        let envelope: Envelope<ProductsData> = serde_json::from_value(serde_json::json!({
            "success": false,
            "message": "Category is archived"
        }))
        .unwrap();

        match unwrap_envelope(envelope) {
            Err(ApiError::Api { message, .. }) => assert_eq!(message, "Category is archived"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_unwrap_envelope_missing_data() {
        let envelope: Envelope<ProductsData> =
            serde_json::from_value(serde_json::json!({ "success": true })).unwrap();
        assert!(matches!(unwrap_envelope(envelope), Err(ApiError::Parse(_))));
    }
}
