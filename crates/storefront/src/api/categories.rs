//! Category gateway.
//!
//! The list and single categories share the product cache. Slug lookups go
//! to the backend every time, like product slugs.

use heirloom_core::CategoryId;
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::cache::{self, CacheValue};
use super::products::unwrap_envelope;
use super::types::{Category, MaybeEnveloped};
use super::{ApiClient, ApiError};

impl ApiClient {
    // =========================================================================
    // Category Methods
    // =========================================================================

    /// List every category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or reports `success: false`.
    #[instrument(skip(self))]
    pub async fn get_categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(cached)) = self.cached(cache::CATEGORIES_KEY).await {
            debug!("Cache hit for category list");
            return Ok(cached);
        }

        let url = self.endpoint(&["categories"])?;
        let categories: Vec<Category> = self.fetch_payload(url).await?;
        debug!(count = categories.len(), "Fetched categories");

        self.cache(
            cache::CATEGORIES_KEY.to_string(),
            CacheValue::Categories(categories.clone()),
        )
        .await;

        Ok(categories)
    }

    /// Categories flagged as featured, in backend order.
    ///
    /// # Errors
    ///
    /// Returns an error if the category list cannot be fetched.
    #[instrument(skip(self))]
    pub async fn featured_categories(&self) -> Result<Vec<Category>, ApiError> {
        let mut categories = self.get_categories().await?;
        categories.retain(|category| category.featured);
        Ok(categories)
    }

    /// Get a category by id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the category does not exist, or
    /// another error if the API request fails.
    #[instrument(skip(self), fields(category_id = %category_id))]
    pub async fn get_category(&self, category_id: &CategoryId) -> Result<Category, ApiError> {
        let cache_key = cache::category_key(category_id.as_str());

        if let Some(CacheValue::Category(category)) = self.cached(&cache_key).await {
            debug!("Cache hit for category");
            return Ok(*category);
        }

        let url = self.endpoint(&["categories", category_id.as_str()])?;
        let category = self.fetch_category(url, category_id.as_str()).await?;

        self.cache(cache_key, CacheValue::Category(Box::new(category.clone())))
            .await;

        Ok(category)
    }

    /// Get a category by its URL slug.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if no category has this slug, or another
    /// error if the API request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_category_by_slug(&self, slug: &str) -> Result<Category, ApiError> {
        let url = self.endpoint(&["categories", "slug", slug])?;
        self.fetch_category(url, slug).await
    }

    async fn fetch_category(&self, url: Url, what: &str) -> Result<Category, ApiError> {
        match self.fetch_payload(url).await {
            Err(ApiError::Parse(_)) => {
                Err(ApiError::NotFound(format!("Category not found: {what}")))
            }
            other => other,
        }
    }

    async fn fetch_payload<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let body: MaybeEnveloped<T> = self.send_json(self.request(Method::GET, url)).await?;
        match body {
            MaybeEnveloped::Bare(payload) => Ok(payload),
            MaybeEnveloped::Enveloped(envelope) => unwrap_envelope(envelope),
        }
    }
}
