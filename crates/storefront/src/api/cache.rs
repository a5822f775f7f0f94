//! Cache entries for catalog responses.

use super::types::{Category, Product, ProductPage};

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Page(ProductPage),
    Category(Box<Category>),
    Categories(Vec<Category>),
}

/// Cache key for a single product.
pub fn product_key(id: &str) -> String {
    format!("product:{id}")
}

/// Cache key for a paged listing. `scope` names the listing (`all`,
/// `featured`, `category:<id>`, `tribe:<id>`).
pub fn page_key(scope: &str, page: u32, limit: u32) -> String {
    format!("products:{scope}:{page}:{limit}")
}

/// Cache key for the full category list.
pub const CATEGORIES_KEY: &str = "categories:all";

/// Cache key for a single category.
pub fn category_key(id: &str) -> String {
    format!("category:{id}")
}
