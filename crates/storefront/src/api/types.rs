//! Wire types for the storefront REST API.
//!
//! Field names follow the backend's camelCase JSON. Prices go through
//! [`Money`], which accepts both numbers and numeric strings.

use chrono::{DateTime, Utc};
use heirloom_core::{
    CartId, CartItemId, CartSessionId, CategoryId, Money, OrderId, OrderStatus,
    PaymentMethodKind, ProductId, Quantity, TribeId, UserId, UserRole,
};
use serde::{Deserialize, Serialize};

use crate::cart::pricing;

// =============================================================================
// Envelope Types
// =============================================================================

/// Standard `{success, data, pagination, message}` response envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub pagination: Option<Pagination>,
    pub message: Option<String>,
}

/// `{message}` body returned by delete endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

/// Page metadata for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl Pagination {
    /// Returns `true` if another page follows this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

// =============================================================================
// Catalog Types
// =============================================================================

/// Product category.
///
/// The backend sends the picture as either `image` or `imageUrl`; both land
/// in [`Category::image_url`], with `image` winning when both are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawCategory")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub featured: bool,
    pub product_count: Option<u64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCategory {
    #[serde(alias = "_id")]
    id: CategoryId,
    name: String,
    #[serde(default)]
    slug: String,
    description: Option<String>,
    image: Option<String>,
    image_url: Option<String>,
    featured: Option<bool>,
    #[serde(rename = "_count")]
    count: Option<CategoryCount>,
}

#[derive(Deserialize)]
struct CategoryCount {
    #[serde(default)]
    products: u64,
}

impl From<RawCategory> for Category {
    fn from(raw: RawCategory) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            slug: raw.slug,
            description: raw.description,
            image_url: raw.image.filter(|s| !s.is_empty()).or(raw.image_url),
            featured: raw.featured.unwrap_or(false),
            product_count: raw.count.map(|c| c.products),
        }
    }
}

/// Response body of the category endpoints: either the standard envelope
/// or the bare payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MaybeEnveloped<T> {
    Bare(T),
    Enveloped(Envelope<T>),
}

/// Tribe (cultural origin) of an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tribe {
    pub id: TribeId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub region: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
}

/// A sellable item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub price: Money,
    /// Units in stock.
    #[serde(default, alias = "stockQuantity")]
    pub inventory: u32,
    #[serde(default)]
    pub images: Vec<String>,
    pub category_id: Option<CategoryId>,
    pub category: Option<Category>,
    pub tribe_id: Option<TribeId>,
    pub tribe: Option<Tribe>,
    #[serde(default = "default_true")]
    pub is_published: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_antique: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

const fn default_true() -> bool {
    true
}

impl Product {
    /// Returns `true` if at least one unit can be added to a cart.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.inventory > 0
    }

    /// First image, used as the primary thumbnail.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

/// `data` payload of product list responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductsData {
    #[serde(default)]
    pub products: Vec<Product>,
}

/// `data` payload of single product responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductData {
    pub product: Product,
}

/// One page of products.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub pagination: Option<Pagination>,
}

// =============================================================================
// Cart Types
// =============================================================================

/// Product fields denormalized onto a cart line for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub image_url: Option<String>,
    /// Stock level, when the backend includes it in the snapshot.
    #[serde(default, alias = "stockQuantity")]
    pub inventory: Option<u32>,
}

/// A cart line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    /// Unit price captured when the item was added.
    pub price: Money,
    pub product: CartProduct,
}

impl CartItem {
    /// Unit price × quantity.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }

    /// Upper bound for this line's quantity, if known.
    #[must_use]
    pub const fn stock(&self) -> Option<u32> {
        self.product.inventory
    }
}

/// A shopping cart keyed by an anonymous session id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    pub session_id: CartSessionId,
    /// Server-computed total. Informational only; see [`Cart::subtotal`].
    pub total: Option<Money>,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Sum of price × quantity over all lines, recomputed locally.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        pricing::subtotal(self.items.iter().map(|item| (item.price, item.quantity)))
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity.get()).sum()
    }

    /// Returns `true` if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find a line by its id.
    #[must_use]
    pub fn item(&self, item_id: &CartItemId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.id == item_id)
    }

    /// Find the line holding a product.
    #[must_use]
    pub fn item_for_product(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.product_id == product_id)
    }
}

/// Body of `POST /carts/{cartId}/items`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest<'a> {
    pub product_id: &'a ProductId,
    pub quantity: Quantity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
}

/// Body of `PATCH /carts/items/{itemId}`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateQuantityRequest {
    pub quantity: Quantity,
}

// =============================================================================
// Auth Types
// =============================================================================

/// An authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl User {
    /// Full name if both parts are known, otherwise whichever exists, else
    /// the email.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(name), None) | (None, Some(name)) => name.to_string(),
            (None, None) => self.email.clone(),
        }
    }
}

/// `data` payload of auth responses.
#[derive(Debug, Clone, Deserialize)]
pub struct UserData {
    pub user: User,
}

/// Response of every `/auth/*` endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    pub token: Option<String>,
    pub data: Option<UserData>,
    pub message: Option<String>,
    pub reset_token: Option<String>,
}

impl AuthResponse {
    /// The user payload, if present.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.data.as_ref().map(|d| &d.user)
    }
}

// =============================================================================
// Order Types
// =============================================================================

/// Line of an order submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemRequest {
    pub product: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub price: Money,
    pub quantity: Quantity,
}

/// Shipping address as sent to and returned by the orders API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddressPayload {
    #[serde(default)]
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: String,
}

/// Body of `POST /orders`.
///
/// Card details are never part of this payload; they belong to the card
/// processor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub order_items: Vec<OrderItemRequest>,
    pub shipping_address: ShippingAddressPayload,
    pub payment_method: PaymentMethodKind,
    pub items_price: Money,
    pub tax_price: Money,
    pub shipping_price: Money,
    pub total_price: Money,
    pub currency: &'static str,
}

/// An order as returned by the orders API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: OrderId,
    #[serde(default)]
    pub order_items: Vec<OrderItemRequest>,
    pub shipping_address: Option<ShippingAddressPayload>,
    pub payment_method: Option<PaymentMethodKind>,
    #[serde(default)]
    pub tax_price: Money,
    #[serde(default)]
    pub shipping_price: Money,
    #[serde(default)]
    pub total_price: Money,
    #[serde(default)]
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_delivered: bool,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: Option<DateTime<Utc>>,
}

/// Response of `POST /orders/{id}/paypal`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaypalInitiation {
    pub approval_url: String,
    pub payment_id: Option<String>,
}

/// Response of the PayPal confirmation callback and status check.
///
/// The backend answers with different subsets of these fields depending on
/// where the payment is, so all of them are optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaypalPaymentStatus {
    pub success: Option<bool>,
    pub status: Option<String>,
    pub is_paid: Option<bool>,
    pub message: Option<String>,
    pub order: Option<Order>,
}

impl PaypalPaymentStatus {
    /// Whether the payment has been captured, from the flag or the embedded
    /// order.
    #[must_use]
    pub fn paid(&self) -> bool {
        self.is_paid
            .or_else(|| self.order.as_ref().map(|order| order.is_paid))
            .unwrap_or(false)
    }
}

/// Payment receipt recorded by `POST /orders/{id}/pay`.
///
/// Keys stay snake_case; this is the payment provider's receipt format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentResult {
    pub id: String,
    pub status: String,
    pub update_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
}
