//! Wire types for the commerce API.
//!
//! Field names follow the remote JSON (camelCase, Mongo-style `_id`).
//! Cart responses carry a full product snapshot per line item plus a
//! server-computed total; the client never derives totals itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shopcart_core::{
    CartItemId, OrderId, OrderStatus, PaymentMethod, PaymentStatus, Price, ProductId, UserId,
};

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

/// The authenticated user's profile data.
///
/// Replaced wholesale on login/refresh/update, cleared on logout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<UserAddress>,
}

/// Postal address attached to a user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

/// Patch sent to `PUT /auth/profile`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<UserAddress>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Products
// ─────────────────────────────────────────────────────────────────────────────

/// A product as returned by the catalog endpoints.
///
/// Cart responses embed a trimmed snapshot of this shape (no description,
/// category, or rating), hence the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub brand: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    #[serde(default)]
    pub stock: u32,
}

impl Product {
    /// True when at least one unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Aggregate product rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub average: f64,
    pub count: u32,
}

/// Catalog paging metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u32,
}

/// One page of catalog results.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Sort direction for catalog queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Query parameters for `GET /products`.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<SortOrder>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ProductQuery {
    /// Render as URL query pairs, omitting unset fields.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(brand) = &self.brand {
            pairs.push(("brand", brand.clone()));
        }
        if let Some(min_price) = &self.min_price {
            pairs.push(("minPrice", min_price.amount().to_string()));
        }
        if let Some(max_price) = &self.max_price {
            pairs.push(("maxPrice", max_price.amount().to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort", sort.clone()));
        }
        if let Some(order) = self.order {
            pairs.push(("order", order.as_str().to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cart
// ─────────────────────────────────────────────────────────────────────────────

/// A basket line item: a product snapshot plus quantity and locked-in price.
///
/// Ordering is server-assigned; the uniqueness key is the product id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(rename = "_id")]
    pub id: CartItemId,
    pub product: Product,
    pub quantity: u32,
    /// Unit price locked in when the item was added.
    pub price: Price,
}

impl CartItem {
    /// Line total at the locked-in price. Display-only; the authoritative
    /// total always comes from the server.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// The server-tracked cart for the current user.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub total_amount: Price,
}

// ─────────────────────────────────────────────────────────────────────────────
// Orders
// ─────────────────────────────────────────────────────────────────────────────

/// Shipping address captured at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// Check that every field is filled in.
    ///
    /// # Errors
    ///
    /// Returns the name of the first empty field.
    pub fn validate(&self) -> Result<(), &'static str> {
        let fields = [
            ("name", &self.name),
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("zip code", &self.zip_code),
            ("country", &self.country),
        ];
        for (label, value) in fields {
            if value.trim().is_empty() {
                return Err(label);
            }
        }
        Ok(())
    }
}

/// Request body for `POST /orders`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

/// A line item within a placed order.
///
/// The product reference here is a display snapshot; name and price are
/// denormalized onto the item itself.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderItem {
    #[serde(rename = "_id")]
    pub id: CartItemId,
    pub product: OrderProductRef,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
}

/// Slim product reference embedded in order items.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderProductRef {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub images: Vec<String>,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub order_number: String,
    pub items: Vec<OrderItem>,
    pub total_amount: Price,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub shipping_address: ShippingAddress,
    pub created_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

/// Successful login/registration: identity plus a fresh credential.
///
/// The two are created together and must be installed together.
#[derive(Debug, Clone)]
pub struct AuthSuccess {
    pub user: User,
    pub credential: crate::storage::Credential,
}

/// Liveness probe response from `GET /health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_deserializes_from_wire_shape() {
        let json = r#"{
            "items": [
                {
                    "_id": "ci1",
                    "product": {
                        "_id": "p1",
                        "name": "Mechanical Keyboard",
                        "price": 89.99,
                        "images": ["https://cdn.example.com/kb.jpg"],
                        "brand": "Clacky",
                        "stock": 12
                    },
                    "quantity": 2,
                    "price": 89.99
                }
            ],
            "totalAmount": 179.98
        }"#;

        let cart: Cart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.items.len(), 1);
        let item = &cart.items[0];
        assert_eq!(item.product.id.as_str(), "p1");
        assert_eq!(item.quantity, 2);
        assert_eq!(item.line_total(), cart.total_amount);
    }

    #[test]
    fn test_empty_cart_defaults() {
        let cart: Cart = serde_json::from_str("{}").unwrap();
        assert!(cart.items.is_empty());
        assert_eq!(cart.total_amount, Price::ZERO);
    }

    #[test]
    fn test_order_deserializes_from_wire_shape() {
        let json = r#"{
            "_id": "o1",
            "orderNumber": "ORD-1001",
            "items": [
                {
                    "_id": "oi1",
                    "product": {"_id": "p1", "name": "Mechanical Keyboard", "images": []},
                    "name": "Mechanical Keyboard",
                    "price": 89.99,
                    "quantity": 1
                }
            ],
            "totalAmount": 89.99,
            "status": "processing",
            "paymentStatus": "paid",
            "paymentMethod": "credit_card",
            "shippingAddress": {
                "name": "Alice Smith",
                "street": "1 Main St",
                "city": "Springfield",
                "state": "IL",
                "zipCode": "62701",
                "country": "USA"
            },
            "createdAt": "2026-02-14T09:30:00Z"
        }"#;

        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.order_number, "ORD-1001");
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.payment_method, PaymentMethod::CreditCard);
        assert_eq!(order.items[0].product.name, "Mechanical Keyboard");
    }

    #[test]
    fn test_product_query_pairs() {
        let query = ProductQuery {
            category: Some("keyboards".to_string()),
            search: Some("clacky".to_string()),
            order: Some(SortOrder::Desc),
            page: Some(2),
            limit: Some(12),
            ..ProductQuery::default()
        };

        let pairs = query.to_pairs();
        assert!(pairs.contains(&("category", "keyboards".to_string())));
        assert!(pairs.contains(&("order", "desc".to_string())));
        assert!(pairs.contains(&("page", "2".to_string())));
        assert!(!pairs.iter().any(|(k, _)| *k == "brand"));
    }

    #[test]
    fn test_shipping_address_validation() {
        let mut address = ShippingAddress {
            name: "Alice Smith".to_string(),
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip_code: "62701".to_string(),
            country: "USA".to_string(),
        };
        assert!(address.validate().is_ok());

        address.city = "  ".to_string();
        assert_eq!(address.validate(), Err("city"));
    }

    #[test]
    fn test_profile_patch_serializes_camel_case() {
        let patch = ProfilePatch {
            name: "Alice Smith".to_string(),
            address: Some(UserAddress {
                street: "1 Main St".to_string(),
                city: "Springfield".to_string(),
                state: "IL".to_string(),
                zip_code: "62701".to_string(),
                country: "USA".to_string(),
            }),
        };

        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json["address"]["zipCode"], "62701");
    }
}
