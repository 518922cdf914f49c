//! Wire types for API requests and responses.
//!
//! Response types mirror the API's canonical JSON. Timestamps are optional
//! so fallback data can be built without them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lumina_core::{CartId, CategoryId, OrderId, Price, ProductId, UserId, UserRole};

// =============================================================================
// Resources
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub product_ids: Vec<ProductId>,
    pub total: Price,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A cart as stored: duplicates in `product_ids` are quantities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub product_ids: Vec<ProductId>,
    pub total: Price,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    pub user_id: UserId,
    pub lines: Vec<CartLine>,
    pub subtotal: Price,
    pub item_count: usize,
    #[serde(default)]
    pub missing_product_ids: Vec<ProductId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCheckout {
    pub url: String,
    pub message: String,
    pub total: Price,
}

// =============================================================================
// Responses
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: User,
}

/// Confirmation body returned by deletes.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CountResponse {
    pub count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CoverUpload {
    pub cover_image: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GalleryUpload {
    pub gallery: Vec<String>,
}

// =============================================================================
// Requests
// =============================================================================

/// Product create/update body. `None` fields are left out, which an update
/// treats as "keep the stored value".
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gallery: Option<Vec<String>>,
}

/// User create/update body. An empty or absent password on update keeps
/// the current one.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Order body. The owner defaults to the caller; the total defaults to the
/// catalog price of the items.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub product_ids: Vec<ProductId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<Price>,
}

/// A file to upload: client-side name (for its extension) and contents.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_tolerates_missing_optional_fields() {
        let product: Product =
            serde_json::from_str(r#"{"id":3,"name":"Anillo Sol","price":40.5}"#).unwrap();
        assert_eq!(product.id, ProductId::new(3));
        assert!(product.gallery.is_empty());
        assert!(product.cover_image.is_none());
    }

    #[test]
    fn test_product_input_skips_absent_fields() {
        let input = ProductInput {
            name: Some("Collar Luna".to_string()),
            quantity: Some(2),
            ..ProductInput::default()
        };
        assert_eq!(
            serde_json::to_value(&input).unwrap(),
            serde_json::json!({"name": "Collar Luna", "quantity": 2})
        );
    }
}
