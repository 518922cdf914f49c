//! Cart domain types and derived views.

use chrono::{DateTime, Utc};
use serde::Serialize;

use lumina_core::{CartContents, CartId, Price, ProductId, UserId};

use super::Product;

/// A user's cart as stored: a product id multiset and a running total.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub product_ids: Vec<ProductId>,
    pub total: Price,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Copy the mutable part into the multiset type.
    #[must_use]
    pub fn contents(&self) -> CartContents {
        CartContents::new(self.product_ids.clone(), self.total)
    }
}

/// One grouped line of a cart summary.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
    pub unit_price: Price,
    pub line_total: Price,
}

/// A cart grouped by product with resolved catalog data.
#[derive(Debug, Clone, Serialize)]
pub struct CartSummary {
    pub user_id: UserId,
    pub lines: Vec<CartLine>,
    pub subtotal: Price,
    pub item_count: usize,
    /// Ids in the cart whose product no longer exists.
    pub missing_product_ids: Vec<ProductId>,
}

/// Checkout deep link for the external messaging app.
#[derive(Debug, Clone, Serialize)]
pub struct CartCheckout {
    pub url: String,
    pub message: String,
    pub total: Price,
}
