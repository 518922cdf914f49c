//! Order domain types and payloads.
//!
//! Orders are append-only: a flat snapshot of product ids and a total, with
//! no status or line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lumina_core::{OrderId, Price, ProductId, UserId};

use super::ValidationError;

/// A placed order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub product_ids: Vec<ProductId>,
    pub total: Price,
    pub created_at: DateTime<Utc>,
}

/// Validated input for inserting an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub product_ids: Vec<ProductId>,
    /// `None` means the total is computed from catalog prices.
    pub total: Option<Price>,
}

/// Order fields as sent by clients.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFields {
    #[serde(default, alias = "usuarioId")]
    pub user_id: Option<UserId>,
    #[serde(default, alias = "productos")]
    pub product_ids: Option<Vec<ProductId>>,
    #[serde(default)]
    pub total: Option<Price>,
}

impl OrderFields {
    /// Validate, defaulting the owner to `caller`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` when `product_ids` is missing or empty.
    pub fn into_new(self, caller: UserId) -> Result<NewOrder, ValidationError> {
        let product_ids = self
            .product_ids
            .filter(|ids| !ids.is_empty())
            .ok_or_else(|| ValidationError::new("product_ids must not be empty"))?;

        Ok(NewOrder {
            user_id: self.user_id.unwrap_or(caller),
            product_ids,
            total: self.total,
        })
    }
}
