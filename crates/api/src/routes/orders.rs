//! Order route handlers.
//!
//! Orders are append-only snapshots. Customers may place and read their own
//! orders; listing and deleting are admin-only.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::instrument;

use lumina_core::{OrderId, Price, ProductId};

use crate::db::{OrderRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{ApiJson, IdPath};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{Order, OrderFields, Product};
use crate::state::AppState;

#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Order>>> {
    Ok(Json(OrderRepository::new(state.pool()).list().await?))
}

/// Place an order. Without an explicit total it is priced from the catalog.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(fields): ApiJson<OrderFields>,
) -> Result<impl IntoResponse> {
    let new_order = fields.into_new(user.id)?;

    if !user.can_access(new_order.user_id) {
        return Err(AppError::Forbidden(
            "cannot place orders for another user".to_string(),
        ));
    }

    let total = match new_order.total {
        Some(total) => total,
        None => {
            let catalog = ProductRepository::new(state.pool())
                .get_many(&new_order.product_ids)
                .await?;
            order_total(&new_order.product_ids, &catalog).map_err(|id| {
                AppError::BadRequest(format!("product {id} does not exist"))
            })?
        }
    };

    let order = OrderRepository::new(state.pool())
        .create(new_order.user_id, &new_order.product_ids, total)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                AppError::NotFound(format!("user {} not found", new_order.user_id))
            }
            other => other.into(),
        })?;

    let order_id = order.id.to_string();
    add_breadcrumb("order", "Order placed", Some(&[("order_id", order_id.as_str())]));
    tracing::info!(order_id = %order.id, total = %order.total, "Order placed");

    Ok((StatusCode::CREATED, Json(order)))
}

/// Fetch an order. Owners and admins only; anyone else gets a 404.
#[instrument(skip_all, fields(id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    IdPath(id): IdPath<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .filter(|order| user.can_access(order.user_id))
        .map(Json)
        .ok_or_else(|| not_found(id))
}

#[instrument(skip_all, fields(id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    IdPath(id): IdPath<OrderId>,
) -> Result<impl IntoResponse> {
    OrderRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => not_found(id),
            other => other.into(),
        })?;

    Ok(Json(json!({ "message": "Order deleted" })))
}

/// Sum catalog prices over the multiset. Fails with the first unknown id.
fn order_total(
    product_ids: &[ProductId],
    catalog: &[Product],
) -> std::result::Result<Price, ProductId> {
    product_ids
        .iter()
        .map(|id| {
            catalog
                .iter()
                .find(|p| p.id == *id)
                .map(|p| p.price)
                .ok_or(*id)
        })
        .sum()
}

fn not_found(id: OrderId) -> AppError {
    AppError::NotFound(format!("order {id} not found"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn product(id: i32, units: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Producto {id}"),
            price: Price::from_units(units),
            description: String::new(),
            category: String::new(),
            quantity: 0,
            cover_image: None,
            gallery: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_order_total_counts_duplicates() {
        let ids = [1, 2, 1].map(ProductId::new);
        let total = order_total(&ids, &[product(1, 10), product(2, 25)]).unwrap();
        assert_eq!(total, Price::from_units(45));
    }

    #[test]
    fn test_order_total_rejects_unknown_product() {
        let ids = [1, 7].map(ProductId::new);
        assert_eq!(
            order_total(&ids, &[product(1, 10)]),
            Err(ProductId::new(7))
        );
    }
}
