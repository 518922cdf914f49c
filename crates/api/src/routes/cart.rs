//! Cart route handlers.
//!
//! Every cart operation requires a bearer token. Customers act on their own
//! cart; admins may act on anyone's.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use lumina_core::{Price, ProductId, UserId};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{ApiJson, IdPath};
use crate::middleware::RequireAuth;
use crate::models::{Cart, CartCheckout, CartSummary, CurrentUser};
use crate::services::CartService;
use crate::state::AppState;

/// Body for `POST /cart` and `POST /cart/clear`. The owner defaults to the
/// caller.
#[derive(Debug, Default, Deserialize)]
pub struct CartOwnerRequest {
    #[serde(default, alias = "usuarioId")]
    pub user_id: Option<UserId>,
}

/// Body for add and remove.
#[derive(Debug, Deserialize)]
pub struct CartItemRequest {
    #[serde(default, alias = "usuarioId")]
    pub user_id: Option<UserId>,
    #[serde(alias = "productoId")]
    pub product_id: ProductId,
    /// Falls back to the catalog price when absent.
    #[serde(default)]
    pub price: Option<Price>,
}

/// Resolve the cart owner and check the caller may touch it.
fn owner(user: &CurrentUser, requested: Option<UserId>) -> Result<UserId> {
    let owner = requested.unwrap_or(user.id);
    if user.can_access(owner) {
        Ok(owner)
    } else {
        tracing::warn!(caller = %user.id, owner = %owner, "Cart access denied");
        Err(AppError::Forbidden("cannot access another user's cart".to_string()))
    }
}

/// The raw cart; 404 when the user has none.
#[instrument(skip_all, fields(owner = %user_id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    IdPath(user_id): IdPath<UserId>,
) -> Result<Json<Cart>> {
    let user_id = owner(&user, Some(user_id))?;
    Ok(Json(CartService::new(state.pool()).view(user_id).await?))
}

/// The cart grouped by product.
#[instrument(skip_all, fields(owner = %user_id))]
pub async fn summary(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    IdPath(user_id): IdPath<UserId>,
) -> Result<Json<CartSummary>> {
    let user_id = owner(&user, Some(user_id))?;
    Ok(Json(CartService::new(state.pool()).summary(user_id).await?))
}

/// Item count for the badge; zero when the user has no cart.
#[instrument(skip_all, fields(owner = %user_id))]
pub async fn count(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    IdPath(user_id): IdPath<UserId>,
) -> Result<impl IntoResponse> {
    let user_id = owner(&user, Some(user_id))?;
    let count = CartService::new(state.pool()).count(user_id).await?;
    Ok(Json(json!({ "count": count })))
}

/// Checkout deep link. Writes nothing and leaves the cart as it is.
#[instrument(skip_all, fields(owner = %user_id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    IdPath(user_id): IdPath<UserId>,
) -> Result<Json<CartCheckout>> {
    let user_id = owner(&user, Some(user_id))?;
    let checkout = CartService::new(state.pool())
        .checkout(user_id, state.config().checkout_phone.as_deref())
        .await?;

    add_breadcrumb("cart", "Checkout link generated", None);
    Ok(Json(checkout))
}

/// Get-or-create. 201 when the cart was created, 200 when it existed.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<CartOwnerRequest>,
) -> Result<impl IntoResponse> {
    let user_id = owner(&user, body.user_id)?;
    let (cart, created) = CartService::new(state.pool()).get_or_create(user_id).await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(cart)))
}

/// Add one unit of a product, creating the cart if needed.
#[instrument(skip_all, fields(product_id = %body.product_id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<CartItemRequest>,
) -> Result<Json<Cart>> {
    let user_id = owner(&user, body.user_id)?;
    let cart = CartService::new(state.pool())
        .add(user_id, body.product_id, body.price)
        .await?;

    let product_id = body.product_id.to_string();
    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", product_id.as_str())]),
    );
    Ok(Json(cart))
}

/// Remove one unit of a product.
#[instrument(skip_all, fields(product_id = %body.product_id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<CartItemRequest>,
) -> Result<Json<Cart>> {
    let user_id = owner(&user, body.user_id)?;
    let cart = CartService::new(state.pool())
        .remove(user_id, body.product_id, body.price)
        .await?;

    let product_id = body.product_id.to_string();
    add_breadcrumb(
        "cart",
        "Removed from cart",
        Some(&[("product_id", product_id.as_str())]),
    );
    Ok(Json(cart))
}

/// Empty the cart. The cart itself stays.
#[instrument(skip_all)]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<CartOwnerRequest>,
) -> Result<Json<Cart>> {
    let user_id = owner(&user, body.user_id)?;
    Ok(Json(CartService::new(state.pool()).clear(user_id).await?))
}
