//! Product route handlers.
//!
//! Reads are public. Writes are admin-only and accept either JSON or a
//! multipart form with image files.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use lumina_core::ProductId;

use crate::db::{ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{IdPath, ImageFiles, ProductPayload};
use crate::middleware::RequireAdmin;
use crate::models::Product;
use crate::services::UploadStore;
use crate::state::AppState;

const DEFAULT_RELATED_LIMIT: i64 = 4;
const MAX_RELATED_LIMIT: i64 = 50;

/// Query parameters for related products.
#[derive(Debug, Deserialize)]
pub struct RelatedQuery {
    pub limit: Option<i64>,
}

/// List the catalog.
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(ProductRepository::new(state.pool()).list().await?))
}

/// Fetch one product.
#[instrument(skip_all, fields(id = %id))]
pub async fn show(
    State(state): State<AppState>,
    IdPath(id): IdPath<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// Products in the same category, excluding the product itself.
#[instrument(skip_all, fields(id = %id))]
pub async fn related(
    State(state): State<AppState>,
    IdPath(id): IdPath<ProductId>,
    Query(query): Query<RelatedQuery>,
) -> Result<Json<Vec<Product>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RELATED_LIMIT)
        .clamp(0, MAX_RELATED_LIMIT);

    ProductRepository::new(state.pool())
        .related(id, limit)
        .await
        .map(Json)
        .map_err(|e| repo_error(e, id))
}

/// Create a product.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    payload: ProductPayload,
) -> Result<impl IntoResponse> {
    // Validate text fields before writing any files
    payload.fields.clone().into_new()?;

    let uploads = state.uploads();
    let (fields, stored) = payload.into_fields(uploads).await?;
    let result = match fields.into_new() {
        Ok(new_product) => ProductRepository::new(state.pool())
            .create(&new_product)
            .await
            .map_err(AppError::from),
        Err(e) => Err(e.into()),
    };
    let product = discard_uploads_on_error(uploads, &stored, result).await?;

    tracing::info!(admin_id = %admin.id, product_id = %product.id, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Patch a product. A new cover upload replaces the cover; new gallery
/// uploads replace the gallery. Omitted fields keep their values.
#[instrument(skip_all, fields(id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    IdPath(id): IdPath<ProductId>,
    payload: ProductPayload,
) -> Result<Json<Product>> {
    payload.fields.clone().into_changes()?;

    let repo = ProductRepository::new(state.pool());
    if repo.get_by_id(id).await?.is_none() {
        return Err(not_found(id));
    }

    let uploads = state.uploads();
    let (fields, stored) = payload.into_fields(uploads).await?;
    let result = match fields.into_changes() {
        Ok(changes) => repo.update(id, &changes).await.map_err(|e| repo_error(e, id)),
        Err(e) => Err(e.into()),
    };
    discard_uploads_on_error(uploads, &stored, result)
        .await
        .map(Json)
}

/// Delete a product. Stored images are left on disk.
#[instrument(skip_all, fields(id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    IdPath(id): IdPath<ProductId>,
) -> Result<impl IntoResponse> {
    ProductRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| repo_error(e, id))?;

    tracing::info!(admin_id = %admin.id, product_id = %id, "Product deleted");
    Ok(Json(json!({ "message": "Product deleted" })))
}

/// Store a single cover image and return its file name.
#[instrument(skip_all)]
pub async fn upload_cover(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ImageFiles(files): ImageFiles,
) -> Result<impl IntoResponse> {
    let file = files
        .first()
        .ok_or_else(|| AppError::BadRequest("no file uploaded".to_string()))?;

    let cover_image = state.uploads().save(file).await?;
    Ok(Json(json!({ "cover_image": cover_image })))
}

/// Store one or more gallery images and return their file names.
#[instrument(skip_all)]
pub async fn upload_gallery(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ImageFiles(files): ImageFiles,
) -> Result<impl IntoResponse> {
    if files.is_empty() {
        return Err(AppError::BadRequest("no files uploaded".to_string()));
    }

    let gallery = state.uploads().save_all(&files).await?;
    Ok(Json(json!({ "gallery": gallery })))
}

/// Remove files stored for a write that did not go through.
async fn discard_uploads_on_error<T>(
    uploads: &UploadStore,
    stored: &[String],
    result: Result<T>,
) -> Result<T> {
    if result.is_err() && !stored.is_empty() {
        tracing::warn!(files = stored.len(), "Product write failed; discarding uploads");
        uploads.remove_all(stored).await;
    }
    result
}

fn not_found(id: ProductId) -> AppError {
    AppError::NotFound(format!("product {id} not found"))
}

fn repo_error(e: RepositoryError, id: ProductId) -> AppError {
    match e {
        RepositoryError::NotFound => not_found(id),
        other => other.into(),
    }
}
