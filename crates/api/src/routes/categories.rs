//! Category route handlers.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::instrument;

use lumina_core::CategoryId;

use crate::db::{CategoryRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, IdPath};
use crate::middleware::RequireAdmin;
use crate::models::{Category, CategoryFields};
use crate::state::AppState;

#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    Ok(Json(CategoryRepository::new(state.pool()).list().await?))
}

#[instrument(skip_all, fields(id = %id))]
pub async fn show(
    State(state): State<AppState>,
    IdPath(id): IdPath<CategoryId>,
) -> Result<Json<Category>> {
    CategoryRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// Create a category. Names are unique.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiJson(fields): ApiJson<CategoryFields>,
) -> Result<impl IntoResponse> {
    let (name, description) = fields.into_new()?;
    let category = CategoryRepository::new(state.pool())
        .create(&name, &description)
        .await?;

    tracing::info!(category_id = %category.id, name = %category.name, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// Rename or describe a category. Products referencing the old name are
/// not touched.
#[instrument(skip_all, fields(id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    IdPath(id): IdPath<CategoryId>,
    ApiJson(fields): ApiJson<CategoryFields>,
) -> Result<Json<Category>> {
    let (name, description) = fields.into_changes()?;
    CategoryRepository::new(state.pool())
        .update(id, name.as_deref(), description.as_deref())
        .await
        .map(Json)
        .map_err(|e| repo_error(e, id))
}

#[instrument(skip_all, fields(id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    IdPath(id): IdPath<CategoryId>,
) -> Result<impl IntoResponse> {
    CategoryRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| repo_error(e, id))?;

    Ok(Json(json!({ "message": "Category deleted" })))
}

fn not_found(id: CategoryId) -> AppError {
    AppError::NotFound(format!("category {id} not found"))
}

fn repo_error(e: RepositoryError, id: CategoryId) -> AppError {
    match e {
        RepositoryError::NotFound => not_found(id),
        other => other.into(),
    }
}
