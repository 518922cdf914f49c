//! User route handlers.
//!
//! Registration and login are public; everything else is admin-only.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::json;
use tracing::instrument;

use lumina_core::UserId;

use crate::db::{RepositoryError, UserRepository};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{ApiJson, IdPath};
use crate::middleware::RequireAdmin;
use crate::models::{User, UserFields};
use crate::services::AuthService;
use crate::state::AppState;

/// Body returned by register.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: &'static str,
    pub user: User,
}

/// Body returned by login.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: &'static str,
    pub token: String,
    pub user: User,
}

/// Register a customer account.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(fields): ApiJson<UserFields>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool(), state.tokens())
        .register(fields)
        .await?;

    add_breadcrumb("auth", "User registered", None);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully",
            user,
        }),
    ))
}

/// Exchange credentials for a bearer token.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(fields): ApiJson<UserFields>,
) -> Result<Json<LoginResponse>> {
    let (user, token) = AuthService::new(state.pool(), state.tokens())
        .login(fields)
        .await
        .inspect_err(|e| tracing::debug!(error = %e, "Login failed"))?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        message: "Login successful",
        token,
        user,
    }))
}

/// List all users.
#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<User>>> {
    Ok(Json(UserRepository::new(state.pool()).list().await?))
}

/// Fetch one user.
#[instrument(skip_all, fields(id = %id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    IdPath(id): IdPath<UserId>,
) -> Result<Json<User>> {
    UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))
}

/// Create a user with any role.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(fields): ApiJson<UserFields>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool(), state.tokens())
        .create_user(fields)
        .await?;

    tracing::info!(admin_id = %admin.id, user_id = %user.id, "Admin created user");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Patch a user. An empty password leaves the stored hash untouched.
#[instrument(skip_all, fields(id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    IdPath(id): IdPath<UserId>,
    ApiJson(fields): ApiJson<UserFields>,
) -> Result<Json<User>> {
    let user = AuthService::new(state.pool(), state.tokens())
        .update_user(id, fields)
        .await?;
    Ok(Json(user))
}

/// Delete a user together with their cart and orders.
#[instrument(skip_all, fields(id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    IdPath(id): IdPath<UserId>,
) -> Result<impl IntoResponse> {
    UserRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| not_found_or(e, id))?;

    tracing::info!(admin_id = %admin.id, user_id = %id, "User deleted");
    Ok(Json(json!({ "message": "User deleted" })))
}

fn not_found_or(e: RepositoryError, id: UserId) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound(format!("user {id} not found")),
        other => other.into(),
    }
}
