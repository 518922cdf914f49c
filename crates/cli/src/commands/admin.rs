//! Admin account management.
//!
//! # Usage
//!
//! ```bash
//! lumina-cli admin create -e admin@lumina.shop -n "Admin Name" -p 'a-long-password'
//! ```
//!
//! Registration over the API always creates `user` accounts, so the first
//! admin has to be created here.

use lumina_api::db::{RepositoryError, UserRepository};
use lumina_api::models::NewUser;
use lumina_api::services::AuthError;
use lumina_api::services::auth::{hash_password, validate_password};
use lumina_core::{Email, UserId, UserRole};
use thiserror::Error;

use super::{CommandError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password rejected or could not be hashed.
    #[error("{0}")]
    Password(#[from] AuthError),

    /// User already exists.
    #[error("A user already exists with email: {0}")]
    UserExists(String),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Create a new admin account.
///
/// # Returns
///
/// The ID of the created user.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<UserId, AdminError> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    validate_password(password)?;

    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    if users.email_exists(&email).await? {
        return Err(AdminError::UserExists(email.to_string()));
    }

    tracing::info!("Creating admin user: {}", email);

    let user = users
        .create(&NewUser {
            name: name.trim().to_owned(),
            email,
            password_hash: hash_password(password)?,
            role: UserRole::Admin,
        })
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(user.id)
}
