//! Authentication service.
//!
//! Provides password registration and login, admin-side account management,
//! and bearer token issuing.

mod error;
mod token;

pub use error::AuthError;
pub use token::{Claims, TokenIssuer};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;

use lumina_core::{Email, UserId, UserRole};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::{NewUser, User, UserChanges, UserFields, non_blank};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
///
/// Handles user registration, login, and admin account management.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenIssuer,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenIssuer) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
        }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new customer account. The role is always `user`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` if name, email, or password is absent.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, fields: UserFields) -> Result<User, AuthError> {
        self.create_account(fields, UserRole::User).await
    }

    /// Create an account with an explicit role (admin operation).
    ///
    /// # Errors
    ///
    /// Same as [`AuthService::register`].
    pub async fn create_user(&self, fields: UserFields) -> Result<User, AuthError> {
        let role = fields.role.unwrap_or_default();
        self.create_account(fields, role).await
    }

    async fn create_account(&self, fields: UserFields, role: UserRole) -> Result<User, AuthError> {
        let name = non_blank(fields.name).ok_or(AuthError::MissingField("name"))?;
        let email = non_blank(fields.email).ok_or(AuthError::MissingField("email"))?;
        let password = fields
            .password
            .filter(|p| !p.is_empty())
            .ok_or(AuthError::MissingField("password"))?;

        let email = Email::parse(&email)?;
        validate_password(&password)?;

        if self.users.email_exists(&email).await? {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash_password(&password)?;

        // The unique index still guards the race between the check and insert
        let user = self
            .users
            .create(&NewUser {
                name,
                email,
                password_hash,
                role,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, role = %user.role, "Account created");
        Ok(user)
    }

    /// Login with email and password, returning the user and a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong
    /// or missing.
    pub async fn login(&self, fields: UserFields) -> Result<(User, String), AuthError> {
        let (Some(email), Some(password)) = (non_blank(fields.email), fields.password) else {
            return Err(AuthError::InvalidCredentials);
        };

        let email = Email::parse(&email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(&password, &password_hash)?;

        let token = self.tokens.issue(&user)?;
        Ok((user, token))
    }

    // =========================================================================
    // Account Management
    // =========================================================================

    /// Update an account. An empty password leaves the stored hash untouched.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the account does not exist.
    /// Returns `AuthError::UserAlreadyExists` if the new email is taken.
    pub async fn update_user(&self, id: UserId, fields: UserFields) -> Result<User, AuthError> {
        let name = match fields.name {
            Some(name) => Some(non_blank(Some(name)).ok_or(AuthError::MissingField("name"))?),
            None => None,
        };
        let email = non_blank(fields.email)
            .map(|e| Email::parse(&e))
            .transpose()?;
        let password_hash = match fields.password.filter(|p| !p.is_empty()) {
            Some(password) => {
                validate_password(&password)?;
                Some(hash_password(&password)?)
            }
            None => None,
        };

        let changes = UserChanges {
            name,
            email,
            role: fields.role,
            password_hash,
        };

        self.users
            .update(id, &changes)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }
}

// =============================================================================
// Password Helpers
// =============================================================================

/// Check the password policy.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
