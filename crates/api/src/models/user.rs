//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lumina_core::{Email, UserId, UserRole};

/// A storefront account.
///
/// The password hash never leaves the repository layer, so this type is
/// safe to serialize into responses.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for inserting a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub role: UserRole,
}

/// Validated partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub role: Option<UserRole>,
    pub password_hash: Option<String>,
}

/// User fields as sent by clients (register, login, admin create/update).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFields {
    #[serde(default, alias = "nombre")]
    pub name: Option<String>,
    #[serde(default, alias = "correo")]
    pub email: Option<String>,
    #[serde(default, alias = "contraseña", alias = "contrasena")]
    pub password: Option<String>,
    /// Honored only on admin create/update.
    #[serde(default)]
    pub role: Option<UserRole>,
}

/// The authenticated caller, decoded from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
    pub role: UserRole,
}

impl CurrentUser {
    /// Whether the caller may act on resources owned by `owner`.
    #[must_use]
    pub fn can_access(&self, owner: UserId) -> bool {
        self.role.is_admin() || self.id == owner
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_fields_accept_legacy_names() {
        let fields: UserFields = serde_json::from_str(
            r#"{"nombre":"Ana","correo":"ana@lumina.shop","contraseña":"s3cret-pass"}"#,
        )
        .unwrap();
        assert_eq!(fields.name.as_deref(), Some("Ana"));
        assert_eq!(fields.email.as_deref(), Some("ana@lumina.shop"));
        assert_eq!(fields.password.as_deref(), Some("s3cret-pass"));
        assert!(fields.role.is_none());
    }

    #[test]
    fn test_can_access_own_resources_only() {
        let user = CurrentUser {
            id: UserId::new(3),
            email: "ana@lumina.shop".to_string(),
            role: UserRole::User,
        };
        assert!(user.can_access(UserId::new(3)));
        assert!(!user.can_access(UserId::new(4)));

        let admin = CurrentUser {
            role: UserRole::Admin,
            ..user
        };
        assert!(admin.can_access(UserId::new(4)));
    }
}
