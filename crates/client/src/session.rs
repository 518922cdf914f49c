//! Per-client authentication state.
//!
//! The session is owned by one [`crate::ApiClient`]. Cloning a session
//! shares the same underlying state, so a UI can keep a handle to observe
//! login and logout.

use std::sync::{Arc, PoisonError, RwLock};

use lumina_core::{UserId, UserRole};

use crate::types::User;

#[derive(Debug, Clone)]
struct Credentials {
    token: String,
    user: User,
}

/// Bearer token and signed-in user, if any.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<Option<Credentials>>>,
}

impl Session {
    /// An empty (signed-out) session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the token and user returned by login.
    pub fn set(&self, token: String, user: User) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) =
            Some(Credentials { token, user });
    }

    /// Forget the token and user.
    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.read(|c| c.token.clone())
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.read(|c| c.user.clone())
    }

    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.read(|c| c.user.id)
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.read(|_| ()).is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.read(|c| c.user.role == UserRole::Admin).unwrap_or(false)
    }

    fn read<T>(&self, f: impl FnOnce(&Credentials) -> T) -> Option<T> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> User {
        User {
            id: UserId::new(5),
            name: "Ana".to_string(),
            email: "ana@lumina.shop".to_string(),
            role,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_set_and_clear() {
        let session = Session::new();
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());

        session.set("tok".to_string(), user(UserRole::User));
        assert!(session.is_authenticated());
        assert_eq!(session.token().as_deref(), Some("tok"));
        assert_eq!(session.user_id(), Some(UserId::new(5)));
        assert!(!session.is_admin());

        session.clear();
        assert!(!session.is_authenticated());
        assert!(session.user().is_none());
    }

    #[test]
    fn test_clones_share_state() {
        let session = Session::new();
        let observer = session.clone();

        session.set("tok".to_string(), user(UserRole::Admin));
        assert!(observer.is_admin());

        observer.clear();
        assert!(!session.is_authenticated());
    }
}
