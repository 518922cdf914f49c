//! Domain models and request payloads.
//!
//! Payload structs carry the canonical field names and accept the legacy
//! Spanish names as serde aliases; nothing past this layer sees the aliases.

pub mod cart;
pub mod category;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{Cart, CartCheckout, CartLine, CartSummary};
pub use category::{Category, CategoryFields};
pub use order::{NewOrder, Order, OrderFields};
pub use product::{NewProduct, Product, ProductChanges, ProductFields};
pub use user::{CurrentUser, NewUser, User, UserChanges, UserFields};

/// A payload failed shape or value checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Trim a text field, treating blank as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
