//! Core types for the Lumina storefront.
//!
//! Type-safe wrappers for ids, emails, prices and roles, plus the cart
//! multiset shared by the API and the client.

pub mod cart;
pub mod email;
pub mod id;
pub mod price;
pub mod role;

pub use cart::{CartContents, CartError};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use role::UserRole;
