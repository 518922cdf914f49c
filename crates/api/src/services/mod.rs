//! Business logic services.
//!
//! Services sit between route handlers and repositories wherever an
//! operation spans more than one table or needs more than a single write.

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod uploads;

pub use auth::{AuthError, AuthService, TokenIssuer};
pub use cart::CartService;
pub use uploads::{UploadError, UploadStore, UploadedFile};
