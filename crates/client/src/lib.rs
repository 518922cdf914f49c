//! Lumina client.
//!
//! A typed facade over the storefront REST API. Each resource operation is a
//! thin pass-through call: it returns the parsed body or a [`ClientError`]
//! carrying the HTTP status and the server's message.
//!
//! The bearer token lives in a [`Session`] owned by the [`ApiClient`]
//! instance. Any 401 response clears it and fails with
//! [`ClientError::ReauthenticationRequired`], which a UI turns into a
//! redirect to its login view.
//!
//! # Example
//!
//! ```rust,ignore
//! use lumina_client::{ApiClient, ClientConfig};
//!
//! let client = ApiClient::new(&ClientConfig::from_env()?)?;
//! client.login("ana@lumina.shop", "s3cret-pass").await?;
//! let count = client.cart_count(client.session().user_id().unwrap()).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod client;
pub mod config;
pub mod error;
pub mod fallback;
pub mod session;
pub mod types;

pub use client::ApiClient;
pub use config::{ClientConfig, Environment};
pub use error::ClientError;
pub use session::Session;
pub use types::*;
