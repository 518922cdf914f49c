//! Lumina Core - Shared types library.
//!
//! This crate provides common types used across all Lumina components:
//! - `api` - REST backend (users, catalog, orders, carts)
//! - `client` - Typed HTTP facade consumed by front-ends
//! - `cli` - Command-line tools for migrations and bootstrapping
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. Database encoding lives behind the `postgres`
//! feature so the client can depend on this crate without pulling in sqlx.
//!
//! # Modules
//!
//! - [`types`] - Ids, emails, prices, roles and the cart multiset

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
