//! Terminal Shop Core - Shared types library.
//!
//! This crate provides common types used across all Terminal Shop components:
//! - `shop` - Commerce client, cart/session state, and checkout flow
//! - `cli` - Command-line presentation adapter (`tshop`)
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, and country codes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
