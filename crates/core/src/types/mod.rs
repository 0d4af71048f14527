//! Core types for Terminal Shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod country;
pub mod id;
pub mod price;

pub use country::{CountryCode, CountryCodeError};
pub use id::*;
pub use price::{CurrencyCode, Price};
