//! Terminal Shop library.
//!
//! Everything a presentation host needs to browse the coffee catalog, manage
//! addresses and cards, and check out, without depending on the host itself.
//!
//! # Architecture
//!
//! - [`terminal`] - `CommerceClient` trait and its REST implementation
//! - [`catalog`] - read-through cache of catalog, address, card, and order lists
//! - [`cart`] - the in-memory cart (plain data with pure transitions)
//! - [`checkout`] - checkout state machine and the totaling/placing driver
//! - [`messages`] - wire shapes exchanged with embedded web forms
//! - [`session`] - one host session wiring the pieces together
//! - [`views`] - host-agnostic tree view models

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod messages;
pub mod session;
pub mod terminal;
pub mod views;

pub use cart::{AddressRef, Cart, CardRef, CartLine, CartSelection, CartSnapshot};
pub use catalog::{CacheKey, Catalog};
pub use checkout::{CheckoutError, CheckoutFlow, CheckoutState};
pub use config::{ShopConfig, TerminalEnvironment};
pub use error::{Result, ShopError};
pub use messages::{AddressFields, FormStatus, InboundMessage, OutboundMessage};
pub use session::{Reply, ShopEvent, ShopSession};
pub use terminal::{CommerceClient, TerminalClient, TerminalError};
pub use views::TreeNode;
