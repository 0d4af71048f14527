//! Unified error handling.
//!
//! Provides a unified `ShopError` type for the session boundary. Layer-specific
//! errors convert into it with `?`.

use terminal_shop_core::VariantId;
use thiserror::Error;

use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::messages::ValidationError;
use crate::terminal::TerminalError;

/// Library-level error type.
#[derive(Debug, Error)]
pub enum ShopError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A commerce API call failed.
    #[error("Terminal error: {0}")]
    Terminal(#[from] TerminalError),

    /// The checkout flow rejected or failed a step.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Form input was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A variant ID that is not in the catalog.
    #[error("Unknown variant: {0}")]
    UnknownVariant(VariantId),
}

impl ShopError {
    /// Whether the user can retry after this error.
    ///
    /// Everything except a broken configuration or an unknown variant is a
    /// transient condition the session has already rolled back from.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::UnknownVariant(_))
    }
}

/// Result type alias for `ShopError`.
pub type Result<T> = std::result::Result<T, ShopError>;
