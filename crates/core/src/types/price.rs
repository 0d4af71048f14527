//! Type-safe price representation using decimal arithmetic.
//!
//! The commerce API reports every amount as an integer number of minor
//! currency units (cents). [`Price`] converts that into a decimal amount once,
//! so display formatting never goes through floating point.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a USD price from an amount in cents.
    ///
    /// ```
    /// use terminal_shop_core::Price;
    ///
    /// assert_eq!(Price::from_cents(3000).display(), "$30.00");
    /// assert_eq!(Price::from_cents(1234).display(), "$12.34");
    /// ```
    #[must_use]
    pub fn from_cents(cents: u64) -> Self {
        Self::new(
            Decimal::from(cents) / Decimal::ONE_HUNDRED,
            CurrencyCode::USD,
        )
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.amount)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD => "$",
            Self::EUR => "€",
        }
    }
}
