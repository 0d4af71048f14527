//! Shipping country code.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CountryCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CountryCodeError {
    /// The input string is empty.
    #[error("country cannot be empty")]
    Empty,
    /// The input is not a market the shop ships to.
    #[error("unsupported country: {0} (expected US or EU)")]
    Unsupported(String),
}

/// A shipping market accepted by the address form.
///
/// ## Examples
///
/// ```
/// use terminal_shop_core::CountryCode;
///
/// assert_eq!("US".parse::<CountryCode>(), Ok(CountryCode::US));
/// assert_eq!("eu".parse::<CountryCode>(), Ok(CountryCode::EU));
/// assert!("".parse::<CountryCode>().is_err());
/// assert!("CA".parse::<CountryCode>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CountryCode {
    /// United States.
    US,
    /// European Union.
    EU,
}

impl CountryCode {
    /// Two-letter code sent to the commerce API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::US => "US",
            Self::EU => "EU",
        }
    }

    /// Human-readable market name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::US => "United States",
            Self::EU => "European Union",
        }
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CountryCode {
    type Err = CountryCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(CountryCodeError::Empty);
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "US" => Ok(Self::US),
            "EU" => Ok(Self::EU),
            _ => Err(CountryCodeError::Unsupported(trimmed.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trips_through_parse() {
        for code in [CountryCode::US, CountryCode::EU] {
            assert_eq!(code.to_string().parse::<CountryCode>(), Ok(code));
        }
    }

    #[test]
    fn test_unsupported_keeps_input() {
        assert_eq!(
            "MX".parse::<CountryCode>(),
            Err(CountryCodeError::Unsupported("MX".to_string()))
        );
    }
}
