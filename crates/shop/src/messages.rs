//! Messages exchanged with the embedded checkout and address forms.
//!
//! Checkout messages are adjacently tagged: `{"command": ..., "payload": ...}`.
//! The address form only receives a status: `{"type": "success"}`.

use serde::{Deserialize, Serialize};
use terminal_shop_core::{AddressId, CardId, CountryCode, VariantId};
use thiserror::Error;

use crate::cart::CartSnapshot;
use crate::terminal::AddressCreate;

/// Host → checkout form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "payload", rename_all = "camelCase")]
pub enum OutboundMessage {
    /// Re-render the cart; the form also clears its total.
    UpdateCart(CartSnapshot),
    /// Formatted total, or `""` when none is valid.
    CalculateTotal(String),
    /// The order went through.
    OrderPlaced,
}

/// Checkout form → host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "payload", rename_all = "camelCase")]
pub enum InboundMessage {
    SubmitAddress(AddressFields),
    CalculateTotal(TotalRequest),
    PlaceOrder,
    Close,
}

/// The form's view of what it is asking to total.
///
/// The session cart stays authoritative; this is only compared against it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalRequest {
    #[serde(default)]
    pub products: Vec<TotalRequestLine>,
    #[serde(default)]
    pub address: Option<AddressId>,
    #[serde(default)]
    pub card: Option<CardId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalRequestLine {
    pub id: VariantId,
    pub quantity: u32,
}

/// Status reply for the address form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FormStatus {
    Success,
    Error,
}

// =============================================================================
// Address form
// =============================================================================

/// Raw address form fields, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressFields {
    pub name: String,
    pub street1: String,
    #[serde(default)]
    pub street2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub province: Option<String>,
    pub country: String,
    pub zip: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// Every rejected field of a form submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid address: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct ValidationError(pub Vec<FieldError>);

impl ValidationError {
    /// Whether `field` was rejected.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl AddressFields {
    /// Validate the fields and build the API input.
    ///
    /// Text fields are trimmed; optional fields left blank are dropped.
    ///
    /// # Errors
    ///
    /// Returns every failing field at once.
    pub fn validate(&self) -> Result<AddressCreate, ValidationError> {
        let mut errors = Vec::new();

        let name = min_len(&mut errors, "name", "Name", &self.name, 2);
        let street1 = min_len(&mut errors, "street1", "Street address", &self.street1, 5);
        let city = min_len(&mut errors, "city", "City", &self.city, 2);
        let zip = min_len(&mut errors, "zip", "Zip code", &self.zip, 5);
        let province = optional(self.province.as_deref())
            .map(|p| min_len(&mut errors, "province", "Province", p, 2));
        let country = match self.country.parse::<CountryCode>() {
            Ok(country) => Some(country),
            Err(e) => {
                errors.push(FieldError {
                    field: "country",
                    message: e.to_string(),
                });
                None
            }
        };

        match country {
            Some(country) if errors.is_empty() => Ok(AddressCreate {
                name,
                street1,
                street2: optional(self.street2.as_deref()).map(str::to_string),
                city,
                province,
                country,
                zip,
                phone: optional(self.phone.as_deref()).map(str::to_string),
            }),
            _ => Err(ValidationError(errors)),
        }
    }
}

fn optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn min_len(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    label: &str,
    value: &str,
    min: usize,
) -> String {
    let value = value.trim();
    if value.chars().count() < min {
        errors.push(FieldError {
            field,
            message: format!("{label} must be at least {min} characters"),
        });
    }
    value.to_string()
}
