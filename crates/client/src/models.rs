//! Domain models for the storefront client.
//!
//! These types mirror the JSON documents the storefront API exchanges
//! (camelCase on the wire) while staying ergonomic Rust structs internally.
//! They are deliberately separate from the gateway's request/response
//! envelopes in [`crate::gateway::types`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quitanda_core::{CategoryId, Email, OrderId, OrderStatus, PaymentMethod, Price, ProductId, UserId};

// =============================================================================
// Catalog
// =============================================================================

/// A catalog product.
///
/// Read-only to the state core: products arrive from the API and are only
/// ever consumed (e.g. turned into cart lines). Stock and activity flags are
/// advisory display data here, not enforced constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// Pre-discount price, when the product is on offer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_price: Option<Price>,
    /// Discount percentage, when the product is on offer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<u32>,
    pub category: String,
    pub image_url: String,
    pub stock: u32,
    pub is_active: bool,
}

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

// =============================================================================
// Cart
// =============================================================================

/// One product entry in the cart with its quantity.
///
/// `quantity` is always at least 1; the cart store removes a line instead of
/// keeping it at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
    pub image_url: String,
}

impl CartLine {
    /// `unit_price x quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

// =============================================================================
// Users
// =============================================================================

/// An authenticated storefront user.
///
/// Owned exclusively by the session store; nothing else mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

// =============================================================================
// Addresses
// =============================================================================

/// A delivery address.
///
/// Every field except `complement` must be non-empty before checkout can
/// proceed; see [`Address::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    /// Two-letter state code (e.g. "SP").
    pub state: String,
    pub zip_code: String,
}

/// A required address field, for field-level validation reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressField {
    Street,
    Number,
    Neighborhood,
    City,
    State,
    ZipCode,
}

impl std::fmt::Display for AddressField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Street => write!(f, "street"),
            Self::Number => write!(f, "number"),
            Self::Neighborhood => write!(f, "neighborhood"),
            Self::City => write!(f, "city"),
            Self::State => write!(f, "state"),
            Self::ZipCode => write!(f, "zip code"),
        }
    }
}

/// A single field-level address validation failure.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressFieldError {
    /// The field is empty or whitespace.
    #[error("{0} is required")]
    Required(AddressField),

    /// The state code is not exactly two letters.
    #[error("state must be a two-letter code")]
    StateNotTwoLetters,
}

impl Address {
    /// Validate the address for checkout.
    ///
    /// Returns every failing field, not just the first, so forms can
    /// highlight all of them at once.
    ///
    /// # Errors
    ///
    /// Returns the list of field-level failures if any required field is
    /// empty or the state code is not exactly two letters.
    pub fn validate(&self) -> Result<(), Vec<AddressFieldError>> {
        let mut errors = Vec::new();

        let required = [
            (AddressField::Street, &self.street),
            (AddressField::Number, &self.number),
            (AddressField::Neighborhood, &self.neighborhood),
            (AddressField::City, &self.city),
            (AddressField::State, &self.state),
            (AddressField::ZipCode, &self.zip_code),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                errors.push(AddressFieldError::Required(field));
            }
        }

        let state = self.state.trim();
        if !state.is_empty()
            && (state.chars().count() != 2 || !state.chars().all(char::is_alphabetic))
        {
            errors.push(AddressFieldError::StateNotTwoLetters);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// A submitted order, as returned by the storefront API.
///
/// Only ever constructed from a gateway response; the client never fabricates
/// an order id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(rename = "items")]
    pub lines: Vec<CartLine>,
    pub total: Price,
    pub payment_method: PaymentMethod,
    pub delivery_address: Address,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_address() -> Address {
        Address {
            street: "Rua das Laranjeiras".to_string(),
            number: "123".to_string(),
            complement: Some("Apto 41".to_string()),
            neighborhood: "Centro".to_string(),
            city: "São Paulo".to_string(),
            state: "SP".to_string(),
            zip_code: "01000-000".to_string(),
        }
    }

    #[test]
    fn test_valid_address_passes() {
        assert!(valid_address().validate().is_ok());
    }

    #[test]
    fn test_complement_is_optional() {
        let mut address = valid_address();
        address.complement = None;
        assert!(address.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_all_reported() {
        let address = Address::default();
        let errors = address.validate().unwrap_err();
        // All six required fields missing; the state-shape check does not
        // fire for an empty state.
        assert_eq!(errors.len(), 6);
        assert!(errors.contains(&AddressFieldError::Required(AddressField::Street)));
        assert!(errors.contains(&AddressFieldError::Required(AddressField::ZipCode)));
        assert!(!errors.contains(&AddressFieldError::StateNotTwoLetters));
    }

    #[test]
    fn test_whitespace_only_is_required() {
        let mut address = valid_address();
        address.city = "   ".to_string();
        let errors = address.validate().unwrap_err();
        assert_eq!(errors, vec![AddressFieldError::Required(AddressField::City)]);
    }

    #[test]
    fn test_state_must_be_two_letters() {
        let mut address = valid_address();
        address.state = "SPX".to_string();
        assert_eq!(
            address.validate().unwrap_err(),
            vec![AddressFieldError::StateNotTwoLetters]
        );

        address.state = "S1".to_string();
        assert_eq!(
            address.validate().unwrap_err(),
            vec![AddressFieldError::StateNotTwoLetters]
        );
    }

    #[test]
    fn test_line_total() {
        let line = CartLine {
            product_id: ProductId::new(1),
            name: "Café torrado".to_string(),
            unit_price: Price::from_centavos(1050),
            quantity: 3,
            image_url: "/img/cafe.jpg".to_string(),
        };
        assert_eq!(line.line_total(), Price::from_centavos(3150));
    }

    #[test]
    fn test_order_wire_shape() {
        let json = serde_json::json!({
            "id": 9,
            "items": [{
                "productId": 1,
                "name": "Café torrado",
                "unitPrice": "10.50",
                "quantity": 2,
                "imageUrl": "/img/cafe.jpg"
            }],
            "total": "21.00",
            "paymentMethod": "pix",
            "deliveryAddress": {
                "street": "Rua das Laranjeiras",
                "number": "123",
                "neighborhood": "Centro",
                "city": "São Paulo",
                "state": "SP",
                "zipCode": "01000-000"
            },
            "status": "pending",
            "createdAt": "2024-06-01T12:00:00Z"
        });
        let order: Order = serde_json::from_value(json).unwrap();
        assert_eq!(order.id, OrderId::new(9));
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.total, Price::from_centavos(2100));
        assert_eq!(order.payment_method, PaymentMethod::Pix);
        assert_eq!(order.status, OrderStatus::Pending);
    }
}
