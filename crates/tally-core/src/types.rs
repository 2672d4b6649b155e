//! # Domain Types
//!
//! Value types shared by the receipt aggregate, the query engine and the
//! boundary layer.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ LineItemRequest │   │ PaymentRequest  │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name           │   │  type (raw str) │   │  payment_type   │       │
//! │  │  unit_price     │   │  amount         │   │  amount         │       │
//! │  │  quantity       │   └────────┬────────┘   └─────────────────┘       │
//! │  └─────────────────┘            │ validated once                        │
//! │                                 ▼                                       │
//! │                        ┌─────────────────┐                              │
//! │                        │  PaymentType    │                              │
//! │                        │  Cash           │                              │
//! │                        │  Cashless       │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Request types are what the boundary hands in. They are deliberately
//! loose (the payment type is still a string) so that `create_receipt` can
//! report a typed receipt error instead of a generic conversion failure.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{Money, Quantity};

/// Identifier of the authenticated user that owns a receipt.
pub type UserId = i64;

// =============================================================================
// Payment Type
// =============================================================================

/// How the customer paid.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    /// Physical cash payment.
    Cash,
    /// Card, transfer or any other non-cash payment.
    Cashless,
}

impl PaymentType {
    /// All recognised payment types.
    pub const ALL: [PaymentType; 2] = [PaymentType::Cash, PaymentType::Cashless];

    /// Wire and storage form: `cash`, `cashless`.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Cash => "cash",
            PaymentType::Cashless => "cashless",
        }
    }

    /// Label printed in the totals block of a text receipt.
    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentType::Cash => "Cash",
            PaymentType::Cashless => "Cashless",
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive parse of `cash` / `cashless`.
///
/// ## Example
/// ```rust
/// use tally_core::PaymentType;
///
/// assert_eq!("CASH".parse::<PaymentType>().unwrap(), PaymentType::Cash);
/// assert!("card".parse::<PaymentType>().is_err());
/// ```
impl FromStr for PaymentType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentType::Cash),
            "cashless" => Ok(PaymentType::Cashless),
            _ => Err(ValidationError::NotAllowed {
                field: "payment type".to_string(),
                allowed: PaymentType::ALL
                    .iter()
                    .map(|t| t.as_str().to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Payment
// =============================================================================

/// A validated payment record attached to a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    pub amount: Money,
}

impl Payment {
    pub fn new(payment_type: PaymentType, amount: Money) -> Self {
        Payment {
            payment_type,
            amount,
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

/// One requested product line, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRequest {
    pub name: String,
    #[serde(alias = "price")]
    pub unit_price: Money,
    pub quantity: Quantity,
}

impl LineItemRequest {
    pub fn new(name: impl Into<String>, unit_price: Money, quantity: Quantity) -> Self {
        LineItemRequest {
            name: name.into(),
            unit_price,
            quantity,
        }
    }
}

/// The requested payment, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Raw payment type; validated against [`PaymentType`] by `create_receipt`.
    #[serde(rename = "type")]
    pub payment_type: String,
    pub amount: Money,
}

impl PaymentRequest {
    pub fn new(payment_type: PaymentType, amount: Money) -> Self {
        PaymentRequest {
            payment_type: payment_type.as_str().to_string(),
            amount,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_type_parse() {
        assert_eq!("cash".parse::<PaymentType>().unwrap(), PaymentType::Cash);
        assert_eq!(
            " Cashless ".parse::<PaymentType>().unwrap(),
            PaymentType::Cashless
        );
        assert!(matches!(
            "credit".parse::<PaymentType>(),
            Err(ValidationError::NotAllowed { .. })
        ));
    }

    #[test]
    fn test_payment_type_names() {
        assert_eq!(PaymentType::Cash.as_str(), "cash");
        assert_eq!(PaymentType::Cashless.display_name(), "Cashless");
        assert_eq!(
            serde_json::to_string(&PaymentType::Cashless).unwrap(),
            "\"cashless\""
        );
    }

    #[test]
    fn test_request_deserialization() {
        let json = r#"{"name": "Bread", "price": "20.00", "quantity": 2}"#;
        let item: LineItemRequest = serde_json::from_str(json).unwrap();
        assert_eq!(item.unit_price.cents(), 2000);
        assert_eq!(item.quantity.hundredths(), 200);

        let json = r#"{"type": "cash", "amount": "100.00"}"#;
        let payment: PaymentRequest = serde_json::from_str(json).unwrap();
        assert_eq!(payment.payment_type, "cash");
        assert_eq!(payment.amount.cents(), 10000);
    }

    #[test]
    fn test_payment_serializes_type_field() {
        let payment = Payment::new(PaymentType::Cash, Money::from_cents(10000));
        assert_eq!(
            serde_json::to_string(&payment).unwrap(),
            r#"{"type":"cash","amount":"100.00"}"#
        );
    }
}
