//! # Request and Response DTOs
//!
//! Wire shapes of the receipt service. Money and quantities travel as
//! decimal strings (`"20.00"`, `"0.75"`), field names are camelCase.
//!
//! ```json
//! {
//!   "id": "5b0c…",
//!   "userId": 1,
//!   "lineItems": [
//!     { "name": "Bread", "unitPrice": "20.00", "quantity": "2.00", "subtotal": "40.00" }
//!   ],
//!   "payment": { "type": "cash", "amount": "100.00" },
//!   "total": "40.00",
//!   "rest": "60.00",
//!   "createdAt": "2024-05-01T12:00:00Z"
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use tally_core::{
    LineItem, LineItemRequest, Money, PaymentRequest, PaymentType, Quantity, Receipt, UserId,
};

/// Body of a create-receipt call.
///
/// `products` is accepted as an alias of `lineItems`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReceiptRequest {
    #[serde(alias = "products")]
    pub line_items: Vec<LineItemRequest>,
    pub payment: PaymentRequest,
}

/// A persisted receipt as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    pub id: String,
    pub user_id: UserId,
    pub line_items: Vec<LineItemResponse>,
    pub payment: PaymentResponse,
    #[ts(as = "String")]
    pub total: Money,
    #[ts(as = "String")]
    pub rest: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItemResponse {
    pub name: String,
    #[ts(as = "String")]
    pub unit_price: Money,
    #[ts(as = "String")]
    pub quantity: Quantity,
    #[ts(as = "String")]
    pub subtotal: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    #[ts(as = "String")]
    pub amount: Money,
}

impl From<&LineItem> for LineItemResponse {
    fn from(item: &LineItem) -> Self {
        LineItemResponse {
            name: item.name().to_string(),
            unit_price: item.unit_price(),
            quantity: item.quantity(),
            subtotal: item.subtotal(),
        }
    }
}

impl From<&Receipt> for ReceiptResponse {
    fn from(receipt: &Receipt) -> Self {
        let payment = receipt.payment();
        ReceiptResponse {
            id: receipt.id().to_string(),
            user_id: receipt.user_id(),
            line_items: receipt.line_items().iter().map(LineItemResponse::from).collect(),
            payment: PaymentResponse {
                payment_type: payment.payment_type,
                amount: payment.amount,
            },
            total: receipt.total(),
            rest: receipt.rest(),
            created_at: receipt.created_at(),
        }
    }
}

impl From<Receipt> for ReceiptResponse {
    fn from(receipt: Receipt) -> Self {
        ReceiptResponse::from(&receipt)
    }
}
