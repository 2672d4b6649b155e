//! # Receipt Aggregate
//!
//! A receipt and its line items form one consistency unit. This module is
//! the only place that computes subtotals, totals and change.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Receipt Lifecycle                                 │
//! │                                                                         │
//! │  1. BUILD (pure)                                                       │
//! │     └── create_receipt(user, items, payment) → NewReceipt              │
//! │         subtotal = round2(price × qty) for each item                   │
//! │         total    = Σ subtotal                                          │
//! │         rest     = max(0, paid - total)                                │
//! │                                                                         │
//! │  2. PERSIST (store, one transaction)                                   │
//! │     └── NewReceipt::into_persisted(id, created_at) → Receipt           │
//! │                                                                         │
//! │  3. READ BACK                                                          │
//! │     └── Receipt::restore(...) re-checks every invariant                │
//! │                                                                         │
//! │  There is no step 4: receipts are never edited.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! 1. `payment.amount >= total`
//! 2. `rest == max(0, payment.amount - total)`
//! 3. `total == Σ line_item.subtotal`
//! 4. every item: `unit_price >= 0`, `quantity > 0`, `subtotal == round2(price × qty)`
//! 5. at least one line item
//!
//! Fields are private and there are no setters, so a value of these types
//! that exists is a value that satisfied the checks.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, Quantity};
use crate::types::{LineItemRequest, Payment, PaymentRequest, PaymentType, UserId};
use crate::validation::{validate_line_item_name, validate_storable};
use crate::MAX_STORABLE_CENTS;

// =============================================================================
// Line Item
// =============================================================================

/// One purchased product on a receipt.
///
/// The subtotal is computed once, here, and stored. Later reads use the
/// stored value so the record keeps matching what was charged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    name: String,
    unit_price: Money,
    quantity: Quantity,
    subtotal: Money,
}

impl LineItem {
    /// Prices a requested line. `position` is only used in error reports.
    fn price(position: usize, request: &LineItemRequest) -> CoreResult<LineItem> {
        validate_line_item_name(&request.name)
            .map_err(|e| CoreError::invalid_line_item(position, e.to_string()))?;

        if request.unit_price.is_negative() {
            return Err(CoreError::invalid_line_item(
                position,
                "unit price must not be negative",
            ));
        }
        if !request.quantity.is_positive() {
            return Err(CoreError::invalid_line_item(
                position,
                "quantity must be greater than zero",
            ));
        }
        validate_storable("unit price", request.unit_price.cents())
            .and_then(|_| validate_storable("quantity", request.quantity.hundredths()))
            .map_err(|e| CoreError::invalid_line_item(position, e.to_string()))?;

        let subtotal = request
            .unit_price
            .checked_mul_quantity(request.quantity)
            .ok_or_else(|| CoreError::invalid_line_item(position, "subtotal is too large"))?;
        validate_storable("subtotal", subtotal.cents())
            .map_err(|e| CoreError::invalid_line_item(position, e.to_string()))?;

        Ok(LineItem {
            name: request.name.clone(),
            unit_price: request.unit_price,
            quantity: request.quantity,
            subtotal,
        })
    }

    /// Rebuilds a line item from stored values, checking that the stored
    /// subtotal still agrees with price and quantity.
    pub fn restore(
        name: String,
        unit_price: Money,
        quantity: Quantity,
        subtotal: Money,
    ) -> CoreResult<LineItem> {
        let item = LineItem {
            name,
            unit_price,
            quantity,
            subtotal,
        };
        item.check_invariants()?;
        Ok(item)
    }

    fn check_invariants(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::InvariantViolation(
                "line item name is blank".to_string(),
            ));
        }
        if self.unit_price.is_negative() {
            return Err(CoreError::InvariantViolation(format!(
                "line item '{}' has a negative unit price",
                self.name
            )));
        }
        if !self.quantity.is_positive() {
            return Err(CoreError::InvariantViolation(format!(
                "line item '{}' has a non-positive quantity",
                self.name
            )));
        }
        if self.unit_price.checked_mul_quantity(self.quantity) != Some(self.subtotal) {
            return Err(CoreError::InvariantViolation(format!(
                "line item '{}' subtotal {} does not equal {} x {}",
                self.name, self.subtotal, self.quantity, self.unit_price
            )));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }
}

// =============================================================================
// New Receipt (not yet persisted)
// =============================================================================

/// A fully computed receipt that has not been stored yet.
///
/// Has no id and no timestamp; the store assigns both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReceipt {
    user_id: UserId,
    line_items: Vec<LineItem>,
    payment: Payment,
    total: Money,
    rest: Money,
}

impl NewReceipt {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn payment(&self) -> Payment {
        self.payment
    }

    pub fn total(&self) -> Money {
        self.total
    }

    /// Change returned to the customer.
    pub fn rest(&self) -> Money {
        self.rest
    }

    /// Re-checks all aggregate invariants.
    ///
    /// Always `Ok` for values built by [`create_receipt`]. The store calls it
    /// again at its boundary before writing.
    pub fn check_invariants(&self) -> CoreResult<()> {
        if self.line_items.is_empty() {
            return Err(CoreError::InvariantViolation(
                "receipt has no line items".to_string(),
            ));
        }
        for item in &self.line_items {
            item.check_invariants()?;
        }

        let sum = self
            .line_items
            .iter()
            .try_fold(Money::zero(), |acc, item| acc.checked_add(item.subtotal()))
            .ok_or_else(|| {
                CoreError::InvariantViolation("sum of subtotals overflows".to_string())
            })?;
        if sum != self.total {
            return Err(CoreError::InvariantViolation(format!(
                "total {} does not equal the sum of subtotals {}",
                self.total, sum
            )));
        }
        if self.payment.amount < self.total {
            return Err(CoreError::InvariantViolation(format!(
                "payment {} is less than total {}",
                self.payment.amount, self.total
            )));
        }
        let expected_rest = self.payment.amount.sub_non_negative(self.total);
        if self.rest != expected_rest {
            return Err(CoreError::InvariantViolation(format!(
                "rest {} does not equal {}",
                self.rest, expected_rest
            )));
        }
        Ok(())
    }

    /// Attaches the identity assigned by the store.
    pub fn into_persisted(self, id: String, created_at: DateTime<Utc>) -> Receipt {
        Receipt {
            id,
            created_at,
            contents: self,
        }
    }
}

// =============================================================================
// Receipt (persisted)
// =============================================================================

/// A stored receipt: a [`NewReceipt`] plus its id and creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    id: String,
    created_at: DateTime<Utc>,
    contents: NewReceipt,
}

impl Receipt {
    /// Rebuilds a receipt from stored values.
    ///
    /// ## Errors
    /// `CoreError::InvariantViolation` if the stored data is inconsistent.
    /// A partially loaded aggregate is never returned.
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: String,
        user_id: UserId,
        created_at: DateTime<Utc>,
        line_items: Vec<LineItem>,
        payment: Payment,
        total: Money,
        rest: Money,
    ) -> CoreResult<Receipt> {
        let contents = NewReceipt {
            user_id,
            line_items,
            payment,
            total,
            rest,
        };
        contents.check_invariants()?;
        Ok(contents.into_persisted(id, created_at))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn user_id(&self) -> UserId {
        self.contents.user_id
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.contents.line_items
    }

    pub fn payment(&self) -> Payment {
        self.contents.payment
    }

    pub fn total(&self) -> Money {
        self.contents.total
    }

    /// Change returned to the customer.
    pub fn rest(&self) -> Money {
        self.contents.rest
    }
}

// =============================================================================
// Construction
// =============================================================================

/// Builds a receipt from the caller's line items and payment.
///
/// ## Errors
/// - `NoLineItems` - `items` is empty
/// - `InvalidLineItem` - blank name, negative price, non-positive quantity,
///   or a value outside the storable range
/// - `InvalidPayment` - unknown payment type or negative amount
/// - `InsufficientPayment` - `payment.amount < total`
///
/// ## Example
/// ```rust
/// use tally_core::{create_receipt, LineItemRequest, PaymentRequest, PaymentType};
/// use tally_core::money::{Money, Quantity};
///
/// let items = vec![
///     LineItemRequest::new("Bread", Money::from_cents(2000), Quantity::from_units(2)),
///     LineItemRequest::new("Milk", Money::from_cents(3050), Quantity::from_units(1)),
/// ];
/// let payment = PaymentRequest::new(PaymentType::Cash, Money::from_cents(10000));
///
/// let receipt = create_receipt(7, &items, &payment).unwrap();
/// assert_eq!(receipt.total().to_string(), "70.50");
/// assert_eq!(receipt.rest().to_string(), "29.50");
/// ```
pub fn create_receipt(
    user_id: UserId,
    items: &[LineItemRequest],
    payment: &PaymentRequest,
) -> CoreResult<NewReceipt> {
    if items.is_empty() {
        return Err(CoreError::NoLineItems);
    }

    let line_items = items
        .iter()
        .enumerate()
        .map(|(position, request)| LineItem::price(position, request))
        .collect::<CoreResult<Vec<_>>>()?;

    let total = line_items
        .iter()
        .try_fold(Money::zero(), |acc, item| acc.checked_add(item.subtotal()))
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "total".to_string(),
            min: 0,
            max: MAX_STORABLE_CENTS,
        })?;
    validate_storable("total", total.cents())?;

    let payment_type: PaymentType =
        payment
            .payment_type
            .parse()
            .map_err(|e: ValidationError| CoreError::InvalidPayment {
                reason: e.to_string(),
            })?;
    if payment.amount.is_negative() {
        return Err(CoreError::InvalidPayment {
            reason: "amount must not be negative".to_string(),
        });
    }
    validate_storable("payment amount", payment.amount.cents()).map_err(|e| {
        CoreError::InvalidPayment {
            reason: e.to_string(),
        }
    })?;

    if payment.amount < total {
        return Err(CoreError::InsufficientPayment {
            total,
            paid: payment.amount,
        });
    }

    let rest = payment.amount.sub_non_negative(total);

    Ok(NewReceipt {
        user_id,
        line_items,
        payment: Payment::new(payment_type, payment.amount),
        total,
        rest,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bread_and_milk() -> Vec<LineItemRequest> {
        vec![
            LineItemRequest::new("Bread", Money::from_cents(2000), Quantity::from_units(2)),
            LineItemRequest::new("Milk", Money::from_cents(3050), Quantity::from_units(1)),
        ]
    }

    fn cash(cents: i64) -> PaymentRequest {
        PaymentRequest::new(PaymentType::Cash, Money::from_cents(cents))
    }

    #[test]
    fn test_create_receipt_computes_total_and_rest() {
        let receipt = create_receipt(1, &bread_and_milk(), &cash(10000)).unwrap();

        assert_eq!(receipt.user_id(), 1);
        assert_eq!(receipt.total(), Money::from_cents(7050));
        assert_eq!(receipt.rest(), Money::from_cents(2950));
        assert_eq!(receipt.payment().payment_type, PaymentType::Cash);
        assert_eq!(receipt.line_items()[0].subtotal(), Money::from_cents(4000));
        assert_eq!(receipt.line_items()[1].subtotal(), Money::from_cents(3050));
        assert!(receipt.check_invariants().is_ok());
    }

    #[test]
    fn test_exact_payment_gives_zero_rest() {
        let receipt = create_receipt(1, &bread_and_milk(), &cash(7050)).unwrap();
        assert!(receipt.rest().is_zero());
    }

    #[test]
    fn test_insufficient_payment_is_rejected() {
        let err = create_receipt(1, &bread_and_milk(), &cash(5000)).unwrap_err();
        match err {
            CoreError::InsufficientPayment { total, paid } => {
                assert_eq!(total, Money::from_cents(7050));
                assert_eq!(paid, Money::from_cents(5000));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_fractional_quantity_rounds_once_per_line() {
        // 0.99 × 1.5 = 1.485 → 1.49 ; 0.99 × 0.5 = 0.495 → 0.50
        let items = vec![
            LineItemRequest::new("Apples", Money::from_cents(99), Quantity::from_hundredths(150)),
            LineItemRequest::new("Pears", Money::from_cents(99), Quantity::from_hundredths(50)),
        ];
        let receipt = create_receipt(1, &items, &cash(200)).unwrap();
        assert_eq!(receipt.line_items()[0].subtotal(), Money::from_cents(149));
        assert_eq!(receipt.line_items()[1].subtotal(), Money::from_cents(50));
        assert_eq!(receipt.total(), Money::from_cents(199));
        assert_eq!(receipt.rest(), Money::from_cents(1));
    }

    #[test]
    fn test_invalid_line_items() {
        let err = create_receipt(1, &[], &cash(100)).unwrap_err();
        assert!(matches!(err, CoreError::NoLineItems));

        let zero_qty = vec![LineItemRequest::new(
            "Water",
            Money::from_cents(100),
            Quantity::from_units(0),
        )];
        let err = create_receipt(1, &zero_qty, &cash(100)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidLineItem { position: 0, .. }));

        let mut negative_price = bread_and_milk();
        negative_price.push(LineItemRequest::new(
            "Refund",
            Money::from_cents(-100),
            Quantity::from_units(1),
        ));
        let err = create_receipt(1, &negative_price, &cash(10000)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidLineItem { position: 2, .. }));

        let blank = vec![LineItemRequest::new(
            "   ",
            Money::from_cents(100),
            Quantity::from_units(1),
        )];
        let err = create_receipt(1, &blank, &cash(100)).unwrap_err();
        assert_eq!(err.to_string(), "Line item 0 is invalid: name is required");
    }

    #[test]
    fn test_free_item_is_allowed() {
        let items = vec![LineItemRequest::new(
            "Bag",
            Money::zero(),
            Quantity::from_units(1),
        )];
        let receipt = create_receipt(1, &items, &cash(0)).unwrap();
        assert!(receipt.total().is_zero());
    }

    #[test]
    fn test_invalid_payment() {
        let card = PaymentRequest {
            payment_type: "card".to_string(),
            amount: Money::from_cents(10000),
        };
        let err = create_receipt(1, &bread_and_milk(), &card).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPayment { .. }));

        let negative = cash(-1);
        let err = create_receipt(1, &bread_and_milk(), &negative).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPayment { .. }));
    }

    #[test]
    fn test_values_beyond_storage_range_are_rejected() {
        let items = vec![LineItemRequest::new(
            "Yacht",
            Money::from_cents(9_999_999_999),
            Quantity::from_units(2),
        )];
        let err = create_receipt(1, &items, &cash(9_999_999_999)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidLineItem { .. }));
    }

    #[test]
    fn test_restore_detects_corruption() {
        let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let item = LineItem::restore(
            "Bread".to_string(),
            Money::from_cents(2000),
            Quantity::from_units(2),
            Money::from_cents(4000),
        )
        .unwrap();

        let ok = Receipt::restore(
            "r-1".to_string(),
            1,
            created_at,
            vec![item.clone()],
            Payment::new(PaymentType::Cash, Money::from_cents(5000)),
            Money::from_cents(4000),
            Money::from_cents(1000),
        );
        assert!(ok.is_ok());

        let wrong_rest = Receipt::restore(
            "r-1".to_string(),
            1,
            created_at,
            vec![item],
            Payment::new(PaymentType::Cash, Money::from_cents(5000)),
            Money::from_cents(4000),
            Money::from_cents(900),
        );
        assert!(matches!(wrong_rest, Err(CoreError::InvariantViolation(_))));

        let wrong_subtotal = LineItem::restore(
            "Bread".to_string(),
            Money::from_cents(2000),
            Quantity::from_units(2),
            Money::from_cents(3999),
        );
        assert!(matches!(wrong_subtotal, Err(CoreError::InvariantViolation(_))));
    }

    #[test]
    fn test_restore_reports_subtotal_overflow() {
        let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let huge = LineItem::restore(
            "Gold bar".to_string(),
            Money::from_cents(i64::MAX),
            Quantity::from_units(1),
            Money::from_cents(i64::MAX),
        )
        .unwrap();

        let result = Receipt::restore(
            "r-1".to_string(),
            1,
            created_at,
            vec![huge.clone(), huge],
            Payment::new(PaymentType::Cash, Money::from_cents(i64::MAX)),
            Money::from_cents(i64::MAX),
            Money::zero(),
        );
        assert!(matches!(result, Err(CoreError::InvariantViolation(_))));
    }

}
