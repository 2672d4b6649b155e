//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Receipt rule violations (input errors)         │
//! │  └── ValidationError  - Field-level validation failures                │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Storage failures                               │
//! │                                                                         │
//! │  tally-service errors                                                  │
//! │  └── ApiError         - What callers see (serialized)                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │                          DbError ───┴─► ApiError → Caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `CoreError` is a deterministic function of caller input. None of
//! them is worth retrying.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Receipt domain errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A monetary value could not be parsed or is out of its allowed range.
    #[error("Invalid money value '{input}': {reason}")]
    InvalidMoneyFormat { input: String, reason: String },

    /// A receipt was requested without any line items.
    #[error("Receipt must contain at least one line item")]
    NoLineItems,

    /// A line item breaks one of its rules.
    ///
    /// ## When This Occurs
    /// - quantity is zero or negative
    /// - unit price is negative
    /// - name is blank
    /// - the subtotal does not fit the storable range
    ///
    /// `position` is zero-based, in request order.
    #[error("Line item {position} is invalid: {reason}")]
    InvalidLineItem { position: usize, reason: String },

    /// The payment itself is malformed (negative amount, unknown type).
    #[error("Invalid payment: {reason}")]
    InvalidPayment { reason: String },

    /// The customer paid less than the receipt total.
    ///
    /// ## User Workflow
    /// ```text
    /// Items total: 70.50
    /// Paid (CASH): 50.00
    ///      │
    ///      ▼
    /// InsufficientPayment { total: 70.50, paid: 50.00 }
    ///      │
    ///      ▼
    /// Caller sees a client-input error; nothing is stored
    /// ```
    #[error("Insufficient payment: total is {total}, paid {paid}")]
    InsufficientPayment { total: Money, paid: Money },

    /// A list query has an unusable filter or pagination bound.
    #[error("Invalid filter: {reason}")]
    InvalidFilter { reason: String },

    /// The requested render width is outside the exclusive range.
    #[error("Line width {width} is out of range: must be greater than {min} and less than {max}")]
    InvalidLineWidth { width: usize, min: usize, max: usize },

    /// Receipt data does not satisfy the aggregate invariants.
    ///
    /// Only reachable with data that bypassed `create_receipt`, e.g. rows
    /// read back from storage. Indicates a bug or corruption, not bad input.
    #[error("Receipt invariant violated: {0}")]
    InvariantViolation(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidFilter error.
    pub fn invalid_filter(reason: impl Into<String>) -> Self {
        CoreError::InvalidFilter {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_line_item(position: usize, reason: impl Into<String>) -> Self {
        CoreError::InvalidLineItem {
            position,
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Field-level validation errors.
///
/// Used for early validation before receipt logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
