//! # Validation Module
//!
//! Field-level input checks shared by the aggregate, the store and the
//! service boundary.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Boundary (tally-service)                                     │
//! │  ├── Deserialization (Money/Quantity reject floats, bad decimals)      │
//! │  └── Receipt id / username format                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Aggregate (tally-core::receipt)                              │
//! │  └── THIS MODULE + receipt invariants                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints mirroring the invariants                        │
//! │  └── Foreign key constraints (ON DELETE CASCADE)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_STORABLE_CENTS, MAX_USERNAME_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a line item name.
///
/// ## Rules
/// - Must contain at least one non-whitespace character
/// - No upper bound: long names wrap when rendered
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_line_item_name;
///
/// assert!(validate_line_item_name("Bread").is_ok());
/// assert!(validate_line_item_name("  ").is_err());
/// ```
pub fn validate_line_item_name(name: &str) -> ValidationResult<()> {
    if name.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    Ok(())
}

/// Validates a username for the owner rows receipts hang off.
///
/// ## Rules
/// - Must not be empty
/// - At most 64 characters
/// - Letters, digits, `.`, `-` and `_` only
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }

    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: MAX_USERNAME_LENGTH,
        });
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, dots, hyphens, and underscores"
                .to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates that a scaled value (cents or hundredths) fits the storage
/// columns, which hold at most 10 digits with 2 of them fractional.
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_storable;
///
/// assert!(validate_storable("total", 9_999_999_999).is_ok());    // 99,999,999.99
/// assert!(validate_storable("total", 10_000_000_000).is_err());
/// ```
pub fn validate_storable(field: &str, scaled: i64) -> ValidationResult<()> {
    if scaled.unsigned_abs() > MAX_STORABLE_CENTS as u64 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: -MAX_STORABLE_CENTS,
            max: MAX_STORABLE_CENTS,
        });
    }

    Ok(())
}

/// Validates a user id handed in by the authentication layer.
pub fn validate_user_id(user_id: i64) -> ValidationResult<()> {
    if user_id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "user id".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a receipt id and returns it in stored form.
///
/// Any spelling `uuid` accepts (upper case, no hyphens, braces, `urn:uuid:`)
/// maps to the lower-case hyphenated form the store writes.
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_receipt_id;
///
/// assert_eq!(
///     validate_receipt_id("550E8400E29B41D4A716446655440000").unwrap(),
///     "550e8400-e29b-41d4-a716-446655440000"
/// );
/// assert!(validate_receipt_id("not-a-uuid").is_err());
/// ```
pub fn validate_receipt_id(id: &str) -> ValidationResult<String> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ValidationError::Required {
            field: "receipt id".to_string(),
        });
    }

    let uuid = uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "receipt id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(uuid.hyphenated().to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================
