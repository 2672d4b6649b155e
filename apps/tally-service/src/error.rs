//! # API Error Type
//!
//! Unified error type for the receipt service boundary.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tally                                  │
//! │                                                                         │
//! │  ReceiptService::create_receipt                                         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Rule violation? ─── CoreError::InsufficientPayment ──┐                │
//! │         │                                             │                │
//! │         ▼                                             ▼                │
//! │  Storage failure? ── DbError::ConnectionFailed ───► ApiError ──► CLI   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Success ──────────────────────────────────────────────────────► CLI   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Input errors keep their message. Storage and invariant errors are logged
//! with full detail and replaced by a generic message.

use serde::Serialize;
use tally_core::CoreError;
use tally_db::DbError;

/// Error returned by [`ReceiptService`](crate::ReceiptService).
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_PAYMENT",
///   "message": "Insufficient payment: total is 70.50, paid 50.00"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed line item, payment, money value or username (400)
    ValidationError,

    /// Payment below the receipt total (400)
    InsufficientPayment,

    /// Unusable list filter or pagination bound (400)
    InvalidFilter,

    /// Render width outside 10 < w < 100 (400)
    InvalidLineWidth,

    /// Resource not found (404)
    NotFound,

    /// Store unreachable or pool exhausted (503)
    StorageUnavailable,

    /// The store rejected data that passed the receipt rules (500)
    ConstraintViolation,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    /// HTTP status a transport should use for this code.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::ValidationError
            | ErrorCode::InsufficientPayment
            | ErrorCode::InvalidFilter
            | ErrorCode::InvalidLineWidth => 400,
            ErrorCode::NotFound => 404,
            ErrorCode::StorageUnavailable => 503,
            ErrorCode::ConstraintViolation | ErrorCode::DatabaseError | ErrorCode::Internal => {
                500
            }
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// See [`ErrorCode::http_status`].
    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// True for errors caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        self.http_status() < 500
    }
}

/// Result type for service operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        if err.is_unavailable() {
            tracing::error!("Receipt store unavailable: {}", err);
            return ApiError::new(ErrorCode::StorageUnavailable, "Receipt store is unavailable");
        }

        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::InvalidInput { message } => ApiError::validation(message),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Unknown user")
            }
            DbError::ConstraintViolation { message } => {
                tracing::error!("Store rejected receipt: {}", message);
                ApiError::new(
                    ErrorCode::ConstraintViolation,
                    "Receipt failed storage integrity checks",
                )
            }
            DbError::Corrupt { id, reason } => {
                tracing::error!(receipt_id = %id, "Corrupt receipt: {}", reason);
                ApiError::internal("Stored receipt could not be read")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) | DbError::Internal(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::ConnectionFailed(_)
            | DbError::TransactionFailed(_)
            | DbError::PoolExhausted => {
                ApiError::new(ErrorCode::StorageUnavailable, "Receipt store is unavailable")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientPayment { .. } => {
                ApiError::new(ErrorCode::InsufficientPayment, err.to_string())
            }
            CoreError::InvalidFilter { .. } => {
                ApiError::new(ErrorCode::InvalidFilter, err.to_string())
            }
            CoreError::InvalidLineWidth { .. } => {
                ApiError::new(ErrorCode::InvalidLineWidth, err.to_string())
            }
            CoreError::InvalidMoneyFormat { .. }
            | CoreError::NoLineItems
            | CoreError::InvalidLineItem { .. }
            | CoreError::InvalidPayment { .. } => ApiError::validation(err.to_string()),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
            CoreError::InvariantViolation(e) => {
                tracing::error!("Receipt invariant violated: {}", e);
                ApiError::internal("Receipt data is inconsistent")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::Money;

    #[test]
    fn test_core_error_codes() {
        let err: ApiError = CoreError::InsufficientPayment {
            total: Money::from_cents(7050),
            paid: Money::from_cents(5000),
        }
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientPayment);
        assert_eq!(err.message, "Insufficient payment: total is 70.50, paid 50.00");
        assert!(err.is_client_error());

        let err: ApiError = CoreError::invalid_filter("limit too large").into();
        assert_eq!(err.code, ErrorCode::InvalidFilter);

        let err: ApiError = CoreError::NoLineItems.into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.http_status(), 400);

        let err: ApiError = CoreError::InvariantViolation("rest mismatch".into()).into();
        assert_eq!(err.code, ErrorCode::Internal);
        assert!(!err.message.contains("rest mismatch"));
    }

    #[test]
    fn test_db_error_codes() {
        let err: ApiError = DbError::PoolExhausted.into();
        assert_eq!(err.code, ErrorCode::StorageUnavailable);
        assert_eq!(err.http_status(), 503);

        let err: ApiError = DbError::ConnectionFailed("disk gone".into()).into();
        assert_eq!(err.code, ErrorCode::StorageUnavailable);
        assert!(!err.message.contains("disk gone"));

        let err: ApiError = DbError::ConstraintViolation {
            message: "CHECK constraint failed: check_rest".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::ConstraintViolation);
        assert!(!err.is_client_error());

        let err: ApiError = DbError::InvalidInput {
            message: "username may only contain letters".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "username may only contain letters");

        let err: ApiError = DbError::duplicate("username", "borys").into();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err: ApiError = DbError::not_found("User", "7").into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn test_serialization() {
        let err = ApiError::new(ErrorCode::InvalidLineWidth, "bad width");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "INVALID_LINE_WIDTH");
        assert_eq!(json["message"], "bad width");
        assert_eq!(err.to_string(), "[InvalidLineWidth] bad width");
    }
}
