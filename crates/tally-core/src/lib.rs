//! # tally-core: Pure Receipt Logic for Tally
//!
//! This crate is the **heart** of Tally. It contains the receipt domain
//! engine as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 tally-service (CLI / boundary)                  │   │
//! │  │   create_receipt, get_receipt, list_receipts, view_receipt_text │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │  receipt  │  │   query   │  │  render   │  │   │
//! │  │   │   Money   │  │  LineItem │  │  Filter   │  │  fixed-   │  │   │
//! │  │   │ Quantity  │  │  Receipt  │  │   Page    │  │  width    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tally-db (Database Layer)                    │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money and Quantity, fixed-point at two decimal places
//! - [`types`] - Payment types and request shapes
//! - [`receipt`] - The receipt aggregate and `create_receipt`
//! - [`query`] - Filter, ordering and pagination over receipt history
//! - [`render`] - Fixed-width plain-text receipts
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level checks
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output
//! 2. **No I/O**: database, network and file system access live elsewhere
//! 3. **Integer Money**: every amount is an `i64` of cents, never a float
//! 4. **Explicit Errors**: all errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::{create_receipt, LineItemRequest, PaymentRequest, PaymentType};
//! use tally_core::money::{Money, Quantity};
//!
//! let items = vec![
//!     LineItemRequest::new("Bread", "20.00".parse().unwrap(), Quantity::from_units(2)),
//!     LineItemRequest::new("Milk", "30.50".parse().unwrap(), Quantity::from_units(1)),
//! ];
//! let payment = PaymentRequest::new(PaymentType::Cash, Money::from_cents(10_000));
//!
//! let receipt = create_receipt(1, &items, &payment).unwrap();
//! assert_eq!(receipt.total().cents(), 7050);
//! assert_eq!(receipt.rest().cents(), 2950);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod query;
pub mod receipt;
pub mod render;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use tally_core::Money` instead of
// `use tally_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Quantity};
pub use query::{Page, ReceiptFilter, ReceiptFilterParams, ReceiptQuery};
pub use receipt::{create_receipt, LineItem, NewReceipt, Receipt};
pub use render::{render_receipt_text, ReceiptRenderer, RenderConfig};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Largest magnitude a stored amount may have, in cents (`99,999,999.99`).
///
/// Matches the 10-digit, 2-fractional-digit columns receipts are stored in.
pub const MAX_STORABLE_CENTS: i64 = 9_999_999_999;

/// Page size used when a list request does not name one.
pub const DEFAULT_PAGE_LIMIT: i64 = 100;

/// Largest page a list request may ask for.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Render widths must be strictly greater than this.
pub const MIN_LINE_WIDTH: usize = 10;

/// Render widths must be strictly less than this.
pub const MAX_LINE_WIDTH: usize = 100;

/// Width of a typical 58 mm thermal roll.
pub const DEFAULT_LINE_WIDTH: usize = 32;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 64;
