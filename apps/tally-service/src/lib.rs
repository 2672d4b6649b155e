//! # tally-service: Receipt Service
//!
//! The operations exposed to callers, on top of `tally-core` and `tally-db`.
//!
//! ## Module Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        tally-service                                    │
//! │                                                                         │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐                 │
//! │  │   config     │   │   service    │   │    error     │                 │
//! │  │ ──────────── │   │ ──────────── │   │ ──────────── │                 │
//! │  │ ServiceConfig│──►│ReceiptService│──►│ ApiError     │                 │
//! │  │ (env vars)   │   │ create/get/  │   │ ErrorCode    │                 │
//! │  └──────────────┘   │ list/render  │   └──────────────┘                 │
//! │                     └──────┬───────┘                                    │
//! │                            ▼                                            │
//! │                     ┌──────────────┐                                    │
//! │                     │     dto      │                                    │
//! │                     │ request and  │                                    │
//! │                     │ response     │                                    │
//! │                     └──────────────┘                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use tally_core::{LineItemRequest, Money, PaymentRequest, PaymentType, Quantity};
//! use tally_db::{Database, DbConfig};
//! use tally_service::ReceiptService;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let db = Database::new(DbConfig::new("./tally.db")).await?;
//! let service = ReceiptService::new(db);
//!
//! let user = service.register_user("borys").await?;
//! let items = vec![LineItemRequest::new("Bread", Money::from_cents(2000), Quantity::from_units(2))];
//! let payment = PaymentRequest::new(PaymentType::Cash, Money::from_cents(10_000));
//!
//! let receipt = service.create_receipt(user.id, &items, &payment).await?;
//! println!("{}", service.render_receipt_text(&receipt, 32)?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod service;

pub use config::{ConfigError, ServiceConfig};
pub use dto::{CreateReceiptRequest, LineItemResponse, PaymentResponse, ReceiptResponse};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use service::ReceiptService;

/// Default `RUST_LOG` directives for binaries.
pub const DEFAULT_LOG_FILTER: &str = "info,tally=debug,sqlx=warn";

/// Installs the `tracing` subscriber.
///
/// Honors `RUST_LOG` and falls back to [`DEFAULT_LOG_FILTER`]. Logs go to
/// stderr so command output on stdout stays machine-readable.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
