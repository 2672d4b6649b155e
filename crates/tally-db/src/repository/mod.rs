//! # Repository Module
//!
//! Database repository implementations for Tally.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  ReceiptService                                                        │
//! │       │                                                                 │
//! │       │  db.receipts().find_for_user(&query)                           │
//! │       ▼                                                                 │
//! │  ReceiptRepository                                                     │
//! │  ├── save(&self, receipt)                                              │
//! │  ├── save_at(&self, receipt, created_at)                               │
//! │  ├── find_by_id(&self, id)                                             │
//! │  └── find_for_user(&self, query)                                       │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ReceiptRepository`](receipt::ReceiptRepository) - Receipt aggregate persistence and listing
//! - [`UserRepository`](user::UserRepository) - Receipt owners

pub mod receipt;
pub mod user;
