//! # Receipt Repository
//!
//! Persistence for the receipt aggregate: one `receipts` row plus its
//! `line_items` rows, always written and read together.
//!
//! ## Save Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         save(NewReceipt)                                │
//! │                                                                         │
//! │  1. receipt.check_invariants()   ← ConstraintViolation on failure      │
//! │  2. assign id (UUID v4) + created_at                                   │
//! │  3. BEGIN                                                              │
//! │     ├── INSERT receipts                                                │
//! │     └── INSERT line_items (position 0..n)                              │
//! │  4. COMMIT                        ← readers see all of it or nothing   │
//! │                                                                         │
//! │  Table CHECK constraints repeat the invariants; a violation there is   │
//! │  reported as ConstraintViolation and the transaction rolls back.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Load Flow
//! Header and items are read inside one transaction and handed to
//! `Receipt::restore`, which re-checks every invariant. A row set that does
//! not form a valid receipt comes back as `DbError::Corrupt`.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::{
    LineItem, Money, NewReceipt, Payment, PaymentType, Quantity, Receipt, ReceiptQuery,
};

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ReceiptRow {
    id: String,
    user_id: i64,
    payment_type: PaymentType,
    payment_amount_cents: i64,
    total_cents: i64,
    rest_cents: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct LineItemRow {
    name: String,
    unit_price_cents: i64,
    quantity_hundredths: i64,
    subtotal_cents: i64,
}

const SELECT_RECEIPT_COLUMNS: &str = r#"
    SELECT id, user_id, payment_type, payment_amount_cents,
           total_cents, rest_cents, created_at
    FROM receipts
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for receipt database operations.
#[derive(Debug, Clone)]
pub struct ReceiptRepository {
    pool: SqlitePool,
}

impl ReceiptRepository {
    /// Creates a new ReceiptRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReceiptRepository { pool }
    }

    /// Persists a receipt with the current time as `created_at`.
    ///
    /// ## Errors
    /// - `ConstraintViolation` - invariants fail at the storage boundary
    /// - `ForeignKeyViolation` - the owning user does not exist
    /// - `ConnectionFailed` / `PoolExhausted` - store unavailable
    pub async fn save(&self, receipt: NewReceipt) -> DbResult<Receipt> {
        self.save_at(receipt, Utc::now()).await
    }

    /// Persists a receipt with an explicit `created_at`.
    ///
    /// Used for imports and seeding backdated history.
    pub async fn save_at(
        &self,
        receipt: NewReceipt,
        created_at: DateTime<Utc>,
    ) -> DbResult<Receipt> {
        receipt
            .check_invariants()
            .map_err(|e| DbError::ConstraintViolation {
                message: e.to_string(),
            })?;

        let id = Uuid::new_v4().to_string();
        let payment = receipt.payment();

        debug!(
            id = %id,
            user_id = receipt.user_id(),
            items = receipt.line_items().len(),
            total = %receipt.total(),
            "Saving receipt"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO receipts (
                id, user_id, payment_type, payment_amount_cents,
                total_cents, rest_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&id)
        .bind(receipt.user_id())
        .bind(payment.payment_type)
        .bind(payment.amount.cents())
        .bind(receipt.total().cents())
        .bind(receipt.rest().cents())
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        for (position, item) in receipt.line_items().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO line_items (
                    id, receipt_id, position, name,
                    unit_price_cents, quantity_hundredths, subtotal_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&id)
            .bind(position as i64)
            .bind(item.name())
            .bind(item.unit_price().cents())
            .bind(item.quantity().hundredths())
            .bind(item.subtotal().cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id = %id, user_id = receipt.user_id(), "Receipt saved");

        Ok(receipt.into_persisted(id, created_at))
    }

    /// Loads a receipt with all its line items, in stored order.
    pub async fn find_by_id(&self, id: &str) -> DbResult<Option<Receipt>> {
        debug!(id = %id, "Loading receipt");

        let mut tx = self.pool.begin().await?;

        let sql = format!("{} WHERE id = ?1", SELECT_RECEIPT_COLUMNS);
        let row = sqlx::query_as::<_, ReceiptRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let receipt = match row {
            Some(row) => Some(assemble(&mut *tx, row).await?),
            None => None,
        };

        tx.commit().await?;
        Ok(receipt)
    }

    /// Runs a list query: owner, filters, newest first, then the page window.
    ///
    /// Same semantics as [`ReceiptQuery::select`].
    pub async fn find_for_user(&self, query: &ReceiptQuery) -> DbResult<Vec<Receipt>> {
        let filter = query.filter();
        let page = query.page();

        debug!(
            user_id = query.user_id(),
            skip = page.skip(),
            limit = page.limit(),
            "Listing receipts"
        );

        let sql = format!(
            r#"{}
            WHERE user_id = ?1
              AND (?2 IS NULL OR created_at >= ?2)
              AND (?3 IS NULL OR created_at <= ?3)
              AND (?4 IS NULL OR total_cents >= ?4)
              AND (?5 IS NULL OR payment_type = ?5)
            ORDER BY created_at DESC, id DESC
            LIMIT ?6 OFFSET ?7
            "#,
            SELECT_RECEIPT_COLUMNS
        );

        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query_as::<_, ReceiptRow>(&sql)
            .bind(query.user_id())
            .bind(filter.start_date())
            .bind(filter.end_date())
            .bind(filter.min_total().map(|m| m.cents()))
            .bind(filter.payment_type())
            .bind(page.limit())
            .bind(page.skip())
            .fetch_all(&mut *tx)
            .await?;

        let mut receipts = Vec::with_capacity(rows.len());
        for row in rows {
            receipts.push(assemble(&mut *tx, row).await?);
        }

        tx.commit().await?;
        Ok(receipts)
    }

    /// Number of receipts a user owns.
    pub async fn count_for_user(&self, user_id: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM receipts WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Loads the line items of `row` and rebuilds the aggregate.
async fn assemble(conn: &mut SqliteConnection, row: ReceiptRow) -> DbResult<Receipt> {
    let item_rows = sqlx::query_as::<_, LineItemRow>(
        r#"
        SELECT name, unit_price_cents, quantity_hundredths, subtotal_cents
        FROM line_items
        WHERE receipt_id = ?1
        ORDER BY position
        "#,
    )
    .bind(&row.id)
    .fetch_all(&mut *conn)
    .await?;

    let line_items = item_rows
        .into_iter()
        .map(|item| {
            LineItem::restore(
                item.name,
                Money::from_cents(item.unit_price_cents),
                Quantity::from_hundredths(item.quantity_hundredths),
                Money::from_cents(item.subtotal_cents),
            )
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DbError::corrupt(row.id.as_str(), e))?;

    Receipt::restore(
        row.id.clone(),
        row.user_id,
        row.created_at,
        line_items,
        Payment::new(row.payment_type, Money::from_cents(row.payment_amount_cents)),
        Money::from_cents(row.total_cents),
        Money::from_cents(row.rest_cents),
    )
    .map_err(|e| DbError::corrupt(row.id, e))
}

// =============================================================================
// Unit Tests
// =============================================================================
