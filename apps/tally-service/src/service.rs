//! # Receipt Service
//!
//! The operations callers use: create, fetch, list and print receipts.
//!
//! ## Operation Flow
//! ```text
//! create_receipt(user, items, payment)
//!        │
//!        ▼
//! tally_core::create_receipt  ── rule violation ──► ApiError (nothing stored)
//!        │
//!        ▼
//! ReceiptRepository::save     ── storage failure ─► ApiError
//!        │
//!        ▼
//! Receipt (id, created_at assigned)
//! ```
//!
//! The service holds no state of its own beyond the pool handle and the
//! renderer. Cloning it is cheap, and clones share the pool.

use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::dto::CreateReceiptRequest;
use crate::error::{ApiError, ApiResult};
use tally_core::validation::{validate_receipt_id, validate_user_id};
use tally_core::{
    LineItemRequest, Page, PaymentRequest, Receipt, ReceiptFilter, ReceiptFilterParams,
    ReceiptQuery, ReceiptRenderer, UserId, DEFAULT_LINE_WIDTH,
};
use tally_db::{Database, User};

/// Receipt operations over a [`Database`].
#[derive(Debug, Clone)]
pub struct ReceiptService {
    db: Database,
    renderer: ReceiptRenderer,
    default_width: usize,
}

impl ReceiptService {
    /// Creates a service with the default renderer and line width.
    pub fn new(db: Database) -> Self {
        ReceiptService {
            db,
            renderer: ReceiptRenderer::default(),
            default_width: DEFAULT_LINE_WIDTH,
        }
    }

    /// Opens the configured database and builds a service over it.
    pub async fn from_config(config: &ServiceConfig) -> anyhow::Result<Self> {
        let db = Database::new(config.db_config()).await?;
        let renderer = ReceiptRenderer::new(config.render_config()?);

        Ok(ReceiptService::new(db)
            .with_renderer(renderer)
            .with_default_width(config.line_width))
    }

    /// Replaces the renderer.
    pub fn with_renderer(mut self, renderer: ReceiptRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Width used by [`view_receipt_text`](Self::view_receipt_text) when the
    /// caller passes none.
    pub fn with_default_width(mut self, width: usize) -> Self {
        self.default_width = width;
        self
    }

    /// The underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Registers a receipt owner.
    pub async fn register_user(&self, username: &str) -> ApiResult<User> {
        let user = self.db.users().create(username).await.map_err(|e| {
            warn!(username = %username, "User registration rejected: {}", e);
            ApiError::from(e)
        })?;
        Ok(user)
    }

    // =========================================================================
    // Receipts
    // =========================================================================

    /// Prices and stores a new receipt.
    ///
    /// ## Errors
    /// - `INSUFFICIENT_PAYMENT` - payment below the total; nothing is stored
    /// - `VALIDATION_ERROR` - bad line item, payment type or unknown user
    /// - `STORAGE_UNAVAILABLE` / `DATABASE_ERROR` - the store failed
    pub async fn create_receipt(
        &self,
        user_id: UserId,
        line_items: &[LineItemRequest],
        payment: &PaymentRequest,
    ) -> ApiResult<Receipt> {
        validate_user_id(user_id).map_err(|e| ApiError::validation(e.to_string()))?;

        let receipt = tally_core::create_receipt(user_id, line_items, payment).map_err(|e| {
            warn!(user_id, "Receipt rejected: {}", e);
            ApiError::from(e)
        })?;

        let receipt = self.db.receipts().save(receipt).await?;

        info!(
            id = %receipt.id(),
            user_id,
            total = %receipt.total(),
            items = receipt.line_items().len(),
            "Receipt created"
        );
        Ok(receipt)
    }

    /// [`create_receipt`](Self::create_receipt) taking a request body.
    pub async fn create_receipt_from(
        &self,
        user_id: UserId,
        request: &CreateReceiptRequest,
    ) -> ApiResult<Receipt> {
        self.create_receipt(user_id, &request.line_items, &request.payment)
            .await
    }

    /// Fetches a receipt for its owner.
    ///
    /// Receipts owned by someone else are reported as absent.
    pub async fn get_receipt(
        &self,
        receipt_id: &str,
        requesting_user: UserId,
    ) -> ApiResult<Option<Receipt>> {
        let receipt = self
            .get_receipt_public(receipt_id)
            .await?
            .filter(|r| r.user_id() == requesting_user);

        if receipt.is_none() {
            debug!(id = %receipt_id, user_id = requesting_user, "Receipt not visible to user");
        }
        Ok(receipt)
    }

    /// Fetches a receipt by id with no ownership check.
    ///
    /// Ids are random UUIDs in any spelling `uuid` accepts; anything else
    /// cannot name a receipt and is reported as absent.
    pub async fn get_receipt_public(&self, receipt_id: &str) -> ApiResult<Option<Receipt>> {
        let receipt_id = match validate_receipt_id(receipt_id) {
            Ok(id) => id,
            Err(_) => {
                debug!(id = %receipt_id, "Malformed receipt id");
                return Ok(None);
            }
        };

        Ok(self.db.receipts().find_by_id(&receipt_id).await?)
    }

    /// Lists a user's receipts, newest first.
    ///
    /// `skip` defaults to 0 and `limit` to [`tally_core::DEFAULT_PAGE_LIMIT`].
    ///
    /// ## Errors
    /// - `INVALID_FILTER` - unparseable bound, inverted date range, negative
    ///   minimum total or page bounds out of range
    pub async fn list_receipts(
        &self,
        user_id: UserId,
        params: &ReceiptFilterParams,
        skip: Option<i64>,
        limit: Option<i64>,
    ) -> ApiResult<Vec<Receipt>> {
        let query = build_query(user_id, params, skip, limit).map_err(|e| {
            warn!(user_id, "List query rejected: {}", e);
            e
        })?;

        let receipts = self.db.receipts().find_for_user(&query).await?;

        debug!(user_id, count = receipts.len(), "Listed receipts");
        Ok(receipts)
    }

    /// Renders a receipt as fixed-width text.
    pub fn render_receipt_text(&self, receipt: &Receipt, line_width: usize) -> ApiResult<String> {
        Ok(self.renderer.render(receipt, line_width)?)
    }

    /// The public plain-text view of a receipt.
    ///
    /// Absent receipts yield `None`. The width is validated before the
    /// lookup so a bad width is reported even for unknown ids.
    pub async fn view_receipt_text(
        &self,
        receipt_id: &str,
        line_width: Option<usize>,
    ) -> ApiResult<Option<String>> {
        let width = tally_core::render::validate_line_width(
            line_width.unwrap_or(self.default_width),
        )?;

        match self.get_receipt_public(receipt_id).await? {
            Some(receipt) => Ok(Some(self.render_receipt_text(&receipt, width)?)),
            None => Ok(None),
        }
    }
}

fn build_query(
    user_id: UserId,
    params: &ReceiptFilterParams,
    skip: Option<i64>,
    limit: Option<i64>,
) -> ApiResult<ReceiptQuery> {
    validate_user_id(user_id).map_err(|e| ApiError::validation(e.to_string()))?;
    let filter = ReceiptFilter::from_params(params)?;
    let page = Page::from_options(skip, limit)?;
    Ok(ReceiptQuery::new(user_id, filter, page))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use chrono::{Duration, Utc};
    use tally_core::{Money, PaymentType, Quantity};
    use tally_db::DbConfig;

    async fn test_service() -> ReceiptService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        ReceiptService::new(db)
    }

    fn groceries() -> Vec<LineItemRequest> {
        vec![
            LineItemRequest::new("Bread", Money::from_cents(2000), Quantity::from_units(2)),
            LineItemRequest::new("Milk", Money::from_cents(3050), Quantity::from_units(1)),
        ]
    }

    fn cash(cents: i64) -> PaymentRequest {
        PaymentRequest::new(PaymentType::Cash, Money::from_cents(cents))
    }

    #[tokio::test]
    async fn test_create_and_get_receipt() {
        let service = test_service().await;
        let owner = service.register_user("borys").await.unwrap();
        let other = service.register_user("olena").await.unwrap();

        let receipt = service
            .create_receipt(owner.id, &groceries(), &cash(10000))
            .await
            .unwrap();
        assert_eq!(receipt.total().to_string(), "70.50");
        assert_eq!(receipt.rest().to_string(), "29.50");

        let fetched = service
            .get_receipt(receipt.id(), owner.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched, receipt);

        assert!(service
            .get_receipt(receipt.id(), other.id)
            .await
            .unwrap()
            .is_none());

        let public = service.get_receipt_public(receipt.id()).await.unwrap();
        assert_eq!(public, Some(receipt));
    }

    #[tokio::test]
    async fn test_register_user_rejects_bad_username() {
        let service = test_service().await;

        let err = service.register_user("has space").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.http_status(), 400);

        service.register_user("borys").await.unwrap();
        let err = service.register_user("borys").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_get_receipt_accepts_any_uuid_spelling() {
        let service = test_service().await;
        let owner = service.register_user("borys").await.unwrap();
        let receipt = service
            .create_receipt(owner.id, &groceries(), &cash(10000))
            .await
            .unwrap();

        let upper = receipt.id().to_uppercase();
        let simple = receipt.id().replace('-', "");
        let braced = format!("{{{}}}", receipt.id());

        for spelling in [upper, simple, braced] {
            let found = service.get_receipt_public(&spelling).await.unwrap();
            assert_eq!(found.as_ref().map(Receipt::id), Some(receipt.id()));

            let owned = service.get_receipt(&spelling, owner.id).await.unwrap();
            assert!(owned.is_some());
        }
    }

    #[tokio::test]
    async fn test_insufficient_payment_stores_nothing() {
        let service = test_service().await;
        let owner = service.register_user("borys").await.unwrap();

        let err = service
            .create_receipt(owner.id, &groceries(), &cash(5000))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientPayment);

        let stored = service.database().receipts().count_for_user(owner.id).await.unwrap();
        assert_eq!(stored, 0);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let service = test_service().await;
        let owner = service.register_user("borys").await.unwrap();

        let err = service
            .create_receipt(owner.id, &[], &cash(100))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let card = PaymentRequest {
            payment_type: "card".to_string(),
            amount: Money::from_cents(10000),
        };
        let err = service
            .create_receipt(owner.id, &groceries(), &card)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = service
            .create_receipt(owner.id + 1000, &groceries(), &cash(10000))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_missing_and_malformed_ids_are_absent() {
        let service = test_service().await;

        assert!(service.get_receipt_public("not-a-uuid").await.unwrap().is_none());
        assert!(service
            .get_receipt_public("6f1c2a4e-8d0b-4c7a-9f39-2b5d7e1a0c44")
            .await
            .unwrap()
            .is_none());
        assert!(service.view_receipt_text("", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_receipts_with_filters() {
        let service = test_service().await;
        let owner = service.register_user("borys").await.unwrap();
        let repo = service.database().receipts();
        let now = Utc::now();

        for (age_days, cents, payment_type) in [
            (10, 1000, PaymentType::Cash),
            (5, 5000, PaymentType::Cashless),
            (1, 20000, PaymentType::Cash),
        ] {
            let items = vec![LineItemRequest::new(
                "Item",
                Money::from_cents(cents),
                Quantity::from_units(1),
            )];
            let payment = PaymentRequest::new(payment_type, Money::from_cents(cents));
            let receipt = tally_core::create_receipt(owner.id, &items, &payment).unwrap();
            repo.save_at(receipt, now - Duration::days(age_days))
                .await
                .unwrap();
        }

        let all = service
            .list_receipts(owner.id, &ReceiptFilterParams::default(), None, None)
            .await
            .unwrap();
        let totals: Vec<i64> = all.iter().map(|r| r.total().cents()).collect();
        assert_eq!(totals, vec![20000, 5000, 1000]);

        let params = ReceiptFilterParams {
            min_total: Some("50.00".to_string()),
            payment_type: Some("cash".to_string()),
            ..Default::default()
        };
        let filtered = service
            .list_receipts(owner.id, &params, None, None)
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].total().cents(), 20000);

        let paged = service
            .list_receipts(owner.id, &ReceiptFilterParams::default(), Some(1), Some(1))
            .await
            .unwrap();
        assert_eq!(paged.len(), 1);
        assert_eq!(paged[0].total().cents(), 5000);
    }

    #[tokio::test]
    async fn test_list_rejects_invalid_filter() {
        let service = test_service().await;
        let owner = service.register_user("borys").await.unwrap();

        let bad_type = ReceiptFilterParams {
            payment_type: Some("card".to_string()),
            ..Default::default()
        };
        let err = service
            .list_receipts(owner.id, &bad_type, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFilter);

        let inverted = ReceiptFilterParams {
            start_date: Some("2024-05-02".to_string()),
            end_date: Some("2024-05-01".to_string()),
            ..Default::default()
        };
        let err = service
            .list_receipts(owner.id, &inverted, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFilter);

        let err = service
            .list_receipts(owner.id, &ReceiptFilterParams::default(), None, Some(101))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFilter);
    }

    #[tokio::test]
    async fn test_view_receipt_text() {
        let service = test_service().await;
        let owner = service.register_user("borys").await.unwrap();
        let receipt = service
            .create_receipt(owner.id, &groceries(), &cash(10000))
            .await
            .unwrap();

        let text = service
            .view_receipt_text(receipt.id(), None)
            .await
            .unwrap()
            .unwrap();
        assert!(text.lines().all(|line| line.chars().count() == 32));
        assert!(text.contains("FOP Johnsoniuk Borys"));
        assert!(text.contains("Thank you for your purchase!"));
        assert_eq!(text, service.render_receipt_text(&receipt, 32).unwrap());

        let wide = service
            .view_receipt_text(receipt.id(), Some(48))
            .await
            .unwrap()
            .unwrap();
        assert!(wide.lines().all(|line| line.chars().count() == 48));

        let err = service
            .view_receipt_text(receipt.id(), Some(10))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidLineWidth);
    }
}
