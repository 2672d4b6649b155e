//! # Receipt Query Engine
//!
//! Filtering, ordering and pagination over a user's receipt history.
//!
//! ## Query Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        List Receipts Flow                               │
//! │                                                                         │
//! │  ReceiptFilterParams (raw strings from CLI / JSON)                     │
//! │       │  ReceiptFilter::from_params  → InvalidFilter on bad input      │
//! │       ▼                                                                 │
//! │  ReceiptQuery { user_id, filter, page }                                │
//! │       │                                                                 │
//! │       ├──► select(receipts)    in-memory form (this module)            │
//! │       └──► tally-db            SQL form, same semantics                │
//! │                                                                         │
//! │  Semantics                                                             │
//! │  ├── owner:        receipt.user_id == user_id                          │
//! │  ├── start_date:   created_at >= start      (inclusive)                │
//! │  ├── end_date:     created_at <= end        (inclusive)                │
//! │  ├── min_total:    total >= min_total       (inclusive)                │
//! │  ├── payment_type: payment.type == payment_type                        │
//! │  ├── order:        created_at DESC, id DESC                            │
//! │  └── window:       skip, then limit                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Absent filters impose no constraint. All present predicates are ANDed.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::receipt::Receipt;
use crate::types::{PaymentType, UserId};
use crate::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

// =============================================================================
// Filter
// =============================================================================

/// Validated receipt filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiptFilter {
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    min_total: Option<Money>,
    payment_type: Option<PaymentType>,
}

impl ReceiptFilter {
    /// Builds a filter, rejecting an inverted date range or a negative
    /// minimum total.
    pub fn new(
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
        min_total: Option<Money>,
        payment_type: Option<PaymentType>,
    ) -> CoreResult<Self> {
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end < start {
                return Err(CoreError::invalid_filter(format!(
                    "end date {} is before start date {}",
                    end.to_rfc3339(),
                    start.to_rfc3339()
                )));
            }
        }

        if let Some(min) = min_total {
            if min.is_negative() {
                return Err(CoreError::invalid_filter(format!(
                    "minimum total {} must not be negative",
                    min
                )));
            }
        }

        Ok(ReceiptFilter {
            start_date,
            end_date,
            min_total,
            payment_type,
        })
    }

    /// Parses and validates raw filter input.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::query::{ReceiptFilter, ReceiptFilterParams};
    ///
    /// let params = ReceiptFilterParams {
    ///     start_date: Some("2024-05-01".to_string()),
    ///     payment_type: Some("cash".to_string()),
    ///     ..Default::default()
    /// };
    /// assert!(ReceiptFilter::from_params(&params).is_ok());
    ///
    /// let bad = ReceiptFilterParams {
    ///     payment_type: Some("barter".to_string()),
    ///     ..Default::default()
    /// };
    /// assert!(ReceiptFilter::from_params(&bad).is_err());
    /// ```
    pub fn from_params(params: &ReceiptFilterParams) -> CoreResult<Self> {
        let start_date = params
            .start_date
            .as_deref()
            .map(parse_start_bound)
            .transpose()?;
        let end_date = params
            .end_date
            .as_deref()
            .map(parse_end_bound)
            .transpose()?;

        let min_total = params
            .min_total
            .as_deref()
            .map(|raw| {
                raw.parse::<Money>().map_err(|e| {
                    CoreError::invalid_filter(format!("minimum total: {}", e))
                })
            })
            .transpose()?;

        let payment_type = params
            .payment_type
            .as_deref()
            .map(|raw| {
                raw.parse::<PaymentType>()
                    .map_err(|e| CoreError::invalid_filter(e.to_string()))
            })
            .transpose()?;

        ReceiptFilter::new(start_date, end_date, min_total, payment_type)
    }

    pub fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }

    pub fn min_total(&self) -> Option<Money> {
        self.min_total
    }

    pub fn payment_type(&self) -> Option<PaymentType> {
        self.payment_type
    }

    /// True when no predicate is set.
    pub fn is_empty(&self) -> bool {
        self == &ReceiptFilter::default()
    }

    /// Evaluates every present predicate against a receipt.
    pub fn matches(&self, receipt: &Receipt) -> bool {
        let created_at = receipt.created_at();

        self.start_date.map_or(true, |start| created_at >= start)
            && self.end_date.map_or(true, |end| created_at <= end)
            && self.min_total.map_or(true, |min| receipt.total() >= min)
            && self
                .payment_type
                .map_or(true, |t| receipt.payment().payment_type == t)
    }
}

/// Raw, unvalidated filter input as it arrives from a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptFilterParams {
    /// RFC 3339 timestamp or `YYYY-MM-DD` (start of that day, UTC).
    pub start_date: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD` (end of that day, UTC).
    pub end_date: Option<String>,
    /// Decimal string, e.g. `"50.00"`.
    pub min_total: Option<String>,
    /// `cash` or `cashless`.
    pub payment_type: Option<String>,
}

/// Parses a lower date bound. A bare date means the first instant of that
/// day in UTC.
pub fn parse_start_bound(raw: &str) -> CoreResult<DateTime<Utc>> {
    let start_of_day = NaiveTime::from_hms_opt(0, 0, 0)
        .ok_or_else(|| CoreError::invalid_filter("start of day is not representable"))?;
    parse_bound(raw, start_of_day)
}

/// Parses an upper date bound. A bare date covers the whole day, so
/// `2024-05-01` includes receipts created at 23:59 that day.
pub fn parse_end_bound(raw: &str) -> CoreResult<DateTime<Utc>> {
    let end_of_day = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
        .ok_or_else(|| CoreError::invalid_filter("end of day is not representable"))?;
    parse_bound(raw, end_of_day)
}

fn parse_bound(raw: &str, time_of_day: NaiveTime) -> CoreResult<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|date| date.and_time(time_of_day).and_utc())
        .map_err(|_| {
            CoreError::invalid_filter(format!(
                "'{}' is neither an RFC 3339 timestamp nor a YYYY-MM-DD date",
                raw
            ))
        })
}

// =============================================================================
// Pagination
// =============================================================================

/// A validated `skip`/`limit` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    skip: i64,
    limit: i64,
}

impl Page {
    /// Validates `skip >= 0` and `0 <= limit <= MAX_PAGE_LIMIT`.
    pub fn new(skip: i64, limit: i64) -> CoreResult<Self> {
        if skip < 0 {
            return Err(CoreError::invalid_filter(format!(
                "skip must not be negative, got {}",
                skip
            )));
        }
        if !(0..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(CoreError::invalid_filter(format!(
                "limit must be between 0 and {}, got {}",
                MAX_PAGE_LIMIT, limit
            )));
        }
        Ok(Page { skip, limit })
    }

    /// Fills absent values with `0` and [`DEFAULT_PAGE_LIMIT`].
    pub fn from_options(skip: Option<i64>, limit: Option<i64>) -> CoreResult<Self> {
        Page::new(skip.unwrap_or(0), limit.unwrap_or(DEFAULT_PAGE_LIMIT))
    }

    pub fn skip(&self) -> i64 {
        self.skip
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }
}

impl Default for Page {
    fn default() -> Self {
        Page {
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

// =============================================================================
// Query
// =============================================================================

/// One list request: whose receipts, which of them, and which window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptQuery {
    user_id: UserId,
    filter: ReceiptFilter,
    page: Page,
}

impl ReceiptQuery {
    pub fn new(user_id: UserId, filter: ReceiptFilter, page: Page) -> Self {
        ReceiptQuery {
            user_id,
            filter,
            page,
        }
    }

    /// All receipts of a user, default window.
    pub fn for_user(user_id: UserId) -> Self {
        ReceiptQuery::new(user_id, ReceiptFilter::default(), Page::default())
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn filter(&self) -> &ReceiptFilter {
        &self.filter
    }

    pub fn page(&self) -> Page {
        self.page
    }

    /// Ownership plus every filter predicate.
    pub fn matches(&self, receipt: &Receipt) -> bool {
        receipt.user_id() == self.user_id && self.filter.matches(receipt)
    }

    /// Applies the whole query to an in-memory collection.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::query::ReceiptQuery;
    ///
    /// let query = ReceiptQuery::for_user(1);
    /// assert!(query.select(Vec::new()).is_empty());
    /// ```
    pub fn select<I>(&self, receipts: I) -> Vec<Receipt>
    where
        I: IntoIterator<Item = Receipt>,
    {
        let mut matching: Vec<Receipt> = receipts
            .into_iter()
            .filter(|r| self.matches(r))
            .collect();
        matching.sort_by(newest_first);

        matching
            .into_iter()
            .skip(self.page.skip as usize)
            .take(self.page.limit as usize)
            .collect()
    }
}

/// List ordering: `created_at` descending, ties broken by `id` descending.
pub fn newest_first(a: &Receipt, b: &Receipt) -> Ordering {
    b.created_at()
        .cmp(&a.created_at())
        .then_with(|| b.id().cmp(a.id()))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Quantity;
    use crate::receipt::create_receipt;
    use crate::types::{LineItemRequest, PaymentRequest};
    use chrono::{Duration, TimeZone};

    fn receipt(
        id: &str,
        user_id: UserId,
        day: u32,
        price_cents: i64,
        payment_type: PaymentType,
    ) -> Receipt {
        let items = vec![LineItemRequest::new(
            "Coffee",
            Money::from_cents(price_cents),
            Quantity::from_units(1),
        )];
        let payment = PaymentRequest::new(payment_type, Money::from_cents(price_cents));
        create_receipt(user_id, &items, &payment)
            .unwrap()
            .into_persisted(
                id.to_string(),
                Utc.with_ymd_and_hms(2024, 5, day, 10, 0, 0).unwrap(),
            )
    }

    fn history() -> Vec<Receipt> {
        vec![
            receipt("a", 1, 1, 1000, PaymentType::Cash),
            receipt("b", 1, 2, 5000, PaymentType::Cashless),
            receipt("c", 1, 3, 7000, PaymentType::Cash),
            receipt("d", 1, 4, 200, PaymentType::Cashless),
            receipt("e", 1, 5, 9000, PaymentType::Cash),
            receipt("z", 2, 3, 9000, PaymentType::Cash),
        ]
    }

    fn ids(receipts: &[Receipt]) -> Vec<&str> {
        receipts.iter().map(Receipt::id).collect()
    }

    #[test]
    fn test_only_owner_receipts_newest_first() {
        let result = ReceiptQuery::for_user(1).select(history());
        assert_eq!(ids(&result), vec!["e", "d", "c", "b", "a"]);
    }

    #[test]
    fn test_ties_are_broken_by_id_descending() {
        let mut receipts = history();
        receipts.push(receipt("cc", 1, 3, 100, PaymentType::Cash));
        let result = ReceiptQuery::for_user(1).select(receipts);
        assert_eq!(ids(&result), vec!["e", "d", "cc", "c", "b", "a"]);
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let params = ReceiptFilterParams {
            start_date: Some("2024-05-02".to_string()),
            end_date: Some("2024-05-04".to_string()),
            ..Default::default()
        };
        let filter = ReceiptFilter::from_params(&params).unwrap();
        let query = ReceiptQuery::new(1, filter, Page::default());
        assert_eq!(ids(&query.select(history())), vec!["d", "c", "b"]);

        let exact = Utc.with_ymd_and_hms(2024, 5, 3, 10, 0, 0).unwrap();
        let filter = ReceiptFilter::new(Some(exact), Some(exact), None, None).unwrap();
        let query = ReceiptQuery::new(1, filter, Page::default());
        assert_eq!(ids(&query.select(history())), vec!["c"]);
    }

    #[test]
    fn test_filters_intersect() {
        let min_only = ReceiptFilter::new(None, None, Some(Money::from_cents(5000)), None).unwrap();
        let query = ReceiptQuery::new(1, min_only, Page::default());
        assert_eq!(ids(&query.select(history())), vec!["e", "c", "b"]);

        let combined = ReceiptFilter::new(
            None,
            Some(Utc.with_ymd_and_hms(2024, 5, 4, 0, 0, 0).unwrap()),
            Some(Money::from_cents(5000)),
            Some(PaymentType::Cash),
        )
        .unwrap();
        let query = ReceiptQuery::new(1, combined, Page::default());
        assert_eq!(ids(&query.select(history())), vec!["c"]);
    }

    #[test]
    fn test_pagination_is_stable_and_disjoint() {
        let all = ReceiptQuery::new(1, ReceiptFilter::default(), Page::new(0, 4).unwrap())
            .select(history());
        let first = ReceiptQuery::new(1, ReceiptFilter::default(), Page::new(0, 2).unwrap())
            .select(history());
        let second = ReceiptQuery::new(1, ReceiptFilter::default(), Page::new(2, 2).unwrap())
            .select(history());

        let mut joined = first.clone();
        joined.extend(second.clone());
        assert_eq!(joined, all);
        assert!(first.iter().all(|r| !second.contains(r)));

        let beyond = ReceiptQuery::new(1, ReceiptFilter::default(), Page::new(50, 10).unwrap())
            .select(history());
        assert!(beyond.is_empty());
    }

    #[test]
    fn test_invalid_filters() {
        let start = Utc.with_ymd_and_hms(2024, 5, 3, 0, 0, 0).unwrap();
        let inverted = ReceiptFilter::new(Some(start), Some(start - Duration::seconds(1)), None, None);
        assert!(matches!(inverted, Err(CoreError::InvalidFilter { .. })));

        let negative = ReceiptFilter::new(None, None, Some(Money::from_cents(-1)), None);
        assert!(matches!(negative, Err(CoreError::InvalidFilter { .. })));

        let unknown_type = ReceiptFilterParams {
            payment_type: Some("voucher".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            ReceiptFilter::from_params(&unknown_type),
            Err(CoreError::InvalidFilter { .. })
        ));

        let bad_date = ReceiptFilterParams {
            start_date: Some("yesterday".to_string()),
            ..Default::default()
        };
        assert!(ReceiptFilter::from_params(&bad_date).is_err());

        let bad_total = ReceiptFilterParams {
            min_total: Some("ten".to_string()),
            ..Default::default()
        };
        assert!(ReceiptFilter::from_params(&bad_total).is_err());
    }

    #[test]
    fn test_page_bounds() {
        assert!(Page::new(0, 0).is_ok());
        assert!(Page::new(0, MAX_PAGE_LIMIT).is_ok());
        assert!(Page::new(-1, 10).is_err());
        assert!(Page::new(0, MAX_PAGE_LIMIT + 1).is_err());
        assert!(Page::new(0, -1).is_err());

        let page = Page::from_options(None, None).unwrap();
        assert_eq!(page.skip(), 0);
        assert_eq!(page.limit(), DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn test_parse_bounds() {
        let start = parse_start_bound("2024-05-01").unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());

        let end = parse_end_bound("2024-05-01").unwrap();
        assert!(end > Utc.with_ymd_and_hms(2024, 5, 1, 23, 59, 59).unwrap());
        assert!(end < Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap());

        let ts = parse_start_bound("2024-05-01T12:00:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_empty_filter() {
        assert!(ReceiptFilter::default().is_empty());
        let filter = ReceiptFilter::new(None, None, None, Some(PaymentType::Cash)).unwrap();
        assert!(!filter.is_empty());
    }
}
