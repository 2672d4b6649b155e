//! # Receipt Text Renderer
//!
//! Turns a stored receipt into a fixed-width plain-text document for a
//! screen or a thermal printer.
//!
//! ## Layout (width 32)
//! ```text
//!       FOP Johnsoniuk Borys          ← header, centered
//! ================================
//! 2 x 20.00                  40.00    ← "<qty> x <price>" vs subtotal
//! Bread                               ← name, padded or chunked
//! --------------------------------
//! 1 x 30.50                  30.50
//! Milk
//! --------------------------------
//! ================================
//! TOTAL                      70.50
//! Cash                      100.00
//! Change                     29.50
//! ================================
//!         01.05.2024 12:00            ← footer, centered
//!   Thank you for your purchase!
//! ```
//!
//! Every line is exactly `width` characters, except the last chunk of a
//! wrapped item name. Lines are joined with `\n`, no trailing newline.
//! Widths are counted in `char`s.

use chrono::{FixedOffset, Offset, Utc};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::receipt::{LineItem, Receipt};
use crate::{MAX_LINE_WIDTH, MIN_LINE_WIDTH};

/// Default merchant line.
pub const DEFAULT_MERCHANT_NAME: &str = "FOP Johnsoniuk Borys";

/// Default closing line.
pub const DEFAULT_THANK_YOU: &str = "Thank you for your purchase!";

const TIMESTAMP_FORMAT: &str = "%d.%m.%Y %H:%M";

// =============================================================================
// Configuration
// =============================================================================

/// Fixed texts and the time zone used by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderConfig {
    pub merchant_name: String,
    pub thank_you: String,
    /// Offset applied to `created_at` (stored in UTC) for the footer.
    pub utc_offset: FixedOffset,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            merchant_name: DEFAULT_MERCHANT_NAME.to_string(),
            thank_you: DEFAULT_THANK_YOU.to_string(),
            utc_offset: Utc.fix(),
        }
    }
}

// =============================================================================
// Renderer
// =============================================================================

/// Renders receipts with a fixed [`RenderConfig`].
#[derive(Debug, Clone, Default)]
pub struct ReceiptRenderer {
    config: RenderConfig,
}

impl ReceiptRenderer {
    pub fn new(config: RenderConfig) -> Self {
        ReceiptRenderer { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Renders `receipt` at `width` columns.
    ///
    /// ## Errors
    /// `InvalidLineWidth` unless `MIN_LINE_WIDTH < width < MAX_LINE_WIDTH`.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::{TimeZone, Utc};
    /// use tally_core::money::{Money, Quantity};
    /// use tally_core::render::ReceiptRenderer;
    /// use tally_core::{create_receipt, LineItemRequest, PaymentRequest, PaymentType};
    ///
    /// let items = vec![LineItemRequest::new("Tea", Money::from_cents(450), Quantity::from_units(1))];
    /// let payment = PaymentRequest::new(PaymentType::Cashless, Money::from_cents(450));
    /// let receipt = create_receipt(1, &items, &payment)
    ///     .unwrap()
    ///     .into_persisted("r-1".into(), Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap());
    ///
    /// let text = ReceiptRenderer::default().render(&receipt, 24).unwrap();
    /// assert!(text.lines().all(|line| line.chars().count() == 24));
    /// ```
    pub fn render(&self, receipt: &Receipt, width: usize) -> CoreResult<String> {
        let width = validate_line_width(width)?;
        let mut lines: Vec<String> = Vec::new();

        // Header
        lines.extend(centered(&self.config.merchant_name, width));
        lines.push(rule('=', width));

        // Body
        for item in receipt.line_items() {
            lines.extend(item_lines(item, width));
        }

        // Totals
        lines.push(rule('=', width));
        lines.extend(label_and_amount("TOTAL", receipt.total(), width));
        let payment = receipt.payment();
        lines.extend(label_and_amount(
            payment.payment_type.display_name(),
            payment.amount,
            width,
        ));
        lines.extend(label_and_amount("Change", receipt.rest(), width));
        lines.push(rule('=', width));

        // Footer
        let local = receipt.created_at().with_timezone(&self.config.utc_offset);
        lines.extend(centered(&local.format(TIMESTAMP_FORMAT).to_string(), width));
        lines.extend(centered(&self.config.thank_you, width));

        Ok(lines.join("\n"))
    }
}

/// Renders with the default [`RenderConfig`].
pub fn render_receipt_text(receipt: &Receipt, width: usize) -> CoreResult<String> {
    ReceiptRenderer::default().render(receipt, width)
}

/// Checks the exclusive `MIN_LINE_WIDTH < width < MAX_LINE_WIDTH` range.
pub fn validate_line_width(width: usize) -> CoreResult<usize> {
    if width <= MIN_LINE_WIDTH || width >= MAX_LINE_WIDTH {
        return Err(CoreError::InvalidLineWidth {
            width,
            min: MIN_LINE_WIDTH,
            max: MAX_LINE_WIDTH,
        });
    }
    Ok(width)
}

// =============================================================================
// Layout Helpers
// =============================================================================

fn item_lines(item: &LineItem, width: usize) -> Vec<String> {
    let mut lines = Vec::new();

    let quantity_price = format!("{} x {}", item.quantity(), item.unit_price());
    lines.extend(two_columns(
        &quantity_price,
        &item.subtotal().to_string(),
        width,
    ));

    if char_len(item.name()) > width {
        // Last chunk keeps its natural length.
        lines.extend(chunks(item.name(), width));
    } else {
        lines.push(format!("{:<width$}", item.name(), width = width));
    }

    lines.push(rule('-', width));
    lines
}

fn label_and_amount(label: &str, amount: Money, width: usize) -> Vec<String> {
    two_columns(label, &amount.to_string(), width)
}

/// Left text against right text, filling exactly `width`.
///
/// When both do not fit on one line, the left text goes on its own
/// line(s) and the right text is right-aligned below it.
fn two_columns(left: &str, right: &str, width: usize) -> Vec<String> {
    let right_len = char_len(right);

    if char_len(left) + right_len <= width {
        let left_width = width - right_len;
        return vec![format!("{:<left_width$}{}", left, right, left_width = left_width)];
    }

    chunks(left, width)
        .into_iter()
        .map(|chunk| format!("{:<width$}", chunk, width = width))
        .chain(
            chunks(right, width)
                .into_iter()
                .map(|chunk| format!("{:>width$}", chunk, width = width)),
        )
        .collect()
}

/// Centers `text`; the odd spare column goes to the right. Text wider than
/// `width` is chunked and each chunk centered.
fn centered(text: &str, width: usize) -> Vec<String> {
    chunks(text, width)
        .into_iter()
        .map(|chunk| format!("{:^width$}", chunk, width = width))
        .collect()
}

fn rule(fill: char, width: usize) -> String {
    std::iter::repeat(fill).take(width).collect()
}

/// Splits into consecutive pieces of `width` chars; empty text gives one
/// empty piece.
fn chunks(text: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(width)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Quantity;
    use crate::receipt::create_receipt;
    use crate::types::{LineItemRequest, PaymentRequest, PaymentType};
    use chrono::TimeZone;

    fn receipt_with(items: Vec<LineItemRequest>, payment: PaymentRequest) -> Receipt {
        create_receipt(1, &items, &payment)
            .unwrap()
            .into_persisted(
                "r-1".to_string(),
                Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            )
    }

    fn bread_and_milk() -> Receipt {
        receipt_with(
            vec![
                LineItemRequest::new("Bread", Money::from_cents(2000), Quantity::from_units(2)),
                LineItemRequest::new("Milk", Money::from_cents(3050), Quantity::from_units(1)),
            ],
            PaymentRequest::new(PaymentType::Cash, Money::from_cents(10000)),
        )
    }

    fn pad(left: usize, text: &str, right: usize) -> String {
        format!("{}{}{}", " ".repeat(left), text, " ".repeat(right))
    }

    #[test]
    fn test_render_width_32() {
        let text = render_receipt_text(&bread_and_milk(), 32).unwrap();

        let expected = vec![
            pad(6, "FOP Johnsoniuk Borys", 6),
            "=".repeat(32),
            format!("2 x 20.00{}40.00", " ".repeat(18)),
            pad(0, "Bread", 27),
            "-".repeat(32),
            format!("1 x 30.50{}30.50", " ".repeat(18)),
            pad(0, "Milk", 28),
            "-".repeat(32),
            "=".repeat(32),
            format!("TOTAL{}70.50", " ".repeat(22)),
            format!("Cash{}100.00", " ".repeat(22)),
            format!("Change{}29.50", " ".repeat(21)),
            "=".repeat(32),
            pad(8, "01.05.2024 12:00", 8),
            pad(2, "Thank you for your purchase!", 2),
        ]
        .join("\n");

        assert_eq!(text, expected);
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn test_every_line_has_exact_width() {
        let receipt = bread_and_milk();
        for width in [11, 20, 32, 48, 99] {
            let text = render_receipt_text(&receipt, width).unwrap();
            for line in text.lines() {
                assert_eq!(line.chars().count(), width, "line {:?} at width {}", line, width);
            }
        }
    }

    #[test]
    fn test_render_is_idempotent() {
        let receipt = bread_and_milk();
        let renderer = ReceiptRenderer::default();
        assert_eq!(
            renderer.render(&receipt, 40).unwrap(),
            renderer.render(&receipt, 40).unwrap()
        );
    }

    #[test]
    fn test_long_name_is_chunked() {
        let name = "Organic stone-ground whole wheat sourdough loaf";
        let receipt = receipt_with(
            vec![LineItemRequest::new(name, Money::from_cents(550), Quantity::from_hundredths(150))],
            PaymentRequest::new(PaymentType::Cashless, Money::from_cents(825)),
        );
        let text = render_receipt_text(&receipt, 20).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[2], format!("1.5 x 5.50{}8.25", " ".repeat(6)));
        assert_eq!(lines[3], "Organic stone-ground");
        assert_eq!(lines[4], " whole wheat sourdou");
        assert_eq!(lines[5], "gh loaf");
        assert_eq!(lines[6], "-".repeat(20));
        assert!(text.contains(&format!("Cashless{}8.25", " ".repeat(8))));
    }

    #[test]
    fn test_grouped_amounts() {
        let receipt = receipt_with(
            vec![LineItemRequest::new("Laptop", Money::from_cents(123_450), Quantity::from_units(1))],
            PaymentRequest::new(PaymentType::Cash, Money::from_cents(130_000)),
        );
        let text = render_receipt_text(&receipt, 32).unwrap();
        assert!(text.contains(&format!("TOTAL{}1,234.50", " ".repeat(19))));
        assert!(text.contains(&format!("Change{}65.50", " ".repeat(21))));
    }

    #[test]
    fn test_overflowing_columns_wrap() {
        let lines = two_columns("123456789 x 1,000.00", "99,999.99", 11);
        assert_eq!(lines, vec!["123456789 x", " 1,000.00  ", "  99,999.99"]);
    }

    #[test]
    fn test_columns_touch_when_exactly_full() {
        assert_eq!(two_columns("Change", "29.50", 11), vec!["Change29.50"]);
        assert_eq!(two_columns("Change", "29.50", 12), vec!["Change 29.50"]);
        assert_eq!(
            two_columns("Change", "129.50", 11),
            vec!["Change     ", "     129.50"]
        );
    }

    #[test]
    fn test_config_texts_and_offset() {
        let config = RenderConfig {
            merchant_name: "Corner Shop".to_string(),
            thank_you: "Bye".to_string(),
            utc_offset: FixedOffset::east_opt(3 * 3600).unwrap(),
        };
        let text = ReceiptRenderer::new(config)
            .render(&bread_and_milk(), 32)
            .unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0].trim(), "Corner Shop");
        assert_eq!(lines[lines.len() - 2].trim(), "01.05.2024 15:00");
        assert_eq!(lines[lines.len() - 1].trim(), "Bye");
    }

    #[test]
    fn test_invalid_widths() {
        let receipt = bread_and_milk();
        for width in [0, 5, 10, 100, 250] {
            assert!(matches!(
                render_receipt_text(&receipt, width),
                Err(CoreError::InvalidLineWidth { .. })
            ));
        }
        assert!(validate_line_width(11).is_ok());
        assert!(validate_line_width(99).is_ok());
    }
}
