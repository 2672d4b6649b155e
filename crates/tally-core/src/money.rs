//! # Money Module
//!
//! Provides the `Money` and `Quantity` types for exact fixed-point values.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Scaled Integers (scale = 2)                              │
//! │    Money     "30.50" → 3050 cents                                       │
//! │    Quantity  "1.5"   → 150 hundredths                                   │
//! │                                                                         │
//! │    30.50 × 1.5 = 3050 × 150 / 100 = 4575 cents = 45.75                  │
//! │    Any digits below the 2nd decimal are rounded half-up, exactly once.  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::{Money, Quantity};
//!
//! let price: Money = "20.00".parse().unwrap();
//! let qty: Quantity = "2".parse().unwrap();
//!
//! let subtotal = price.checked_mul_quantity(qty).unwrap();
//! assert_eq!(subtotal.cents(), 4000);
//! assert_eq!(subtotal.to_string(), "40.00");
//!
//! // NEVER do this:
//! // let bad = Money::from_float(10.99); // NO SUCH METHOD EXISTS!
//! ```

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;

use crate::error::CoreError;

/// Number of fractional digits carried by both `Money` and `Quantity`.
pub const SCALE: u32 = 2;

const SCALE_FACTOR: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: differences can go below zero before clamping
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serde as decimal string**: `"70.50"` on the wire, never a JSON float
///
/// ## Where Money is Used
/// ```text
/// LineItemRequest.unit_price ──► LineItem.subtotal ──► Receipt.total
///                                                          │
/// PaymentRequest.amount ──────────────────────────────► Receipt.rest
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // 10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Parses a decimal string, rejecting negative values.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::parse_non_negative("100").unwrap().cents(), 10000);
    /// assert!(Money::parse_non_negative("-1.00").is_err());
    /// ```
    pub fn parse_non_negative(input: &str) -> Result<Money, CoreError> {
        let money: Money = input.parse()?;
        if money.is_negative() {
            return Err(CoreError::InvalidMoneyFormat {
                input: input.to_string(),
                reason: "must not be negative".to_string(),
            });
        }
        Ok(money)
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// Both operands carry two decimals, so the exact product carries four.
    /// The result is rounded back to cents once, half away from zero (which is
    /// round-half-up for the non-negative prices a receipt accepts).
    ///
    /// Returns `None` if the result does not fit in an `i64`.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::{Money, Quantity};
    ///
    /// let price = Money::from_cents(333);           // 3.33
    /// let qty = Quantity::from_hundredths(150);     // 1.5
    /// // 3.33 × 1.5 = 4.995 → 5.00
    /// assert_eq!(price.checked_mul_quantity(qty).unwrap().cents(), 500);
    /// ```
    pub fn checked_mul_quantity(&self, qty: Quantity) -> Option<Money> {
        let exact = self.0 as i128 * qty.hundredths() as i128;
        let half = SCALE_FACTOR as i128 / 2;
        let rounded = if exact >= 0 {
            (exact + half) / SCALE_FACTOR as i128
        } else {
            -((-exact + half) / SCALE_FACTOR as i128)
        };
        i64::try_from(rounded).ok().map(Money)
    }

    /// Checked addition, `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Subtracts `other`, clamping the result at zero.
    ///
    /// This is the change calculation: `max(0, paid - total)`.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let paid = Money::from_cents(10000);
    /// assert_eq!(paid.sub_non_negative(Money::from_cents(7050)).cents(), 2950);
    /// assert_eq!(paid.sub_non_negative(Money::from_cents(12000)).cents(), 0);
    /// ```
    #[inline]
    pub fn sub_non_negative(&self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0).max(0))
    }

    /// Plain decimal form without grouping, e.g. `1234.50`.
    ///
    /// Used for serialization; [`fmt::Display`] adds thousands separators.
    pub fn to_plain_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!(
            "{}{}.{:02}",
            sign,
            abs / SCALE_FACTOR as u64,
            abs % SCALE_FACTOR as u64
        )
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Thousands-grouped, two-decimal display: `1,234.50`, `20.00`, `-5.50`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let major = group_thousands(abs / SCALE_FACTOR as u64);
        write!(f, "{}{}.{:02}", sign, major, abs % SCALE_FACTOR as u64)
    }
}

impl FromStr for Money {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_scaled(s)
            .map(Money)
            .map_err(|reason| CoreError::InvalidMoneyFormat {
                input: s.to_string(),
                reason: reason.to_string(),
            })
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Quantity Type
// =============================================================================

/// A purchased quantity with two fractional digits (e.g. `1.5` kg).
///
/// Stored as hundredths: `Quantity::from_hundredths(150)` is `1.5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quantity(i64);

impl Quantity {
    /// Creates a quantity from hundredths of a unit.
    #[inline]
    pub const fn from_hundredths(hundredths: i64) -> Self {
        Quantity(hundredths)
    }

    /// Creates a quantity of whole units.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Quantity;
    ///
    /// assert_eq!(Quantity::from_units(2).hundredths(), 200);
    /// ```
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * SCALE_FACTOR)
    }

    #[inline]
    pub const fn hundredths(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Plain decimal form with both fractional digits, e.g. `2.00`.
    pub fn to_plain_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!(
            "{}{}.{:02}",
            sign,
            abs / SCALE_FACTOR as u64,
            abs % SCALE_FACTOR as u64
        )
    }
}

/// Displays without trailing zeros: `2`, `1.5`, `0.25`.
impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / SCALE_FACTOR as u64;
        let frac = abs % SCALE_FACTOR as u64;

        if frac == 0 {
            write!(f, "{}{}", sign, whole)
        } else if frac % 10 == 0 {
            write!(f, "{}{}.{}", sign, whole, frac / 10)
        } else {
            write!(f, "{}{}.{:02}", sign, whole, frac)
        }
    }
}

impl FromStr for Quantity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_scaled(s)
            .map(Quantity)
            .map_err(|reason| CoreError::Validation(crate::ValidationError::InvalidFormat {
                field: "quantity".to_string(),
                reason: format!("'{}': {}", s, reason),
            }))
    }
}

// =============================================================================
// Parsing & Formatting Helpers
// =============================================================================

/// Parses `[+-]digits[.digits]` into a value scaled by 100.
///
/// Rejects empty input, non-digit characters, more than two fractional
/// digits, and values that overflow `i64`.
fn parse_scaled(input: &str) -> Result<i64, &'static str> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("empty value");
    }

    let (negative, rest) = match trimmed.as_bytes()[0] {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let (major_str, frac_str) = match rest.split_once('.') {
        Some((major, frac)) => (major, frac),
        None => (rest, ""),
    };

    if major_str.is_empty() && frac_str.is_empty() {
        return Err("not a number");
    }
    if !major_str.chars().all(|c| c.is_ascii_digit())
        || !frac_str.chars().all(|c| c.is_ascii_digit())
    {
        return Err("not a number");
    }
    if frac_str.len() > SCALE as usize {
        return Err("more than two decimal places");
    }

    let major: i64 = if major_str.is_empty() {
        0
    } else {
        major_str.parse().map_err(|_| "value too large")?
    };
    let mut frac: i64 = if frac_str.is_empty() {
        0
    } else {
        frac_str.parse().map_err(|_| "not a number")?
    };
    if frac_str.len() == 1 {
        frac *= 10;
    }

    let scaled = major
        .checked_mul(SCALE_FACTOR)
        .and_then(|v| v.checked_add(frac))
        .ok_or("value too large")?;

    Ok(if negative { -scaled } else { scaled })
}

/// Inserts `,` between groups of three digits.
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// =============================================================================
// Serde
// =============================================================================
// Both types travel as decimal strings. Integers are accepted on input
// (`"amount": 100`), floats are not: a JSON float has already lost exactness
// by the time it reaches us.

trait Scaled: Sized + FromStr<Err = CoreError> {
    const EXPECTING: &'static str;
    fn from_scaled(value: i64) -> Self;
}

impl Scaled for Money {
    const EXPECTING: &'static str = "a decimal string with at most two fractional digits";

    fn from_scaled(value: i64) -> Self {
        Money(value)
    }
}

impl Scaled for Quantity {
    const EXPECTING: &'static str = "a decimal quantity string with at most two fractional digits";

    fn from_scaled(value: i64) -> Self {
        Quantity(value)
    }
}

struct ScaledVisitor<T>(PhantomData<T>);

impl<'de, T: Scaled> Visitor<'de> for ScaledVisitor<T> {
    type Value = T;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(T::EXPECTING)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<T, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<T, E> {
        v.checked_mul(SCALE_FACTOR)
            .map(T::from_scaled)
            .ok_or_else(|| E::custom("value too large"))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<T, E> {
        i64::try_from(v)
            .ok()
            .and_then(|v| v.checked_mul(SCALE_FACTOR))
            .map(T::from_scaled)
            .ok_or_else(|| E::custom("value too large"))
    }

    fn visit_f64<E: de::Error>(self, _v: f64) -> Result<T, E> {
        Err(E::custom(
            "floating point numbers are not accepted, send the value as a string",
        ))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_plain_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScaledVisitor(PhantomData))
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_plain_string())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScaledVisitor(PhantomData))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
