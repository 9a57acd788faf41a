//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The legacy service stored Decimal but summed JavaScript numbers:      │
//! │    subtotal += price * quantity   ← float accumulation                  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (kobo for NGN)                       │
//! │    ₦1,500.00 = 150000 kobo                                              │
//! │    subtotal + delivery_fee == total, exactly, every time                │
//! │                                                                         │
//! │  Major units (naira) only appear at the display boundary.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shepherd_core::money::Money;
//!
//! let price = Money::from_minor(250_000); // ₦2,500.00
//! let line = price.multiply_quantity(2);
//! assert_eq!(line.minor(), 500_000);
//! assert_eq!(line.to_string(), "₦5000.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

/// Minor units per major unit (100 kobo = 1 naira).
pub const MINOR_PER_MAJOR: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// Signed so that refunds and corrections can be represented, although the
/// order pipeline itself only produces non-negative amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use shepherd_core::money::Money;
    ///
    /// let fee = Money::from_minor(150_000);
    /// assert_eq!(fee.minor(), 150_000);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from whole major units.
    ///
    /// ## Example
    /// ```rust
    /// use shepherd_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(1500).minor(), 150_000);
    /// ```
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * MINOR_PER_MAJOR)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the whole major-unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / MINOR_PER_MAJOR
    }

    /// Returns the minor-unit remainder (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % MINOR_PER_MAJOR).abs()
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use shepherd_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(1000);
    /// assert_eq!(unit_price.multiply_quantity(2).minor(), 2000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Checked multiplication, `None` on overflow.
    ///
    /// Line totals are computed with this so an absurd quantity cannot wrap
    /// around into a negative subtotal.
    #[inline]
    pub fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Checked addition, `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly rendering in naira. Clients format for their own locale.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₦{}.{:02}", sign, self.major().abs(), self.minor_part())
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

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor_and_parts() {
        let money = Money::from_minor(150_050);
        assert_eq!(money.minor(), 150_050);
        assert_eq!(money.major(), 1500);
        assert_eq!(money.minor_part(), 50);
    }

    #[test]
    fn test_from_major() {
        assert_eq!(Money::from_major(100).minor(), 10_000);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_minor(150_000).to_string(), "₦1500.00");
        assert_eq!(Money::from_minor(-550).to_string(), "-₦5.50");
        assert_eq!(Money::zero().to_string(), "₦0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!((a * 3).minor(), 3000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.minor(), 2000);
    }

    #[test]
    fn test_checked_multiply_overflow() {
        let price = Money::from_minor(i64::MAX / 2);
        assert!(price.checked_multiply_quantity(3).is_none());
        assert_eq!(
            Money::from_minor(1000).checked_multiply_quantity(2),
            Some(Money::from_minor(2000))
        );
    }
}
