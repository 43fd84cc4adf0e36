//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  Every price, order total, sale total and profit in Storehold is an    │
//! │  i64 in the smallest currency unit. A 10% discount on 18000 is 1800,   │
//! │  never 1799.9999.                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storehold_core::money::Money;
//!
//! let price = Money::from_minor(18000);
//! let line = price * 2;
//! assert_eq!(line.minor(), 36000);
//! assert_eq!(price.percentage(10).minor(), 1800);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: profit can be negative when an item sells below cost
/// - **Single field tuple struct**: zero-cost abstraction over i64
///
/// ## Where Money is Used
/// ```text
/// Product.selling_price ──► effective_price ──► OrderItem.price_at_order
///                                                      │
/// Product.cost_price ───────────────────────────┐      ▼
///                                               └─► SaleItem profit
///                                                      │
///                                                      ▼
///                                               Sale.total_amount, Sale.profit
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from the smallest currency unit.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in the smallest currency unit.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Major unit portion (truncated toward zero).
    #[inline]
    const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Minor unit portion (always 0-99).
    #[inline]
    const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Clamps negative values to zero.
    ///
    /// Discounted prices bottom out at zero; a fixed discount larger than the
    /// price never produces a negative price.
    #[inline]
    pub const fn floor_zero(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Returns `percent`% of this amount, rounded half away from zero.
    ///
    /// ## Implementation
    /// `(amount * percent ± 50) / 100` in i128, so the remainder is rounded
    /// instead of truncated and large amounts cannot overflow.
    ///
    /// ## Example
    /// ```rust
    /// use storehold_core::money::Money;
    ///
    /// assert_eq!(Money::from_minor(18000).percentage(10).minor(), 1800);
    /// // 999 × 15% = 149.85 → 150
    /// assert_eq!(Money::from_minor(999).percentage(15).minor(), 150);
    /// ```
    pub fn percentage(&self, percent: i64) -> Money {
        let scaled = (self.0 as i128) * (percent as i128);
        let rounded = if scaled >= 0 {
            (scaled + 50) / 100
        } else {
            (scaled - 50) / 100
        };
        Money(rounded as i64)
    }

    /// Multiplies by a line quantity.
    #[inline]
    pub const fn times(&self, quantity: i64) -> Money {
        Money(self.0 * quantity)
    }
}

// =============================================================================
// Operator Implementations
// =============================================================================

impl Add for Money {
    type Output = Money;

    #[inline]
    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    #[inline]
    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Mul<i64> for Money {
    type Output = Money;

    #[inline]
    fn mul(self, quantity: i64) -> Money {
        Money(self.0 * quantity)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl From<i64> for Money {
    fn from(minor: i64) -> Self {
        Money(minor)
    }
}

/// Display as `major.minor` without a currency symbol; receipts add the
/// symbol for the configured store.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
