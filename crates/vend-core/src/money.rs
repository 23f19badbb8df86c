//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every amount in the machine is a whole number of cents.               │
//! │                                                                         │
//! │  Coins:    5, 10, 20, 50, 100                                          │
//! │  Prices:   positive cents                                              │
//! │  Balance:  sum of accepted coins minus what was spent or returned      │
//! │                                                                         │
//! │  No floats anywhere, so a balance can always be paid back exactly.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vend_core::money::Money;
//!
//! let cost = Money::from_cents(50);
//! let line = cost.checked_mul_quantity(3).unwrap();
//! assert_eq!(line.cents(), 150);
//! assert_eq!(line.to_string(), "150 cents");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// A monetary value in cents.
///
/// Balances and costs are stored as plain `i64` cents on the entities;
/// `Money` is the arithmetic view over them. The checked operations are
/// what the purchase path uses, the operator impls are for tests and
/// totals that are already known to be in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

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

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Subtracts two amounts, `None` on overflow.
    #[inline]
    pub const fn checked_sub(self, other: Money) -> Option<Money> {
        match self.0.checked_sub(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Unit cost times quantity, `None` on overflow.
    ///
    /// ```text
    /// Product: Cola 50 cents
    /// Quantity: 3
    ///      │
    ///      ▼
    /// checked_mul_quantity(3) → 150 cents
    /// ```
    #[inline]
    pub const fn checked_mul_quantity(self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cents", self.0)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(150).to_string(), "150 cents");
        assert_eq!(Money::zero().to_string(), "0 cents");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(100);
        let b = Money::from_cents(30);

        assert_eq!((a + b).cents(), 130);
        assert_eq!((a - b).cents(), 70);

        let mut c = a;
        c += b;
        c -= Money::from_cents(5);
        assert_eq!(c.cents(), 125);
    }

    #[test]
    fn test_checked_operations() {
        let cost = Money::from_cents(50);
        assert_eq!(cost.checked_mul_quantity(2), Some(Money::from_cents(100)));
        assert_eq!(Money::from_cents(i64::MAX).checked_mul_quantity(2), None);
        assert_eq!(Money::from_cents(i64::MAX).checked_add(cost), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(cost), None);
        assert!(Money::from_cents(25).checked_sub(cost).unwrap().is_negative());
    }

    #[test]
    fn test_zero() {
        assert!(Money::zero().is_zero());
        assert!(Money::default().is_zero());
        assert!(!Money::from_cents(5).is_zero());
    }
}
