//! # Change Calculator
//!
//! Breaks an amount into coins, largest first.
//!
//! ## Greedy Descent
//! ```text
//! amount = 75
//!   100 → 0 (skip)
//!    50 → 1   remaining 25
//!    20 → 1   remaining 5
//!    10 → 0 (skip)
//!     5 → 1   remaining 0
//!
//! result: [50 x 1, 20 x 1, 5 x 1]
//! ```
//!
//! Greedy is optimal for {100, 50, 20, 10, 5}: the set is canonical, so the
//! breakdown always uses the fewest coins possible.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::coins::Coin;

/// One denomination in a breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinCount {
    pub coin: Coin,
    pub count: u64,
}

/// Coins returned to a buyer, ordered by descending denomination.
///
/// Only denominations actually returned are present, so an empty breakdown
/// means "no change".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeBreakdown(Vec<CoinCount>);

impl ChangeBreakdown {
    /// The "no change" breakdown.
    pub const fn empty() -> Self {
        ChangeBreakdown(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Count for a single coin (0 when the coin is not part of the change).
    pub fn count_of(&self, coin: Coin) -> u64 {
        self.0
            .iter()
            .find(|entry| entry.coin == coin)
            .map_or(0, |entry| entry.count)
    }

    /// Total number of coins handed out.
    pub fn coin_count(&self) -> u64 {
        self.0.iter().map(|entry| entry.count).sum()
    }

    /// Sum of the breakdown in cents.
    pub fn total(&self) -> i64 {
        self.0
            .iter()
            .map(|entry| entry.coin.cents() * entry.count as i64)
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CoinCount> {
        self.0.iter()
    }

    /// `(denomination, count)` pairs, descending by denomination.
    pub fn to_pairs(&self) -> Vec<(i64, u64)> {
        self.0
            .iter()
            .map(|entry| (entry.coin.cents(), entry.count))
            .collect()
    }
}

impl fmt::Display for ChangeBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("No change");
        }

        for (i, entry) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} x {}", entry.count, entry.coin)?;
        }
        Ok(())
    }
}

/// Breaks `amount` cents into the fewest coins.
///
/// ## Panics
/// If `amount` is negative or not a multiple of 5. Callers only ever pass
/// balances built from whole coins, so either case is a bug, not bad input.
///
/// ## Example
/// ```rust
/// use vend_core::change::breakdown;
///
/// assert_eq!(breakdown(0).to_string(), "No change");
/// assert_eq!(breakdown(185).to_pairs(), vec![(100, 1), (50, 1), (20, 1), (10, 1), (5, 1)]);
/// ```
pub fn breakdown(amount: i64) -> ChangeBreakdown {
    assert!(amount >= 0, "cannot break down a negative amount: {amount}");
    assert!(
        amount % Coin::Five.cents() == 0,
        "amount {amount} is not representable in coins"
    );

    let mut remaining = amount;
    let mut coins = Vec::new();

    for coin in Coin::descending() {
        let count = remaining / coin.cents();
        if count > 0 {
            coins.push(CoinCount {
                coin,
                count: count as u64,
            });
            remaining -= coin.cents() * count;
        }
    }

    debug_assert_eq!(remaining, 0);
    ChangeBreakdown(coins)
}
