//! # Coin Policy
//!
//! The machine accepts exactly five coins. Every deposit is a single coin,
//! never a sum.
//!
//! ```text
//! ┌────────┬────────┬────────┬────────┬────────┐
//! │   5    │   10   │   20   │   50   │  100   │   cents, ascending
//! └────────┴────────┴────────┴────────┴────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, CoreResult};

/// An accepted coin.
///
/// The discriminant is the coin's value in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Coin {
    Five = 5,
    Ten = 10,
    Twenty = 20,
    Fifty = 50,
    Hundred = 100,
}

impl Coin {
    /// All accepted coins, ascending by value.
    pub const ALL: [Coin; 5] = [
        Coin::Five,
        Coin::Ten,
        Coin::Twenty,
        Coin::Fifty,
        Coin::Hundred,
    ];

    /// Value of the coin in cents.
    #[inline]
    pub const fn cents(self) -> i64 {
        self as i64
    }

    /// Iterates the coins from the largest to the smallest.
    pub fn descending() -> impl Iterator<Item = Coin> {
        Self::ALL.into_iter().rev()
    }
}

/// Validates a single deposited amount against the coin policy.
///
/// ## Example
/// ```rust
/// use vend_core::coins::{validate, Coin};
///
/// assert_eq!(validate(20).unwrap(), Coin::Twenty);
/// assert!(validate(25).is_err());
/// assert!(validate(150).is_err());
/// ```
pub fn validate(amount: i64) -> CoreResult<Coin> {
    Coin::try_from(amount)
}

impl TryFrom<i64> for Coin {
    type Error = CoreError;

    fn try_from(amount: i64) -> Result<Self, Self::Error> {
        Coin::ALL
            .into_iter()
            .find(|coin| coin.cents() == amount)
            .ok_or(CoreError::InvalidDenomination { amount })
    }
}

impl From<Coin> for i64 {
    fn from(coin: Coin) -> Self {
        coin.cents()
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} cents", self.cents())
    }
}
