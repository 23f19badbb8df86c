//! # Domain Types
//!
//! Core domain types used throughout the vending service.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Persistent                          Per request                        │
//! │  ┌─────────────────┐                 ┌─────────────────┐               │
//! │  │    Account      │                 │  PurchaseLine   │               │
//! │  │  ─────────────  │                 │  product_name   │               │
//! │  │  username       │                 │  quantity       │               │
//! │  │  roles          │                 └─────────────────┘               │
//! │  │  balance_cents  │                 ┌─────────────────┐               │
//! │  │  version        │                 │    Purchase     │               │
//! │  └─────────────────┘                 │  total, lines,  │               │
//! │  ┌─────────────────┐                 │  change         │               │
//! │  │    Product      │                 └─────────────────┘               │
//! │  │  ─────────────  │                 ┌─────────────────┐               │
//! │  │  name           │                 │  ResetOutcome   │               │
//! │  │  cost_cents     │                 │  NothingToReset │               │
//! │  │  amount_avail.  │                 │  Returned       │               │
//! │  │  seller         │                 └─────────────────┘               │
//! │  │  version        │                                                    │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Versions
//! `version` counts committed writes of a row. Stores only accept a write
//! whose `version` matches the stored one (compare-and-swap), so two
//! transactions that read the same row cannot both write it. A value of 0
//! means "never saved".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::change::ChangeBreakdown;
use crate::money::Money;

// =============================================================================
// Role
// =============================================================================

/// What an account is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Deposits coins, buys products, resets the balance.
    Buyer,
    /// Manages the products they own.
    Seller,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Seller => "seller",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Account
// =============================================================================

/// A user of the machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Unique identity the principal authenticates as.
    pub username: String,

    /// Roles, sorted and deduplicated.
    pub roles: Vec<Role>,

    /// Deposited coins not yet spent or returned, in cents. Never negative.
    pub balance_cents: i64,

    /// Optimistic concurrency counter.
    pub version: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_cents)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Changes to an existing account. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdate {
    /// New username. Products the account sells follow the rename.
    pub username: Option<String>,
    /// Replaces the whole role set.
    pub roles: Option<Vec<Role>>,
}

// =============================================================================
// Product
// =============================================================================

/// A product slot in the machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Unique display name, also the lookup key for purchases.
    pub name: String,

    /// Unit cost in cents. Always positive.
    pub cost_cents: i64,

    /// Units left. Never negative.
    pub amount_available: i64,

    /// Username of the owning seller.
    pub seller: String,

    /// Optimistic concurrency counter.
    pub version: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    /// Checks if `quantity` units can be served from the current stock.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.amount_available >= quantity
    }
}

/// Fields of a product a seller supplies on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub cost_cents: i64,
    pub amount_available: i64,
}

/// Changes to an existing product. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub cost_cents: Option<i64>,
    pub amount_available: Option<i64>,
}

// =============================================================================
// Purchase
// =============================================================================

/// One requested line of a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub product_name: String,
    pub quantity: i64,
}

impl PurchaseLine {
    pub fn new(product_name: impl Into<String>, quantity: i64) -> Self {
        PurchaseLine {
            product_name: product_name.into(),
            quantity,
        }
    }
}

/// A served purchase line with its computed cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchasedLine {
    pub product_name: String,
    pub quantity: i64,
    pub cost_cents: i64,
}

impl fmt::Display for PurchasedLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x {} (cost: {} cents)",
            self.product_name, self.quantity, self.cost_cents
        )
    }
}

/// Result of a successful buy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub total_spent_cents: i64,
    /// Lines in request order.
    pub lines: Vec<PurchasedLine>,
    /// The remaining balance, handed back as coins.
    pub change: ChangeBreakdown,
}

impl Purchase {
    /// Human-readable line descriptions, in request order.
    pub fn descriptions(&self) -> Vec<String> {
        self.lines.iter().map(ToString::to_string).collect()
    }

    #[inline]
    pub fn total_spent(&self) -> Money {
        Money::from_cents(self.total_spent_cents)
    }
}

impl fmt::Display for Purchase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Purchase successful!")?;
        writeln!(f, "Items purchased:")?;
        for line in &self.lines {
            writeln!(f, "- {line}")?;
        }
        writeln!(f, "Total spent: {} cents", self.total_spent_cents)?;
        write!(f, "Change: {}", self.change)
    }
}

// =============================================================================
// Reset
// =============================================================================

/// Result of a reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ResetOutcome {
    /// Balance was already zero; nothing was written.
    NothingToReset,
    /// The whole balance was handed back.
    Returned {
        amount_cents: i64,
        change: ChangeBreakdown,
    },
}

impl ResetOutcome {
    /// Coins handed back (empty for `NothingToReset`).
    pub fn change(&self) -> ChangeBreakdown {
        match self {
            ResetOutcome::NothingToReset => ChangeBreakdown::empty(),
            ResetOutcome::Returned { change, .. } => change.clone(),
        }
    }

    pub fn returned_cents(&self) -> i64 {
        match self {
            ResetOutcome::NothingToReset => 0,
            ResetOutcome::Returned { amount_cents, .. } => *amount_cents,
        }
    }
}

impl fmt::Display for ResetOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResetOutcome::NothingToReset => f.write_str("No deposit to reset"),
            ResetOutcome::Returned { change, .. } => {
                write!(f, "Deposit reset successfully. Returned: {change}")
            }
        }
    }
}
