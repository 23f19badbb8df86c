//! # Purchase Planning
//!
//! Pure bookkeeping for a multi-line buy. The engine feeds it the products
//! it loads from the store; the plan checks stock, prices every line and,
//! once the buyer's balance is known, settles into the products to write
//! back and the receipt to return.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for each PurchaseLine (request order)                                  │
//! │       │                                                                 │
//! │       ├── not staged yet? → engine loads Product → stage()             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  add_line()                                                            │
//! │       ├── quantity < 1          → Validation                           │
//! │       ├── remaining < quantity  → InsufficientStock                    │
//! │       └── cost = unit × qty, remaining -= qty                          │
//! │                                                                         │
//! │  settle(balance)                                                       │
//! │       ├── balance < total       → InsufficientFunds                    │
//! │       └── products to save + Purchase { total, lines, change }         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Repeated Products
//! Lines naming the same product are never merged: each keeps its own
//! quantity, cost and description. Stock is checked cumulatively, so the
//! second line is served from what the first one left. The product is
//! staged once and therefore written once, decremented by the sum.

use crate::change::breakdown;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Product, Purchase, PurchaseLine, PurchasedLine};
use crate::validation::validate_quantity;

/// A purchase being assembled.
#[derive(Debug, Clone, Default)]
pub struct PurchasePlan {
    /// Working copies, one per distinct product, in first-seen order.
    staged: Vec<Product>,
    lines: Vec<PurchasedLine>,
    total: Money,
}

/// A plan whose funds check passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledPurchase {
    /// Products with their stock already decremented, ready to save.
    pub products: Vec<Product>,
    /// Balance left after paying; returned as change.
    pub change_cents: i64,
    /// The receipt.
    pub purchase: Purchase,
}

impl PurchasePlan {
    pub fn new() -> Self {
        PurchasePlan::default()
    }

    /// Whether an earlier line already brought this product in.
    pub fn is_staged(&self, product_name: &str) -> bool {
        self.staged.iter().any(|p| p.name == product_name)
    }

    /// Adds a freshly loaded product. Ignored if one with the same name is
    /// already staged, since the staged copy carries earlier decrements.
    pub fn stage(&mut self, product: Product) {
        if !self.is_staged(&product.name) {
            self.staged.push(product);
        }
    }

    /// Prices one line against the staged product and reserves its units.
    ///
    /// ## Errors
    /// - `Validation` when `quantity < 1`
    /// - `ProductNotFound` when the product was never staged
    /// - `InsufficientStock` with the units still available to this request
    /// - `AmountOverflow` if the cost leaves the `i64` range
    pub fn add_line(&mut self, line: &PurchaseLine) -> CoreResult<&PurchasedLine> {
        validate_quantity(line.quantity)?;

        let product = self
            .staged
            .iter_mut()
            .find(|p| p.name == line.product_name)
            .ok_or_else(|| CoreError::ProductNotFound(line.product_name.clone()))?;

        if !product.can_sell(line.quantity) {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                available: product.amount_available,
                requested: line.quantity,
            });
        }

        let cost = product
            .cost()
            .checked_mul_quantity(line.quantity)
            .ok_or(CoreError::AmountOverflow("line cost"))?;
        self.total = self
            .total
            .checked_add(cost)
            .ok_or(CoreError::AmountOverflow("purchase total"))?;

        product.amount_available -= line.quantity;

        self.lines.push(PurchasedLine {
            product_name: product.name.clone(),
            quantity: line.quantity,
            cost_cents: cost.cents(),
        });

        Ok(&self.lines[self.lines.len() - 1])
    }

    /// Running total of the lines added so far.
    pub fn total(&self) -> Money {
        self.total
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Checks the balance covers the total and produces the writes and the
    /// receipt.
    ///
    /// ## Errors
    /// - `EmptyPurchase` when no line was added
    /// - `InsufficientFunds` when `balance_cents < total`
    pub fn settle(self, balance_cents: i64) -> CoreResult<SettledPurchase> {
        if self.lines.is_empty() {
            return Err(CoreError::EmptyPurchase);
        }

        let balance = Money::from_cents(balance_cents);
        if balance < self.total {
            return Err(CoreError::InsufficientFunds {
                balance: balance.cents(),
                required: self.total.cents(),
            });
        }

        let change_cents = (balance - self.total).cents();

        Ok(SettledPurchase {
            products: self.staged,
            change_cents,
            purchase: Purchase {
                total_spent_cents: self.total.cents(),
                lines: self.lines,
                change: breakdown(change_cents),
            },
        })
    }
}
