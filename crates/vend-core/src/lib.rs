//! # vend-core: Pure Vending Logic
//!
//! This crate is the **heart** of the vending service. It contains the
//! money rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vending Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    vend-cli (boundary)                          │   │
//! │  │    roles, status codes, JSON output                             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    vend-engine                                  │   │
//! │  │    deposit, buy, reset inside one store transaction             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ vend-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   coins   │  │  change   │  │ purchase  │  │ validation│  │   │
//! │  │   │   Coin    │  │ Breakdown │  │   Plan    │  │   rules   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`coins`] - The accepted denominations (the coin policy)
//! - [`change`] - Greedy change making
//! - [`money`] - Money type with integer arithmetic
//! - [`purchase`] - Multi-line purchase planning
//! - [`types`] - Domain types (Account, Product, Purchase, ...)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use vend_core::change::breakdown;
//! use vend_core::coins::Coin;
//!
//! let coin = Coin::try_from(50_i64).unwrap();
//! assert_eq!(coin.cents(), 50);
//!
//! let change = breakdown(75);
//! assert_eq!(change.to_string(), "1 x 50 cents, 1 x 20 cents, 1 x 5 cents");
//! ```

pub mod change;
pub mod coins;
pub mod error;
pub mod money;
pub mod purchase;
pub mod types;
pub mod validation;

pub use change::{breakdown, ChangeBreakdown};
pub use coins::Coin;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use purchase::{PurchasePlan, SettledPurchase};
pub use types::*;

