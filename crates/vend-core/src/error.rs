//! # Error Types
//!
//! Domain-specific error types for vend-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  vend-core errors (this file)                                          │
//! │  ├── CoreError        - Domain rejections (coins, stock, funds, ...)   │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  vend-engine errors                                                    │
//! │  ├── StoreError       - Opaque store failures                          │
//! │  └── EngineError      - Rejected(CoreError) | StoreFailure(StoreError) │
//! │                                                                         │
//! │  vend-db errors                                                        │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → ApiError (CLI)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product, balance, ...)
//! 3. Errors are enum variants, never String
//! 4. Every variant is a recoverable, caller-visible rejection

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
///
/// None of these are retried. The boundary layer maps each one to a
/// caller-visible status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Deposited amount is not one of the accepted coins.
    #[error("Invalid coin: {amount} cents (only 5, 10, 20, 50 or 100 cent coins are accepted)")]
    InvalidDenomination { amount: i64 },

    /// The principal has no account.
    ///
    /// Should not happen for an authenticated principal, but an account can
    /// be deleted between authentication and the call.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// No product with this name.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Not enough units left to serve a purchase line.
    ///
    /// ## User Workflow
    /// ```text
    /// Buy Cola x 15
    ///      │
    ///      ▼
    /// Check stock: available=10
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Cola", available: 10, requested: 15 }
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Balance does not cover the purchase.
    #[error("Insufficient funds: balance {balance} cents, required {required} cents")]
    InsufficientFunds { balance: i64, required: i64 },

    /// A purchase request with no lines.
    #[error("Purchase must contain at least one item")]
    EmptyPurchase,

    /// A product name is already taken.
    #[error("Product already exists: {0}")]
    DuplicateProduct(String),

    /// A username is already taken.
    #[error("Account already exists: {0}")]
    DuplicateAccount(String),

    /// A seller tried to change a product owned by someone else.
    #[error("Product {product} is not owned by {seller}")]
    NotProductOwner { product: String, seller: String },

    /// An amount left the representable range.
    #[error("Amount overflow while computing {0}")]
    AmountOverflow(&'static str),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
