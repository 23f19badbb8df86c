//! # Validation Module
//!
//! Input validation for catalog, account and purchase requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Boundary (vend-cli)                                          │
//! │  └── Type validation (argument parsing)                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Services (vend-engine)                                       │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE constraints (username, product name)                       │
//! │  └── CHECK constraints (balance >= 0, stock >= 0, cost > 0)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::Role;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of a product name.
pub const MAX_PRODUCT_NAME_LEN: usize = 100;

/// Maximum length of a username.
pub const MAX_USERNAME_LEN: usize = 50;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty (after trimming)
/// - At most 100 characters
///
/// ## Example
/// ```rust
/// use vend_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Cola").is_ok());
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "product name".to_string(),
        });
    }

    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "product name".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a username.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - No whitespace
pub fn validate_username(username: &str) -> ValidationResult<()> {
    if username.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }

    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: MAX_USERNAME_LEN,
        });
    }

    if username.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a purchase line quantity (at least 1).
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 1 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a unit cost in cents.
///
/// ## Rules
/// - Strictly positive
/// - A multiple of 5, so every balance left after a purchase can be paid
///   back in coins
///
/// ## Example
/// ```rust
/// use vend_core::validation::validate_cost_cents;
///
/// assert!(validate_cost_cents(50).is_ok());
/// assert!(validate_cost_cents(0).is_err());
/// assert!(validate_cost_cents(33).is_err());
/// ```
pub fn validate_cost_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "cost".to_string(),
        });
    }

    if cents % 5 != 0 {
        return Err(ValidationError::InvalidFormat {
            field: "cost".to_string(),
            reason: "must be a multiple of 5 cents".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level (zero is allowed, an empty slot).
pub fn validate_amount_available(amount: i64) -> ValidationResult<()> {
    if amount < 0 {
        return Err(ValidationError::OutOfRange {
            field: "amount available".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the role set of a new account (at least one role).
pub fn validate_roles(roles: &[Role]) -> ValidationResult<()> {
    if roles.is_empty() {
        return Err(ValidationError::Required {
            field: "roles".to_string(),
        });
    }

    Ok(())
}
