//! # API Error Type
//!
//! What a failed command prints on stderr.
//!
//! ## Status Mapping
//! ```text
//! ┌──────────────────────────────────────────┬────────┬──────────────────────┐
//! │ Engine outcome                           │ status │ code                 │
//! ├──────────────────────────────────────────┼────────┼──────────────────────┤
//! │ AccountNotFound, ProductNotFound         │ 404    │ NOT_FOUND            │
//! │ InvalidDenomination                      │ 400    │ INVALID_DENOMINATION │
//! │ InsufficientFunds                        │ 400    │ INSUFFICIENT_FUNDS   │
//! │ InsufficientStock                        │ 400    │ INSUFFICIENT_STOCK   │
//! │ EmptyPurchase, Validation, AmountOverflow│ 400    │ VALIDATION_ERROR     │
//! │ DuplicateAccount, DuplicateProduct       │ 409    │ DUPLICATE            │
//! │ wrong role, NotProductOwner              │ 403    │ FORBIDDEN            │
//! │ StoreFailure                             │ 500    │ STORE_ERROR          │
//! │ setup (config, database open)            │ 500    │ INTERNAL             │
//! └──────────────────────────────────────────┴────────┴──────────────────────┘
//! ```
//!
//! ## Serialization
//! ```json
//! {
//!   "code": "INSUFFICIENT_FUNDS",
//!   "status": 400,
//!   "message": "Insufficient funds: balance 25 cents, required 50 cents"
//! }
//! ```

use serde::Serialize;
use vend_core::{CoreError, Role};
use vend_engine::EngineError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// HTTP-style status
    pub status: u16,

    /// Human-readable message
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    InvalidDenomination,
    InsufficientFunds,
    InsufficientStock,
    ValidationError,
    Duplicate,
    Forbidden,
    StoreError,
    Internal,
}

impl ErrorCode {
    pub const fn status(self) -> u16 {
        match self {
            ErrorCode::NotFound => 404,
            ErrorCode::InvalidDenomination
            | ErrorCode::InsufficientFunds
            | ErrorCode::InsufficientStock
            | ErrorCode::ValidationError => 400,
            ErrorCode::Duplicate => 409,
            ErrorCode::Forbidden => 403,
            ErrorCode::StoreError | ErrorCode::Internal => 500,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            status: code.status(),
            message: message.into(),
        }
    }

    /// The principal lacks the role the command needs.
    pub fn missing_role(principal: &str, role: Role) -> Self {
        ApiError::new(
            ErrorCode::Forbidden,
            format!("{principal} does not have the {role} role"),
        )
    }

    pub fn not_own_account(principal: &str, username: &str) -> Self {
        ApiError::new(
            ErrorCode::Forbidden,
            format!("{principal} may only manage their own account, not {username}"),
        )
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::AccountNotFound(_) | CoreError::ProductNotFound(_) => ErrorCode::NotFound,
            CoreError::InvalidDenomination { .. } => ErrorCode::InvalidDenomination,
            CoreError::InsufficientFunds { .. } => ErrorCode::InsufficientFunds,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::EmptyPurchase
            | CoreError::Validation(_)
            | CoreError::AmountOverflow(_) => ErrorCode::ValidationError,
            CoreError::DuplicateAccount(_) | CoreError::DuplicateProduct(_) => {
                ErrorCode::Duplicate
            }
            CoreError::NotProductOwner { .. } => ErrorCode::Forbidden,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Rejected(err) => err.into(),
            EngineError::StoreFailure(err) => {
                // Details stay in the log.
                tracing::error!(error = %err, "Store failure");
                ApiError::new(ErrorCode::StoreError, "The operation could not be completed")
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::internal(format!("{err:#}"))
    }
}
