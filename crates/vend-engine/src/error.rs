//! # Engine Errors
//!
//! Every engine operation fails in exactly one of two ways:
//!
//! ```text
//! EngineError
//! ├── Rejected(CoreError)      the request broke a business rule;
//! │                            nothing was written
//! └── StoreFailure(StoreError) the store could not complete the unit
//!                              of work; nothing was written
//! ```
//!
//! Keeping them apart means a caller never reports a disk error as
//! "insufficient funds", or the other way round.

use thiserror::Error;

use vend_core::{CoreError, ValidationError};

use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Domain rejection.
    #[error(transparent)]
    Rejected(#[from] CoreError),

    /// Opaque store fault.
    #[error("Store failure: {0}")]
    StoreFailure(#[from] StoreError),
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Rejected(CoreError::Validation(err))
    }
}

impl EngineError {
    /// The domain rejection, if this is one.
    pub fn rejection(&self) -> Option<&CoreError> {
        match self {
            EngineError::Rejected(err) => Some(err),
            EngineError::StoreFailure(_) => None,
        }
    }

    pub fn is_store_failure(&self) -> bool {
        matches!(self, EngineError::StoreFailure(_))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
