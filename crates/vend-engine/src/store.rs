//! # Store Traits
//!
//! The seam between the engine and persistence.
//!
//! ## Transaction Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  store.begin() ──► tx          (store.begin_read() for lookups)         │
//! │                     │                                                   │
//! │                     ├── tx.find_account / tx.find_product   (reads)     │
//! │                     ├── tx.save_account / tx.save_product   (CAS)       │
//! │                     │                                                   │
//! │          ┌──────────┴──────────┐                                        │
//! │          ▼                     ▼                                        │
//! │     tx.commit()           drop(tx)                                      │
//! │     all writes            no writes                                     │
//! │     visible               visible (rollback)                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Save Semantics
//! `save_*` takes the entity as it was read (its `version` is the version
//! the caller saw) and writes it with `version + 1`:
//!
//! | stored row         | entity.version | outcome                  |
//! |--------------------|----------------|--------------------------|
//! | absent             | 0              | inserted at version 1    |
//! | absent             | > 0            | `Conflict` (deleted)     |
//! | present, same ver. | n              | updated to n + 1         |
//! | present, other ver.| n              | `Conflict` (stale read)  |
//!
//! A unique key (username, product name) already held by another row fails
//! with `Duplicate`.

use std::future::Future;
use thiserror::Error;

use vend_core::{Account, Product};

/// Store failures. Opaque to callers beyond these three kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The row changed (or vanished) since it was read.
    #[error("Write conflict on {entity} '{key}'")]
    Conflict { entity: &'static str, key: String },

    /// A unique key is already taken by another row.
    #[error("Duplicate {entity}: '{key}'")]
    Duplicate { entity: &'static str, key: String },

    /// Anything else the backend reports.
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn conflict(entity: &'static str, key: impl Into<String>) -> Self {
        StoreError::Conflict {
            entity,
            key: key.into(),
        }
    }

    pub fn duplicate(entity: &'static str, key: impl Into<String>) -> Self {
        StoreError::Duplicate {
            entity,
            key: key.into(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Account access by username.
pub trait AccountStore {
    fn find_account(
        &mut self,
        username: &str,
    ) -> impl Future<Output = StoreResult<Option<Account>>> + Send;

    /// Version-checked write. Returns the account as stored.
    fn save_account(
        &mut self,
        account: &Account,
    ) -> impl Future<Output = StoreResult<Account>> + Send;

    /// Removes the account and every product it sells. Returns `false`
    /// when there was nothing to delete.
    fn delete_account(&mut self, username: &str) -> impl Future<Output = StoreResult<bool>> + Send;
}

/// Product access by name.
pub trait CatalogStore {
    fn find_product(
        &mut self,
        name: &str,
    ) -> impl Future<Output = StoreResult<Option<Product>>> + Send;

    /// Version-checked write. Returns the product as stored.
    fn save_product(
        &mut self,
        product: &Product,
    ) -> impl Future<Output = StoreResult<Product>> + Send;

    /// All products, ordered by name.
    fn list_products(&mut self) -> impl Future<Output = StoreResult<Vec<Product>>> + Send;

    fn delete_product(&mut self, name: &str) -> impl Future<Output = StoreResult<bool>> + Send;
}

/// One unit of work. Dropping it without `commit` discards every write.
pub trait StoreTransaction: AccountStore + CatalogStore + Send {
    fn commit(self) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Entry point: a store hands out transactions.
pub trait VendingStore: Send + Sync {
    type Tx: StoreTransaction;

    /// Opens a transaction that may write. Writers are serialized from the
    /// start, so everything they read is current until they commit.
    fn begin(&self) -> impl Future<Output = StoreResult<Self::Tx>> + Send;

    /// Opens a transaction that only reads and is never committed.
    ///
    /// Stores that can serve snapshot reads without taking the write lock
    /// override this; the default is a plain `begin`.
    fn begin_read(&self) -> impl Future<Output = StoreResult<Self::Tx>> + Send {
        self.begin()
    }
}
