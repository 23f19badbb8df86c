//! # vend-engine: Transactional Vending Operations
//!
//! Runs every vending operation as one store transaction over the pure
//! rules in `vend-core`.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   VendingMachine      CatalogService       AccountService              │
//! │   deposit / buy /     list / create /      register / get /            │
//! │   reset / balance     update / delete      delete                      │
//! │         │                    │                    │                     │
//! │         └────────────────────┼────────────────────┘                     │
//! │                              ▼                                          │
//! │                  VendingStore::begin() ──► StoreTransaction             │
//! │                              │                                          │
//! │              ┌───────────────┴───────────────┐                          │
//! │              ▼                               ▼                          │
//! │        InMemoryStore                  SqliteStore (vend-db)             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`store`] - Store traits and `StoreError`
//! - [`memory`] - In-memory store with fault injection
//! - [`machine`] - Deposit, buy, reset, balance
//! - [`catalog`] - Product management
//! - [`accounts`] - Account management
//! - [`error`] - `EngineError`

pub mod accounts;
pub mod catalog;
pub mod error;
pub mod machine;
pub mod memory;
pub mod store;

pub use accounts::AccountService;
pub use catalog::CatalogService;
pub use error::{EngineError, EngineResult};
pub use machine::VendingMachine;
pub use memory::InMemoryStore;
pub use store::{
    AccountStore, CatalogStore, StoreError, StoreResult, StoreTransaction, VendingStore,
};
