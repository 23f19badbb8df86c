//! # vend-db: SQLite Persistence
//!
//! Implements the `vend-engine` store traits on SQLite with sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Vending Data Flow                                │
//! │                                                                         │
//! │  vend-cli (buy alice Cola=2)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  VendingMachine<SqliteStore> (vend-engine)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     vend-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  SqliteStore  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (store.rs)   │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ Transaction   │    │ 001_init.sql │  │   │
//! │  │   │ Repositories  │    │ CAS writes    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (./vending.db by default)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`store`] - `SqliteStore` / `SqliteTransaction`
//! - [`repository`] - Read-only repositories
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vend_db::{Database, DbConfig};
//! use vend_engine::VendingMachine;
//!
//! let db = Database::new(DbConfig::new("./vending.db")).await?;
//! let machine = VendingMachine::new(db.store());
//! machine.deposit("alice", 100).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
mod rows;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use store::{SqliteStore, SqliteTransaction};

pub use repository::account::AccountRepository;
pub use repository::product::ProductRepository;
