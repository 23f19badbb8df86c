//! # Repository Module
//!
//! Pool-level, read-only access for listings and diagnostics.
//!
//! ## Repositories vs Store
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  db.accounts() / db.products()      db.store().begin()                 │
//! │  ─────────────────────────────      ─────────────────────              │
//! │  one query per call                 one transaction per operation      │
//! │  any pooled connection              reads + version-checked writes     │
//! │  listings, counts, lookups          everything that mutates            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`AccountRepository`](account::AccountRepository) - Account lookups
//! - [`ProductRepository`](product::ProductRepository) - Product listings

pub mod account;
pub mod product;
