//! # SQLite Store
//!
//! [`VendingStore`] on SQLite: one `sqlx` transaction per engine operation.
//!
//! ## Version-Checked Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  save(entity read at version n)                                         │
//! │       │                                                                 │
//! │       ├── n == 0  INSERT ... version = 1                                │
//! │       │             UNIQUE clash ──────────────► StoreError::Duplicate  │
//! │       │                                                                 │
//! │       └── n > 0   UPDATE ... SET version = version + 1                  │
//! │                   WHERE id = ? AND version = n                          │
//! │                     0 rows ────────────────────► StoreError::Conflict   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A transaction dropped without `commit` is rolled back by sqlx.
//!
//! ## Locking
//! ```text
//! begin()       BEGIN IMMEDIATE   takes the write lock before the first read;
//!                                 other writers wait on busy_timeout
//! begin_read()  BEGIN (deferred)  WAL snapshot, never blocks or is blocked
//!                                 by writers
//! ```
//!
//! A deferred transaction that reads and then writes can lose the upgrade
//! to a concurrent writer and fail with `SQLITE_BUSY` even when the two
//! touch different rows. Taking the lock up front means a writer always
//! reads committed state, so a buyer who loses a stock race is told
//! `InsufficientStock` rather than getting a store failure. Saves still
//! carry the version check.

use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use vend_core::{Account, Product};
use vend_engine::{
    AccountStore, CatalogStore, StoreError, StoreResult, StoreTransaction, VendingStore,
};

use crate::error::DbError;
use crate::rows::{encode_roles, AccountRow, ProductRow, ACCOUNT_COLUMNS, PRODUCT_COLUMNS};

/// Fills in the offending key, which SQLite does not report.
fn write_error(err: sqlx::Error, key: &str) -> StoreError {
    match DbError::from(err) {
        DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
            field,
            value: key.to_string(),
        },
        other => other,
    }
    .into()
}

fn read_error(err: sqlx::Error) -> StoreError {
    DbError::from(err).into()
}

/// Engine-facing handle over the pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteStore { pool }
    }
}

impl VendingStore for SqliteStore {
    type Tx = SqliteTransaction;

    async fn begin(&self) -> StoreResult<SqliteTransaction> {
        let tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(read_error)?;
        Ok(SqliteTransaction { tx })
    }

    async fn begin_read(&self) -> StoreResult<SqliteTransaction> {
        let tx = self.pool.begin().await.map_err(read_error)?;
        Ok(SqliteTransaction { tx })
    }
}

/// An open SQLite transaction.
pub struct SqliteTransaction {
    tx: Transaction<'static, Sqlite>,
}

impl AccountStore for SqliteTransaction {
    async fn find_account(&mut self, username: &str) -> StoreResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = ?1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(username)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(read_error)?;

        Ok(row.map(AccountRow::into_account).transpose()?)
    }

    async fn save_account(&mut self, account: &Account) -> StoreResult<Account> {
        let roles = encode_roles(&account.roles)?;

        if account.version == 0 {
            sqlx::query(
                r#"
                INSERT INTO accounts
                    (id, username, roles, balance_cents, version, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6)
                "#,
            )
            .bind(&account.id)
            .bind(&account.username)
            .bind(&roles)
            .bind(account.balance_cents)
            .bind(account.created_at)
            .bind(account.updated_at)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| write_error(e, &account.username))?;
        } else {
            let result = sqlx::query(
                r#"
                UPDATE accounts
                SET username = ?1,
                    roles = ?2,
                    balance_cents = ?3,
                    version = version + 1,
                    updated_at = ?4
                WHERE id = ?5 AND version = ?6
                "#,
            )
            .bind(&account.username)
            .bind(&roles)
            .bind(account.balance_cents)
            .bind(account.updated_at)
            .bind(&account.id)
            .bind(account.version)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| write_error(e, &account.username))?;

            if result.rows_affected() == 0 {
                return Err(DbError::conflict("account", &account.username).into());
            }
        }

        debug!(username = %account.username, version = account.version + 1, "Saved account");

        let mut stored = account.clone();
        stored.version += 1;
        Ok(stored)
    }

    async fn delete_account(&mut self, username: &str) -> StoreResult<bool> {
        // Products go with it (ON DELETE CASCADE).
        let result = sqlx::query("DELETE FROM accounts WHERE username = ?1")
            .bind(username)
            .execute(&mut *self.tx)
            .await
            .map_err(read_error)?;

        Ok(result.rows_affected() > 0)
    }
}

impl CatalogStore for SqliteTransaction {
    async fn find_product(&mut self, name: &str) -> StoreResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE name = ?1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(read_error)?;

        Ok(row.map(Product::from))
    }

    async fn save_product(&mut self, product: &Product) -> StoreResult<Product> {
        if product.version == 0 {
            sqlx::query(
                r#"
                INSERT INTO products
                    (id, name, cost_cents, amount_available, seller_username,
                     version, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7)
                "#,
            )
            .bind(&product.id)
            .bind(&product.name)
            .bind(product.cost_cents)
            .bind(product.amount_available)
            .bind(&product.seller)
            .bind(product.created_at)
            .bind(product.updated_at)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| write_error(e, &product.name))?;
        } else {
            let result = sqlx::query(
                r#"
                UPDATE products
                SET name = ?1,
                    cost_cents = ?2,
                    amount_available = ?3,
                    seller_username = ?4,
                    version = version + 1,
                    updated_at = ?5
                WHERE id = ?6 AND version = ?7
                "#,
            )
            .bind(&product.name)
            .bind(product.cost_cents)
            .bind(product.amount_available)
            .bind(&product.seller)
            .bind(product.updated_at)
            .bind(&product.id)
            .bind(product.version)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| write_error(e, &product.name))?;

            if result.rows_affected() == 0 {
                return Err(DbError::conflict("product", &product.name).into());
            }
        }

        debug!(
            product = %product.name,
            amount_available = product.amount_available,
            version = product.version + 1,
            "Saved product"
        );

        let mut stored = product.clone();
        stored.version += 1;
        Ok(stored)
    }

    async fn list_products(&mut self) -> StoreResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(read_error)?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn delete_product(&mut self, name: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE name = ?1")
            .bind(name)
            .execute(&mut *self.tx)
            .await
            .map_err(read_error)?;

        Ok(result.rows_affected() > 0)
    }
}

impl StoreTransaction for SqliteTransaction {
    async fn commit(self) -> StoreResult<()> {
        self.tx.commit().await.map_err(read_error)
    }
}
