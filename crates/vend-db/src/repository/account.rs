//! # Account Repository
//!
//! Read-only account queries outside engine transactions.

use sqlx::SqlitePool;
use tracing::debug;

use vend_core::Account;

use crate::error::DbResult;
use crate::rows::{AccountRow, ACCOUNT_COLUMNS};

/// Repository for account lookups.
///
/// ## Usage
/// ```rust,ignore
/// let alice = db.accounts().get_by_username("alice").await?;
/// let total = db.accounts().total_balance().await?;
/// ```
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AccountRepository { pool }
    }

    /// ## Returns
    /// * `Ok(Some(Account))` - Account found
    /// * `Ok(None)` - No such username
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = ?1");
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        row.map(AccountRow::into_account).transpose()
    }

    /// All accounts ordered by username.
    pub async fn list(&self) -> DbResult<Vec<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY username");
        let rows = sqlx::query_as::<_, AccountRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed accounts");
        rows.into_iter().map(AccountRow::into_account).collect()
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Sum of all balances: the money currently held by the machine.
    pub async fn total_balance(&self) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(balance_cents), 0) FROM accounts")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}
