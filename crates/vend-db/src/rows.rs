//! Row types for runtime-checked queries and their conversion into domain
//! types.

use chrono::{DateTime, Utc};
use vend_core::{Account, Product, Role};

use crate::error::{DbError, DbResult};

pub(crate) const ACCOUNT_COLUMNS: &str =
    "id, username, roles, balance_cents, version, created_at, updated_at";

pub(crate) const PRODUCT_COLUMNS: &str =
    "id, name, cost_cents, amount_available, seller_username, version, created_at, updated_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct AccountRow {
    pub id: String,
    pub username: String,
    /// JSON array of role names.
    pub roles: String,
    pub balance_cents: i64,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccountRow {
    pub fn into_account(self) -> DbResult<Account> {
        let roles: Vec<Role> =
            serde_json::from_str(&self.roles).map_err(|e| DbError::Decode {
                column: "accounts.roles",
                message: e.to_string(),
            })?;

        Ok(Account {
            id: self.id,
            username: self.username,
            roles,
            balance_cents: self.balance_cents,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub(crate) fn encode_roles(roles: &[Role]) -> DbResult<String> {
    serde_json::to_string(roles).map_err(|e| DbError::Internal(e.to_string()))
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ProductRow {
    pub id: String,
    pub name: String,
    pub cost_cents: i64,
    pub amount_available: i64,
    pub seller_username: String,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            cost_cents: row.cost_cents,
            amount_available: row.amount_available,
            seller: row.seller_username,
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
