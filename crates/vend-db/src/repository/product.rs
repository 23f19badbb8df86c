//! # Product Repository
//!
//! Read-only product queries outside engine transactions.

use sqlx::SqlitePool;
use tracing::debug;

use vend_core::Product;

use crate::error::DbResult;
use crate::rows::{ProductRow, PRODUCT_COLUMNS};

/// Repository for product listings.
///
/// ## Usage
/// ```rust,ignore
/// let cola = db.products().get_by_name("Cola").await?;
/// let mine = db.products().list_by_seller("seller").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE name = ?1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// All products ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Products owned by one seller, ordered by name.
    pub async fn list_by_seller(&self, seller: &str) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE seller_username = ?1 ORDER BY name"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(seller)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
