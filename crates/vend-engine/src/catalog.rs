//! # Catalog Service
//!
//! Product management for sellers.
//!
//! ## Ownership
//! ```text
//! create_product(seller, ..)     product.seller = seller
//! update_product(caller, name)   caller == product.seller, else NotProductOwner
//! delete_product(caller, name)   caller == product.seller, else NotProductOwner
//! ```
//!
//! Whether the caller holds the seller role is checked at the boundary;
//! ownership is checked here.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use vend_core::validation::{
    validate_amount_available, validate_cost_cents, validate_product_name,
};
use vend_core::{CoreError, NewProduct, Product, ProductUpdate};

use crate::accounts::require_account;
use crate::error::{EngineError, EngineResult};
use crate::machine::log_failure;
use crate::store::{CatalogStore, StoreError, StoreTransaction, VendingStore};

#[derive(Debug, Clone)]
pub struct CatalogService<S> {
    store: S,
}

fn validate_fields(name: &str, cost_cents: i64, amount_available: i64) -> EngineResult<()> {
    validate_product_name(name)?;
    validate_cost_cents(cost_cents)?;
    validate_amount_available(amount_available)?;
    Ok(())
}

/// Maps a unique-key clash on save to the domain rejection.
fn duplicate_as_rejection(name: &str) -> impl FnOnce(StoreError) -> EngineError + '_ {
    move |err| match err {
        StoreError::Duplicate { .. } => {
            EngineError::Rejected(CoreError::DuplicateProduct(name.to_string()))
        }
        other => other.into(),
    }
}

fn ensure_owner(product: &Product, caller: &str) -> EngineResult<()> {
    if product.seller != caller {
        return Err(CoreError::NotProductOwner {
            product: product.name.clone(),
            seller: caller.to_string(),
        }
        .into());
    }
    Ok(())
}

impl<S: VendingStore> CatalogService<S> {
    pub fn new(store: S) -> Self {
        CatalogService { store }
    }

    /// Every product, ordered by name.
    pub async fn list_products(&self) -> EngineResult<Vec<Product>> {
        let mut tx = self.store.begin_read().await?;
        Ok(tx.list_products().await?)
    }

    /// Looks up one product by name.
    pub async fn get_product(&self, name: &str) -> EngineResult<Product> {
        let mut tx = self.store.begin_read().await?;
        tx.find_product(name)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(name.to_string()).into())
    }

    /// Adds a product owned by `seller`.
    ///
    /// ## Errors
    /// - `Validation` for a bad name, cost or stock
    /// - `AccountNotFound` when the seller has no account
    /// - `DuplicateProduct` when the name is taken
    pub async fn create_product(&self, seller: &str, new: NewProduct) -> EngineResult<Product> {
        let result = self.run_create(seller, new).await;
        log_failure("create_product", seller, &result);
        result
    }

    async fn run_create(&self, seller: &str, new: NewProduct) -> EngineResult<Product> {
        validate_fields(&new.name, new.cost_cents, new.amount_available)?;
        let name = new.name.trim();

        let mut tx = self.store.begin().await?;
        require_account(&mut tx, seller).await?;

        if tx.find_product(name).await?.is_some() {
            return Err(CoreError::DuplicateProduct(name.to_string()).into());
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            cost_cents: new.cost_cents,
            amount_available: new.amount_available,
            seller: seller.to_string(),
            version: 0,
            created_at: now,
            updated_at: now,
        };

        let stored = tx
            .save_product(&product)
            .await
            .map_err(duplicate_as_rejection(name))?;
        tx.commit().await?;

        info!(
            seller,
            product = %stored.name,
            cost_cents = stored.cost_cents,
            amount_available = stored.amount_available,
            "Product created"
        );
        Ok(stored)
    }

    /// Changes name, cost or stock of a product the caller owns. Fields left
    /// as `None` keep the value read inside the same transaction.
    ///
    /// ## Errors
    /// - `Validation`
    /// - `ProductNotFound`
    /// - `NotProductOwner`
    /// - `DuplicateProduct` when renaming onto a taken name
    pub async fn update_product(
        &self,
        seller: &str,
        name: &str,
        update: ProductUpdate,
    ) -> EngineResult<Product> {
        let result = self.run_update(seller, name, update).await;
        log_failure("update_product", seller, &result);
        result
    }

    async fn run_update(
        &self,
        seller: &str,
        name: &str,
        update: ProductUpdate,
    ) -> EngineResult<Product> {
        if let Some(new_name) = &update.name {
            validate_product_name(new_name)?;
        }
        if let Some(cost_cents) = update.cost_cents {
            validate_cost_cents(cost_cents)?;
        }
        if let Some(amount_available) = update.amount_available {
            validate_amount_available(amount_available)?;
        }

        let mut tx = self.store.begin().await?;
        let mut product = tx
            .find_product(name)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(name.to_string()))?;
        ensure_owner(&product, seller)?;

        let new_name = match &update.name {
            Some(new_name) => new_name.trim().to_string(),
            None => product.name.clone(),
        };
        if new_name != product.name && tx.find_product(&new_name).await?.is_some() {
            return Err(CoreError::DuplicateProduct(new_name).into());
        }

        product.cost_cents = update.cost_cents.unwrap_or(product.cost_cents);
        product.amount_available = update.amount_available.unwrap_or(product.amount_available);
        product.name = new_name;
        product.updated_at = Utc::now();

        let stored = tx
            .save_product(&product)
            .await
            .map_err(duplicate_as_rejection(&product.name))?;
        tx.commit().await?;

        info!(seller, from = name, product = %stored.name, "Product updated");
        Ok(stored)
    }

    /// Removes a product the caller owns.
    pub async fn delete_product(&self, seller: &str, name: &str) -> EngineResult<()> {
        let result = self.run_delete(seller, name).await;
        log_failure("delete_product", seller, &result);
        result
    }

    async fn run_delete(&self, seller: &str, name: &str) -> EngineResult<()> {
        let mut tx = self.store.begin().await?;
        let product = tx
            .find_product(name)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(name.to_string()))?;
        ensure_owner(&product, seller)?;

        tx.delete_product(name).await?;
        tx.commit().await?;

        info!(seller, product = name, "Product deleted");
        Ok(())
    }
}
