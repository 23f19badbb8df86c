//! # Account Service
//!
//! Registration, lookup, update and removal of machine users.
//!
//! A rename carries the account's products along: stores cascade the new
//! username to `products.seller` in the same transaction.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use vend_core::validation::{validate_roles, validate_username};
use vend_core::{Account, AccountUpdate, CoreError, Role};

use crate::error::{EngineError, EngineResult};
use crate::machine::log_failure;
use crate::store::{AccountStore, StoreError, StoreTransaction, VendingStore};

/// Loads an account or rejects with `AccountNotFound`.
pub(crate) async fn require_account<T>(tx: &mut T, username: &str) -> EngineResult<Account>
where
    T: AccountStore + Send,
{
    tx.find_account(username)
        .await?
        .ok_or_else(|| CoreError::AccountNotFound(username.to_string()).into())
}

/// Sorted and deduplicated.
fn normalize_roles(roles: &[Role]) -> Vec<Role> {
    let mut roles = roles.to_vec();
    roles.sort();
    roles.dedup();
    roles
}

fn duplicate_as_rejection(username: &str) -> impl FnOnce(StoreError) -> EngineError + '_ {
    move |err| match err {
        StoreError::Duplicate { .. } => {
            EngineError::Rejected(CoreError::DuplicateAccount(username.to_string()))
        }
        other => other.into(),
    }
}

#[derive(Debug, Clone)]
pub struct AccountService<S> {
    store: S,
}

impl<S: VendingStore> AccountService<S> {
    pub fn new(store: S) -> Self {
        AccountService { store }
    }

    /// Creates an account with a zero balance.
    ///
    /// ## Errors
    /// - `Validation` for a bad username or an empty role set
    /// - `DuplicateAccount` when the username is taken
    pub async fn register(&self, username: &str, roles: &[Role]) -> EngineResult<Account> {
        let result = self.run_register(username, roles).await;
        log_failure("register", username, &result);
        result
    }

    async fn run_register(&self, username: &str, roles: &[Role]) -> EngineResult<Account> {
        validate_username(username)?;
        validate_roles(roles)?;

        let roles = normalize_roles(roles);

        let mut tx = self.store.begin().await?;
        if tx.find_account(username).await?.is_some() {
            return Err(CoreError::DuplicateAccount(username.to_string()).into());
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            roles,
            balance_cents: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        };

        let stored = tx
            .save_account(&account)
            .await
            .map_err(duplicate_as_rejection(username))?;
        tx.commit().await?;

        info!(username, roles = ?stored.roles, "Account registered");
        Ok(stored)
    }

    pub async fn get(&self, username: &str) -> EngineResult<Account> {
        let mut tx = self.store.begin_read().await?;
        let result = require_account(&mut tx, username).await;
        log_failure("get_account", username, &result);
        result
    }

    /// Renames the account or replaces its roles. The balance is untouched.
    ///
    /// ## Errors
    /// - `Validation` for a bad new username or an empty role set
    /// - `AccountNotFound`
    /// - `DuplicateAccount` when the new username is taken
    pub async fn update(&self, username: &str, update: AccountUpdate) -> EngineResult<Account> {
        let result = self.run_update(username, update).await;
        log_failure("update_account", username, &result);
        result
    }

    async fn run_update(&self, username: &str, update: AccountUpdate) -> EngineResult<Account> {
        if let Some(new_name) = &update.username {
            validate_username(new_name)?;
        }
        if let Some(roles) = &update.roles {
            validate_roles(roles)?;
        }

        let mut tx = self.store.begin().await?;
        let mut account = require_account(&mut tx, username).await?;

        if let Some(new_name) = update.username {
            if new_name != account.username && tx.find_account(&new_name).await?.is_some() {
                return Err(CoreError::DuplicateAccount(new_name).into());
            }
            account.username = new_name;
        }
        if let Some(roles) = update.roles {
            account.roles = normalize_roles(&roles);
        }
        account.updated_at = Utc::now();

        let stored = tx
            .save_account(&account)
            .await
            .map_err(duplicate_as_rejection(&account.username))?;
        tx.commit().await?;

        info!(
            from = username,
            username = %stored.username,
            roles = ?stored.roles,
            "Account updated"
        );
        Ok(stored)
    }

    /// Removes the account together with the products it sells.
    pub async fn delete(&self, username: &str) -> EngineResult<()> {
        let result = self.run_delete(username).await;
        log_failure("delete_account", username, &result);
        result
    }

    async fn run_delete(&self, username: &str) -> EngineResult<()> {
        let mut tx = self.store.begin().await?;
        if !tx.delete_account(username).await? {
            return Err(CoreError::AccountNotFound(username.to_string()).into());
        }
        tx.commit().await?;

        info!(username, "Account deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;

    #[tokio::test]
    async fn test_register_and_get() {
        let service = AccountService::new(InMemoryStore::new());

        let account = service
            .register("alice", &[Role::Seller, Role::Buyer, Role::Buyer])
            .await
            .unwrap();
        assert_eq!(account.roles, vec![Role::Buyer, Role::Seller]);
        assert_eq!(account.balance_cents, 0);
        assert_eq!(account.version, 1);

        let fetched = service.get("alice").await.unwrap();
        assert_eq!(fetched, account);
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_bad_input() {
        let service = AccountService::new(InMemoryStore::new());
        service.register("alice", &[Role::Buyer]).await.unwrap();

        assert_eq!(
            service.register("alice", &[Role::Seller]).await.unwrap_err(),
            EngineError::Rejected(CoreError::DuplicateAccount("alice".to_string()))
        );
        assert!(matches!(
            service.register("has space", &[Role::Buyer]).await,
            Err(EngineError::Rejected(CoreError::Validation(_)))
        ));
        assert!(matches!(
            service.register("bob", &[]).await,
            Err(EngineError::Rejected(CoreError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryStore::new();
        let service = AccountService::new(store.clone());
        service.register("alice", &[Role::Buyer]).await.unwrap();

        service.delete("alice").await.unwrap();
        assert!(store.account("alice").await.is_none());
        assert_eq!(
            service.delete("alice").await.unwrap_err(),
            EngineError::Rejected(CoreError::AccountNotFound("alice".to_string()))
        );
        assert!(service.get("alice").await.is_err());
    }

    #[tokio::test]
    async fn test_update_renames_and_replaces_roles() {
        let store = InMemoryStore::new();
        let service = AccountService::new(store.clone());
        service.register("alice", &[Role::Buyer]).await.unwrap();

        let updated = service
            .update(
                "alice",
                AccountUpdate {
                    username: Some("alicia".to_string()),
                    roles: Some(vec![Role::Seller, Role::Seller]),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.username, "alicia");
        assert_eq!(updated.roles, vec![Role::Seller]);
        assert_eq!(updated.version, 2);
        assert!(store.account("alice").await.is_none());

        // Neither field set still bumps the version.
        let same = service
            .update("alicia", AccountUpdate::default())
            .await
            .unwrap();
        assert_eq!(same.roles, vec![Role::Seller]);
        assert_eq!(same.version, 3);
    }

    #[tokio::test]
    async fn test_update_rejections() {
        let service = AccountService::new(InMemoryStore::new());
        service.register("alice", &[Role::Buyer]).await.unwrap();
        service.register("bob", &[Role::Buyer]).await.unwrap();

        let rename_to = |name: &str| AccountUpdate {
            username: Some(name.to_string()),
            roles: None,
        };

        assert_eq!(
            service.update("ghost", rename_to("casper")).await.unwrap_err(),
            EngineError::Rejected(CoreError::AccountNotFound("ghost".to_string()))
        );
        assert_eq!(
            service.update("alice", rename_to("bob")).await.unwrap_err(),
            EngineError::Rejected(CoreError::DuplicateAccount("bob".to_string()))
        );
        assert!(matches!(
            service.update("alice", rename_to("has space")).await,
            Err(EngineError::Rejected(CoreError::Validation(_)))
        ));
        assert!(matches!(
            service
                .update(
                    "alice",
                    AccountUpdate {
                        username: None,
                        roles: Some(vec![]),
                    },
                )
                .await,
            Err(EngineError::Rejected(CoreError::Validation(_)))
        ));

        // Renaming onto itself is allowed.
        assert_eq!(
            service.update("alice", rename_to("alice")).await.unwrap().username,
            "alice"
        );
    }

    #[tokio::test]
    async fn test_rename_keeps_products_and_balance() {
        use crate::{CatalogService, VendingMachine};
        use vend_core::NewProduct;

        let store = InMemoryStore::new();
        let service = AccountService::new(store.clone());
        let catalog = CatalogService::new(store.clone());
        let machine = VendingMachine::new(store.clone());

        service
            .register("seller", &[Role::Seller, Role::Buyer])
            .await
            .unwrap();
        catalog
            .create_product(
                "seller",
                NewProduct {
                    name: "Cola".to_string(),
                    cost_cents: 50,
                    amount_available: 10,
                },
            )
            .await
            .unwrap();
        machine.deposit("seller", 100).await.unwrap();

        service
            .update(
                "seller",
                AccountUpdate {
                    username: Some("vendor".to_string()),
                    roles: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(store.product("Cola").await.unwrap().seller, "vendor");
        assert_eq!(machine.balance("vendor").await.unwrap().cents(), 100);
        assert!(matches!(
            catalog.delete_product("seller", "Cola").await,
            Err(EngineError::Rejected(CoreError::NotProductOwner { .. }))
        ));
        catalog.delete_product("vendor", "Cola").await.unwrap();
    }
}
