//! # In-Memory Store
//!
//! A [`VendingStore`] backed by two maps behind one async mutex. Used by the
//! engine tests and by anything that wants the engine without SQLite.
//!
//! ## Isolation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  begin()  ── lock_owned() ──► guard held for the whole transaction      │
//! │                │                                                        │
//! │                ▼   reads see the guarded state directly                 │
//! │  first write ── staged = guard.clone()                                  │
//! │                │   later reads and writes go to `staged`                │
//! │                ▼                                                        │
//! │  commit() ── *guard = staged ──► published, lock released               │
//! │  drop()   ── staged discarded ──► lock released                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Transactions run one at a time, so they are serializable. Saves still
//! enforce the version check so the store behaves like the SQLite one.
//! The first write copies every row, which is fine at test scale but makes
//! this store a poor fit for large data sets.
//!
//! ## Fault Injection
//! [`InMemoryStore::fail_account_writes`] and
//! [`InMemoryStore::fail_product_writes`] make the matching `save_*` calls
//! fail with `StoreError::Backend`, for exercising rollback paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use vend_core::{Account, Product};

use crate::store::{
    AccountStore, CatalogStore, StoreError, StoreResult, StoreTransaction, VendingStore,
};

/// Rows keyed by id.
#[derive(Debug, Clone, Default)]
struct MemoryState {
    accounts: BTreeMap<String, Account>,
    products: BTreeMap<String, Product>,
}

#[derive(Debug, Default)]
struct FaultSwitches {
    accounts: AtomicBool,
    products: AtomicBool,
}

/// Shared handle; clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<FaultSwitches>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore::default()
    }

    /// Makes every following `save_account` fail until switched off.
    pub fn fail_account_writes(&self, fail: bool) {
        self.faults.accounts.store(fail, Ordering::SeqCst);
    }

    /// Makes every following `save_product` fail until switched off.
    pub fn fail_product_writes(&self, fail: bool) {
        self.faults.products.store(fail, Ordering::SeqCst);
    }

    /// Committed state of one account, outside any transaction.
    pub async fn account(&self, username: &str) -> Option<Account> {
        let state = self.state.lock().await;
        state
            .accounts
            .values()
            .find(|a| a.username == username)
            .cloned()
    }

    /// Committed state of one product, outside any transaction.
    pub async fn product(&self, name: &str) -> Option<Product> {
        let state = self.state.lock().await;
        state.products.values().find(|p| p.name == name).cloned()
    }
}

impl VendingStore for InMemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> StoreResult<MemoryTransaction> {
        let live = Arc::clone(&self.state).lock_owned().await;
        Ok(MemoryTransaction {
            live,
            staged: None,
            faults: Arc::clone(&self.faults),
        })
    }
}

/// An open in-memory transaction. Holds the store lock until dropped.
#[derive(Debug)]
pub struct MemoryTransaction {
    live: OwnedMutexGuard<MemoryState>,
    /// Private copy made by the first write. `None` while only reading.
    staged: Option<MemoryState>,
    faults: Arc<FaultSwitches>,
}

impl MemoryTransaction {
    fn state(&self) -> &MemoryState {
        self.staged.as_ref().unwrap_or(&*self.live)
    }

    fn state_mut(&mut self) -> &mut MemoryState {
        let live = &self.live;
        self.staged.get_or_insert_with(|| MemoryState::clone(live))
    }
}

fn check_version(
    stored: Option<i64>,
    expected: i64,
    entity: &'static str,
    key: &str,
) -> StoreResult<()> {
    match stored {
        Some(version) if version == expected => Ok(()),
        None if expected == 0 => Ok(()),
        _ => Err(StoreError::conflict(entity, key)),
    }
}

impl AccountStore for MemoryTransaction {
    async fn find_account(&mut self, username: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .state()
            .accounts
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn save_account(&mut self, account: &Account) -> StoreResult<Account> {
        if self.faults.accounts.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(format!(
                "injected write failure for account '{}'",
                account.username
            )));
        }

        let previous = self.state().accounts.get(&account.id);
        check_version(
            previous.map(|a| a.version),
            account.version,
            "account",
            &account.username,
        )?;
        let renamed_from = previous
            .filter(|a| a.username != account.username)
            .map(|a| a.username.clone());

        let taken = self
            .state()
            .accounts
            .values()
            .any(|a| a.id != account.id && a.username == account.username);
        if taken {
            return Err(StoreError::duplicate("account", &account.username));
        }

        let mut stored = account.clone();
        stored.version += 1;

        let state = self.state_mut();
        // Products follow their seller's new name.
        if let Some(old) = renamed_from {
            for product in state.products.values_mut().filter(|p| p.seller == old) {
                product.seller = stored.username.clone();
            }
        }
        state.accounts.insert(stored.id.clone(), stored.clone());

        debug!(username = %stored.username, version = stored.version, "Staged account");
        Ok(stored)
    }

    async fn delete_account(&mut self, username: &str) -> StoreResult<bool> {
        if !self
            .state()
            .accounts
            .values()
            .any(|a| a.username == username)
        {
            return Ok(false);
        }

        let state = self.state_mut();
        state.accounts.retain(|_, a| a.username != username);
        state.products.retain(|_, p| p.seller != username);
        Ok(true)
    }
}

impl CatalogStore for MemoryTransaction {
    async fn find_product(&mut self, name: &str) -> StoreResult<Option<Product>> {
        Ok(self
            .state()
            .products
            .values()
            .find(|p| p.name == name)
            .cloned())
    }

    async fn save_product(&mut self, product: &Product) -> StoreResult<Product> {
        if self.faults.products.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(format!(
                "injected write failure for product '{}'",
                product.name
            )));
        }

        let state = self.state();
        check_version(
            state.products.get(&product.id).map(|p| p.version),
            product.version,
            "product",
            &product.name,
        )?;

        let taken = state
            .products
            .values()
            .any(|p| p.id != product.id && p.name == product.name);
        if taken {
            return Err(StoreError::duplicate("product", &product.name));
        }

        if !state.accounts.values().any(|a| a.username == product.seller) {
            return Err(StoreError::Backend(format!(
                "seller '{}' does not exist",
                product.seller
            )));
        }

        let mut stored = product.clone();
        stored.version += 1;
        self.state_mut()
            .products
            .insert(stored.id.clone(), stored.clone());

        debug!(
            product = %stored.name,
            amount_available = stored.amount_available,
            version = stored.version,
            "Staged product"
        );
        Ok(stored)
    }

    async fn list_products(&mut self) -> StoreResult<Vec<Product>> {
        let mut products: Vec<Product> = self.state().products.values().cloned().collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn delete_product(&mut self, name: &str) -> StoreResult<bool> {
        if !self.state().products.values().any(|p| p.name == name) {
            return Ok(false);
        }
        self.state_mut().products.retain(|_, p| p.name != name);
        Ok(true)
    }
}

impl StoreTransaction for MemoryTransaction {
    async fn commit(self) -> StoreResult<()> {
        let MemoryTransaction {
            mut live, staged, ..
        } = self;
        if let Some(staged) = staged {
            *live = staged;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use vend_core::Role;

    fn account(username: &str) -> Account {
        let now = Utc::now();
        Account {
            id: format!("acc-{username}"),
            username: username.to_string(),
            roles: vec![Role::Buyer],
            balance_cents: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn product(name: &str, seller: &str) -> Product {
        let now = Utc::now();
        Product {
            id: format!("prod-{name}"),
            name: name.to_string(),
            cost_cents: 50,
            amount_available: 10,
            seller: seller.to_string(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let store = InMemoryStore::new();

        let mut tx = store.begin().await.unwrap();
        let saved = tx.save_account(&account("alice")).await.unwrap();
        assert_eq!(saved.version, 1);
        tx.commit().await.unwrap();

        let stored = store.account("alice").await.unwrap();
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_drop_discards_writes() {
        let store = InMemoryStore::new();

        {
            let mut tx = store.begin().await.unwrap();
            tx.save_account(&account("alice")).await.unwrap();
            // Visible inside the transaction.
            assert!(tx.find_account("alice").await.unwrap().is_some());
        }

        assert!(store.account("alice").await.is_none());
    }

    #[tokio::test]
    async fn test_transaction_holds_the_lock() {
        let store = InMemoryStore::new();

        let tx = store.begin().await.unwrap();
        assert!(store.state.try_lock().is_err());
        drop(tx);
        assert!(store.state.try_lock().is_ok());
    }

    #[tokio::test]
    async fn test_reads_share_committed_state() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.save_account(&account("alice")).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_account("alice").await.unwrap().is_some());
        assert!(tx.list_products().await.unwrap().is_empty());
        assert!(!tx.delete_product("Cola").await.unwrap());
        assert!(!tx.delete_account("bob").await.unwrap());
        assert!(tx.staged.is_none());

        tx.save_account(&account("bob")).await.unwrap();
        assert!(tx.staged.is_some());
        // Committed state is untouched until commit.
        assert!(tx.live.accounts.values().all(|a| a.username != "bob"));
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let saved = tx.save_account(&account("alice")).await.unwrap();

        // Writing the version-0 copy again is a stale write.
        let err = tx.save_account(&account("alice")).await.unwrap_err();
        assert_eq!(err, StoreError::conflict("account", "alice"));

        let mut next = saved.clone();
        next.balance_cents = 50;
        assert_eq!(tx.save_account(&next).await.unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_duplicate_keys_rejected() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.save_account(&account("alice")).await.unwrap();

        let mut clash = account("alice");
        clash.id = "another-id".to_string();
        assert_eq!(
            tx.save_account(&clash).await.unwrap_err(),
            StoreError::duplicate("account", "alice")
        );

        tx.save_product(&product("Cola", "alice")).await.unwrap();
        let mut clash = product("Cola", "alice");
        clash.id = "another-id".to_string();
        assert_eq!(
            tx.save_product(&clash).await.unwrap_err(),
            StoreError::duplicate("product", "Cola")
        );
    }

    #[tokio::test]
    async fn test_product_requires_existing_seller() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let err = tx.save_product(&product("Cola", "nobody")).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[tokio::test]
    async fn test_delete_account_removes_its_products() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.save_account(&account("seller")).await.unwrap();
        tx.save_product(&product("Cola", "seller")).await.unwrap();

        assert!(tx.delete_account("seller").await.unwrap());
        assert!(tx.find_product("Cola").await.unwrap().is_none());
        assert!(!tx.delete_account("seller").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_products_sorted_by_name() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.save_account(&account("seller")).await.unwrap();
        for name in ["Water", "Chips", "Cola"] {
            tx.save_product(&product(name, "seller")).await.unwrap();
        }

        let names: Vec<String> = tx
            .list_products()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Chips", "Cola", "Water"]);
    }

    #[tokio::test]
    async fn test_injected_faults() {
        let store = InMemoryStore::new();
        store.fail_account_writes(true);

        let mut tx = store.begin().await.unwrap();
        assert!(matches!(
            tx.save_account(&account("alice")).await,
            Err(StoreError::Backend(_))
        ));
        drop(tx);

        store.fail_account_writes(false);
        let mut tx = store.begin().await.unwrap();
        assert!(tx.save_account(&account("alice")).await.is_ok());
    }

    #[tokio::test]
    async fn test_account_rename_moves_products() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let seller = tx.save_account(&account("seller")).await.unwrap();
        tx.save_account(&account("other")).await.unwrap();
        tx.save_product(&product("Cola", "seller")).await.unwrap();
        tx.save_product(&product("Chips", "other")).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let mut renamed = seller.clone();
        renamed.username = "vendor".to_string();
        assert_eq!(tx.save_account(&renamed).await.unwrap().version, 2);
        tx.commit().await.unwrap();

        assert!(store.account("seller").await.is_none());
        assert_eq!(store.product("Cola").await.unwrap().seller, "vendor");
        assert_eq!(store.product("Chips").await.unwrap().seller, "other");
    }

    #[tokio::test]
    async fn test_rename_onto_taken_name_is_duplicate() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let alice = tx.save_account(&account("alice")).await.unwrap();
        tx.save_account(&account("bob")).await.unwrap();

        let mut clash = alice.clone();
        clash.username = "bob".to_string();
        assert_eq!(
            tx.save_account(&clash).await.unwrap_err(),
            StoreError::duplicate("account", "bob")
        );
    }
}
