//! # Vending Machine
//!
//! Deposit, buy, reset and balance for an authenticated principal.
//!
//! ## Buy Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  buy("alice", [Cola x 2, Chips x 1])                                    │
//! │       │                                                                 │
//! │       ├── empty list? ──────────────────────────► EmptyPurchase         │
//! │       ▼                                                                 │
//! │  begin transaction                                                      │
//! │       │                                                                 │
//! │       ├── per line: quantity, lookup, stock, cost ► rejection           │
//! │       ├── load account, funds check ────────────► rejection             │
//! │       ├── save each product (stock - quantity)                          │
//! │       ├── save account (balance = 0)                                    │
//! │       ▼                                                                 │
//! │  commit ──► Purchase { total, lines, change }                           │
//! │                                                                         │
//! │  Any error before commit drops the transaction: nothing is kept.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The machine holds no state between calls. The principal is always an
//! explicit argument.

use chrono::Utc;
use tracing::{debug, error, info, warn};

use vend_core::change::breakdown;
use vend_core::coins;
use vend_core::validation::validate_quantity;
use vend_core::{CoreError, Money, Purchase, PurchaseLine, PurchasePlan, ResetOutcome};

use crate::accounts::require_account;
use crate::error::{EngineError, EngineResult};
use crate::store::{AccountStore, CatalogStore, StoreTransaction, VendingStore};

/// The vending transaction engine.
///
/// ## Usage
/// ```rust,ignore
/// let machine = VendingMachine::new(store);
/// machine.deposit("alice", 100).await?;
/// let purchase = machine.buy("alice", &[PurchaseLine::new("Cola", 1)]).await?;
/// println!("{purchase}");
/// ```
#[derive(Debug, Clone)]
pub struct VendingMachine<S> {
    store: S,
}

impl<S: VendingStore> VendingMachine<S> {
    pub fn new(store: S) -> Self {
        VendingMachine { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Adds one coin to the principal's balance and returns the new balance.
    ///
    /// ## Errors
    /// - `InvalidDenomination` for anything but 5, 10, 20, 50 or 100
    /// - `AccountNotFound`
    pub async fn deposit(&self, principal: &str, amount_cents: i64) -> EngineResult<Money> {
        info!(principal, amount_cents, "Processing deposit");
        let result = self.run_deposit(principal, amount_cents).await;
        log_failure("deposit", principal, &result);
        result
    }

    async fn run_deposit(&self, principal: &str, amount_cents: i64) -> EngineResult<Money> {
        let coin = coins::validate(amount_cents)?;

        let mut tx = self.store.begin().await?;
        let mut account = require_account(&mut tx, principal).await?;

        let balance = account
            .balance()
            .checked_add(Money::from_cents(coin.cents()))
            .ok_or(CoreError::AmountOverflow("balance"))?;

        account.balance_cents = balance.cents();
        account.updated_at = Utc::now();
        tx.save_account(&account).await?;
        tx.commit().await?;

        info!(principal, balance_cents = balance.cents(), "Deposit accepted");
        Ok(balance)
    }

    /// Buys every line or nothing, spends the balance and returns the rest
    /// as change.
    ///
    /// Lines naming the same product stay separate in the receipt, but
    /// share that product's stock.
    ///
    /// ## Errors
    /// - `EmptyPurchase`
    /// - `Validation` for a quantity below 1
    /// - `ProductNotFound`, `InsufficientStock`
    /// - `AccountNotFound`, `InsufficientFunds`
    pub async fn buy(&self, principal: &str, items: &[PurchaseLine]) -> EngineResult<Purchase> {
        info!(principal, lines = items.len(), "Processing purchase");
        let result = self.run_buy(principal, items).await;
        log_failure("buy", principal, &result);
        result
    }

    async fn run_buy(&self, principal: &str, items: &[PurchaseLine]) -> EngineResult<Purchase> {
        if items.is_empty() {
            return Err(CoreError::EmptyPurchase.into());
        }

        let mut tx = self.store.begin().await?;
        let mut plan = PurchasePlan::new();

        for line in items {
            validate_quantity(line.quantity)?;

            if !plan.is_staged(&line.product_name) {
                let product = tx
                    .find_product(&line.product_name)
                    .await?
                    .ok_or_else(|| CoreError::ProductNotFound(line.product_name.clone()))?;
                plan.stage(product);
            }

            let served = plan.add_line(line)?;
            debug!(
                product = %served.product_name,
                quantity = served.quantity,
                cost_cents = served.cost_cents,
                "Line accepted"
            );
        }

        let mut account = require_account(&mut tx, principal).await?;
        info!(
            principal,
            balance_cents = account.balance_cents,
            total_cents = plan.total().cents(),
            "Purchase priced"
        );

        let settled = plan.settle(account.balance_cents)?;
        let now = Utc::now();

        for mut product in settled.products {
            product.updated_at = now;
            let stored = tx.save_product(&product).await?;
            debug!(
                product = %stored.name,
                amount_available = stored.amount_available,
                "Stock decremented"
            );
        }

        account.balance_cents = 0;
        account.updated_at = now;
        tx.save_account(&account).await?;
        tx.commit().await?;

        info!(
            principal,
            total_cents = settled.purchase.total_spent_cents,
            change_cents = settled.change_cents,
            "Purchase completed"
        );
        Ok(settled.purchase)
    }

    /// Hands the whole balance back as coins.
    ///
    /// A zero balance yields `NothingToReset` and writes nothing.
    pub async fn reset(&self, principal: &str) -> EngineResult<ResetOutcome> {
        info!(principal, "Processing reset");
        let result = self.run_reset(principal).await;
        log_failure("reset", principal, &result);
        result
    }

    async fn run_reset(&self, principal: &str) -> EngineResult<ResetOutcome> {
        let mut tx = self.store.begin().await?;
        let mut account = require_account(&mut tx, principal).await?;

        if account.balance_cents == 0 {
            info!(principal, "No deposit to reset");
            return Ok(ResetOutcome::NothingToReset);
        }

        let amount_cents = account.balance_cents;
        let change = breakdown(amount_cents);

        account.balance_cents = 0;
        account.updated_at = Utc::now();
        tx.save_account(&account).await?;
        tx.commit().await?;

        info!(principal, amount_cents, "Deposit returned");
        Ok(ResetOutcome::Returned {
            amount_cents,
            change,
        })
    }

    /// Current balance of the principal. Read-only.
    pub async fn balance(&self, principal: &str) -> EngineResult<Money> {
        let result = self.run_balance(principal).await;
        log_failure("balance", principal, &result);
        result
    }

    async fn run_balance(&self, principal: &str) -> EngineResult<Money> {
        let mut tx = self.store.begin_read().await?;
        let account = require_account(&mut tx, principal).await?;
        Ok(account.balance())
    }
}

/// Rejections are expected traffic; store failures are not.
pub(crate) fn log_failure<T>(operation: &'static str, principal: &str, result: &EngineResult<T>) {
    match result {
        Err(EngineError::Rejected(err)) => {
            warn!(operation, principal, error = %err, "Request rejected");
        }
        Err(EngineError::StoreFailure(err)) => {
            error!(operation, principal, error = %err, "Store failure, rolled back");
        }
        Ok(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use crate::store::StoreError;
    use crate::{AccountService, CatalogService};
    use std::sync::Arc;
    use vend_core::{NewProduct, Role};

    const SELLER: &str = "seller";
    const BUYER: &str = "alice";

    /// A store with one seller, one buyer and the given products.
    async fn setup(products: &[(&str, i64, i64)]) -> (VendingMachine<InMemoryStore>, InMemoryStore) {
        let store = InMemoryStore::new();
        let accounts = AccountService::new(store.clone());
        accounts.register(SELLER, &[Role::Seller]).await.unwrap();
        accounts.register(BUYER, &[Role::Buyer]).await.unwrap();

        let catalog = CatalogService::new(store.clone());
        for (name, cost, stock) in products {
            catalog
                .create_product(
                    SELLER,
                    NewProduct {
                        name: name.to_string(),
                        cost_cents: *cost,
                        amount_available: *stock,
                    },
                )
                .await
                .unwrap();
        }

        (VendingMachine::new(store.clone()), store)
    }

    async fn fund(machine: &VendingMachine<InMemoryStore>, coins: &[i64]) {
        for coin in coins {
            machine.deposit(BUYER, *coin).await.unwrap();
        }
    }

    async fn balance_of(store: &InMemoryStore) -> i64 {
        store.account(BUYER).await.unwrap().balance_cents
    }

    async fn stock_of(store: &InMemoryStore, name: &str) -> i64 {
        store.product(name).await.unwrap().amount_available
    }

    // =========================================================================
    // Deposit
    // =========================================================================

    #[tokio::test]
    async fn test_deposit_accumulates() {
        let (machine, store) = setup(&[]).await;

        assert_eq!(machine.deposit(BUYER, 50).await.unwrap().cents(), 50);
        assert_eq!(machine.deposit(BUYER, 100).await.unwrap().cents(), 150);
        assert_eq!(balance_of(&store).await, 150);
    }

    #[tokio::test]
    async fn test_deposit_rejects_invalid_coin() {
        let (machine, store) = setup(&[]).await;
        fund(&machine, &[50]).await;

        for amount in [25, 0, -5, 7, 200] {
            let err = machine.deposit(BUYER, amount).await.unwrap_err();
            assert_eq!(
                err,
                EngineError::Rejected(CoreError::InvalidDenomination { amount })
            );
        }
        assert_eq!(balance_of(&store).await, 50);
    }

    #[tokio::test]
    async fn test_deposit_unknown_account() {
        let (machine, _) = setup(&[]).await;
        let err = machine.deposit("ghost", 50).await.unwrap_err();
        assert_eq!(
            err.rejection(),
            Some(&CoreError::AccountNotFound("ghost".to_string()))
        );
    }

    // =========================================================================
    // Buy
    // =========================================================================

    #[tokio::test]
    async fn test_buy_single_product() {
        let (machine, store) = setup(&[("Cola", 50, 10)]).await;
        fund(&machine, &[100]).await;

        let purchase = machine
            .buy(BUYER, &[PurchaseLine::new("Cola", 1)])
            .await
            .unwrap();

        assert_eq!(purchase.total_spent_cents, 50);
        assert_eq!(purchase.change.to_pairs(), vec![(50, 1)]);
        assert_eq!(balance_of(&store).await, 0);
        assert_eq!(stock_of(&store, "Cola").await, 9);
    }

    #[tokio::test]
    async fn test_buy_multiple_products() {
        let (machine, store) = setup(&[("Cola", 50, 10), ("Chips", 30, 5)]).await;
        fund(&machine, &[100, 100]).await;

        let purchase = machine
            .buy(
                BUYER,
                &[PurchaseLine::new("Cola", 2), PurchaseLine::new("Chips", 1)],
            )
            .await
            .unwrap();

        assert_eq!(purchase.total_spent_cents, 130);
        assert_eq!(
            purchase.descriptions(),
            vec![
                "Cola x 2 (cost: 100 cents)".to_string(),
                "Chips x 1 (cost: 30 cents)".to_string(),
            ]
        );
        assert_eq!(purchase.change.to_pairs(), vec![(50, 1), (20, 1)]);
        assert_eq!(stock_of(&store, "Cola").await, 8);
        assert_eq!(stock_of(&store, "Chips").await, 4);
        assert_eq!(balance_of(&store).await, 0);
    }

    #[tokio::test]
    async fn test_buy_exact_amount_gives_no_change() {
        let (machine, _) = setup(&[("Cola", 50, 10)]).await;
        fund(&machine, &[50]).await;

        let purchase = machine
            .buy(BUYER, &[PurchaseLine::new("Cola", 1)])
            .await
            .unwrap();
        assert!(purchase.change.is_empty());
        assert!(purchase.to_string().ends_with("Change: No change"));
    }

    #[tokio::test]
    async fn test_buy_insufficient_stock_changes_nothing() {
        let (machine, store) = setup(&[("Cola", 50, 10)]).await;
        fund(&machine, &[100, 100]).await;

        let err = machine
            .buy(BUYER, &[PurchaseLine::new("Cola", 15)])
            .await
            .unwrap_err();

        assert_eq!(
            err.rejection(),
            Some(&CoreError::InsufficientStock {
                product: "Cola".to_string(),
                available: 10,
                requested: 15,
            })
        );
        assert_eq!(balance_of(&store).await, 200);
        assert_eq!(stock_of(&store, "Cola").await, 10);
    }

    #[tokio::test]
    async fn test_buy_insufficient_funds_changes_nothing() {
        let (machine, store) = setup(&[("Cola", 50, 10)]).await;
        fund(&machine, &[20, 5]).await;

        let err = machine
            .buy(BUYER, &[PurchaseLine::new("Cola", 1)])
            .await
            .unwrap_err();

        assert_eq!(
            err.rejection(),
            Some(&CoreError::InsufficientFunds {
                balance: 25,
                required: 50,
            })
        );
        assert_eq!(balance_of(&store).await, 25);
        assert_eq!(stock_of(&store, "Cola").await, 10);
    }

    #[tokio::test]
    async fn test_buy_rejects_empty_and_bad_lines() {
        let (machine, store) = setup(&[("Cola", 50, 10)]).await;
        fund(&machine, &[100]).await;

        assert_eq!(
            machine.buy(BUYER, &[]).await.unwrap_err(),
            EngineError::Rejected(CoreError::EmptyPurchase)
        );

        let err = machine
            .buy(
                BUYER,
                &[PurchaseLine::new("Cola", 1), PurchaseLine::new("Cola", 0)],
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Rejected(CoreError::Validation(_))
        ));

        let err = machine
            .buy(
                BUYER,
                &[PurchaseLine::new("Cola", 1), PurchaseLine::new("Ghost", 1)],
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.rejection(),
            Some(&CoreError::ProductNotFound("Ghost".to_string()))
        );

        assert_eq!(balance_of(&store).await, 100);
        assert_eq!(stock_of(&store, "Cola").await, 10);
    }

    #[tokio::test]
    async fn test_buy_repeated_product_shares_stock() {
        let (machine, store) = setup(&[("Cola", 50, 10)]).await;
        fund(&machine, &[100, 100, 100, 100, 100, 100]).await;

        // 6 + 6 would oversell a stock of 10.
        let err = machine
            .buy(
                BUYER,
                &[PurchaseLine::new("Cola", 6), PurchaseLine::new("Cola", 6)],
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.rejection(),
            Some(&CoreError::InsufficientStock {
                product: "Cola".to_string(),
                available: 4,
                requested: 6,
            })
        );
        assert_eq!(stock_of(&store, "Cola").await, 10);

        let purchase = machine
            .buy(
                BUYER,
                &[PurchaseLine::new("Cola", 6), PurchaseLine::new("Cola", 4)],
            )
            .await
            .unwrap();
        assert_eq!(purchase.lines.len(), 2);
        assert_eq!(purchase.total_spent_cents, 500);
        assert_eq!(purchase.change.to_pairs(), vec![(100, 1)]);
        assert_eq!(stock_of(&store, "Cola").await, 0);
    }

    // =========================================================================
    // Atomicity
    // =========================================================================

    #[tokio::test]
    async fn test_failed_balance_write_keeps_stock() {
        let (machine, store) = setup(&[("Cola", 50, 10)]).await;
        fund(&machine, &[100]).await;

        store.fail_account_writes(true);
        let err = machine
            .buy(BUYER, &[PurchaseLine::new("Cola", 1)])
            .await
            .unwrap_err();
        store.fail_account_writes(false);

        assert!(err.is_store_failure());
        assert!(err.rejection().is_none());
        assert_eq!(stock_of(&store, "Cola").await, 10);
        assert_eq!(balance_of(&store).await, 100);
    }

    #[tokio::test]
    async fn test_failed_stock_write_keeps_balance() {
        let (machine, store) = setup(&[("Cola", 50, 10), ("Chips", 30, 5)]).await;
        fund(&machine, &[100, 100]).await;

        store.fail_product_writes(true);
        let err = machine
            .buy(
                BUYER,
                &[PurchaseLine::new("Cola", 1), PurchaseLine::new("Chips", 1)],
            )
            .await
            .unwrap_err();
        store.fail_product_writes(false);

        assert!(matches!(
            err,
            EngineError::StoreFailure(StoreError::Backend(_))
        ));
        assert_eq!(balance_of(&store).await, 200);
        assert_eq!(stock_of(&store, "Cola").await, 10);
        assert_eq!(stock_of(&store, "Chips").await, 5);
    }

    // =========================================================================
    // Reset and balance
    // =========================================================================

    #[tokio::test]
    async fn test_reset_returns_coins() {
        let (machine, store) = setup(&[]).await;
        fund(&machine, &[50, 20, 5]).await;

        let outcome = machine.reset(BUYER).await.unwrap();
        assert_eq!(outcome.returned_cents(), 75);
        assert_eq!(outcome.change().to_pairs(), vec![(50, 1), (20, 1), (5, 1)]);
        assert_eq!(
            outcome.to_string(),
            "Deposit reset successfully. Returned: 1 x 50 cents, 1 x 20 cents, 1 x 5 cents"
        );
        assert_eq!(balance_of(&store).await, 0);
    }

    #[tokio::test]
    async fn test_reset_with_zero_balance_writes_nothing() {
        let (machine, store) = setup(&[]).await;
        let before = store.account(BUYER).await.unwrap();

        let outcome = machine.reset(BUYER).await.unwrap();
        assert_eq!(outcome, ResetOutcome::NothingToReset);
        assert!(outcome.change().is_empty());

        let after = store.account(BUYER).await.unwrap();
        assert_eq!(after.version, before.version);
    }

    #[tokio::test]
    async fn test_balance_inquiry() {
        let (machine, _) = setup(&[]).await;
        assert!(machine.balance(BUYER).await.unwrap().is_zero());
        fund(&machine, &[10, 10]).await;
        assert_eq!(machine.balance(BUYER).await.unwrap().cents(), 20);
        assert!(machine.balance("ghost").await.is_err());
    }

    // =========================================================================
    // Concurrency
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_buys_never_oversell() {
        let (machine, store) = setup(&[("Cola", 50, 5)]).await;
        let accounts = AccountService::new(store.clone());

        let buyers: Vec<String> = (0..20).map(|i| format!("buyer-{i}")).collect();
        for buyer in &buyers {
            accounts.register(buyer, &[Role::Buyer]).await.unwrap();
            machine.deposit(buyer, 50).await.unwrap();
        }

        let machine = Arc::new(machine);
        let handles: Vec<_> = buyers
            .iter()
            .cloned()
            .map(|buyer| {
                let machine = Arc::clone(&machine);
                tokio::spawn(async move {
                    machine
                        .buy(&buyer, &[PurchaseLine::new("Cola", 1)])
                        .await
                })
            })
            .collect();

        let mut sold = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => sold += 1,
                Err(err) => assert!(matches!(
                    err.rejection(),
                    Some(CoreError::InsufficientStock { .. })
                )),
            }
        }

        assert_eq!(sold, 5);
        assert_eq!(stock_of(&store, "Cola").await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_deposits_are_not_lost() {
        let (machine, store) = setup(&[]).await;
        let machine = Arc::new(machine);

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let machine = Arc::clone(&machine);
                tokio::spawn(async move { machine.deposit(BUYER, 10).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(balance_of(&store).await, 500);
    }
}
