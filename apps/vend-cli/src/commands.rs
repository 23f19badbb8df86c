//! # Command Handlers
//!
//! One handler per subcommand. Each returns the JSON to print on success.
//!
//! ## Role Checks
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  deposit, buy, reset, balance          → buyer                          │
//! │  add-product, update-product,                                           │
//! │  delete-product                        → seller (+ ownership in engine) │
//! │  update-account, delete-account        → the account itself             │
//! │  register, products, seed, status      → no principal needed            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde_json::{json, Value};
use tracing::info;

use vend_core::{
    Account, AccountUpdate, CoreError, NewProduct, ProductUpdate, PurchaseLine, Role,
};
use vend_db::Database;
use vend_engine::{AccountService, CatalogService, EngineError, VendingMachine};

use crate::error::{ApiError, ErrorCode};
use crate::Command;

/// Runs one subcommand against an open database.
pub async fn execute(
    db: &Database,
    principal: Option<&str>,
    command: Command,
) -> Result<Value, ApiError> {
    let store = db.store();
    let machine = VendingMachine::new(store.clone());
    let catalog = CatalogService::new(store.clone());
    let accounts = AccountService::new(store);

    match command {
        Command::Register { username, roles } => {
            let roles: Vec<Role> = roles.into_iter().map(Role::from).collect();
            let account = accounts.register(&username, &roles).await?;
            Ok(json!({ "account": account }))
        }

        Command::UpdateAccount {
            username,
            new_name,
            roles,
        } => {
            require_self(&accounts, principal, &username).await?;
            let update = AccountUpdate {
                username: new_name,
                roles: (!roles.is_empty()).then(|| roles.into_iter().map(Role::from).collect()),
            };
            let account = accounts.update(&username, update).await?;
            Ok(json!({ "account": account }))
        }

        Command::DeleteAccount { username } => {
            require_self(&accounts, principal, &username).await?;
            accounts.delete(&username).await?;
            Ok(json!({ "deleted": username }))
        }

        Command::Deposit { amount } => {
            let principal = require_role(&accounts, principal, Role::Buyer).await?;
            let balance = machine.deposit(&principal.username, amount).await?;
            Ok(json!({ "balance_cents": balance.cents() }))
        }

        Command::Buy { items } => {
            let principal = require_role(&accounts, principal, Role::Buyer).await?;
            let purchase = machine.buy(&principal.username, &items).await?;
            Ok(json!({
                "total_spent_cents": purchase.total_spent_cents,
                "items": purchase.descriptions(),
                "lines": purchase.lines,
                "change": purchase.change,
                "message": purchase.to_string(),
            }))
        }

        Command::Reset => {
            let principal = require_role(&accounts, principal, Role::Buyer).await?;
            let outcome = machine.reset(&principal.username).await?;
            Ok(json!({
                "returned_cents": outcome.returned_cents(),
                "change": outcome.change(),
                "message": outcome.to_string(),
            }))
        }

        Command::Balance => {
            let principal = require_role(&accounts, principal, Role::Buyer).await?;
            let balance = machine.balance(&principal.username).await?;
            Ok(json!({
                "username": principal.username,
                "balance_cents": balance.cents(),
            }))
        }

        Command::Products { seller } => {
            let products = match seller {
                Some(seller) => db
                    .products()
                    .list_by_seller(&seller)
                    .await
                    .map_err(|e| ApiError::from(EngineError::StoreFailure(e.into())))?,
                None => catalog.list_products().await?,
            };
            Ok(json!({ "products": products }))
        }

        Command::AddProduct {
            name,
            cost,
            amount,
        } => {
            let seller = require_role(&accounts, principal, Role::Seller).await?;
            let product = catalog
                .create_product(
                    &seller.username,
                    NewProduct {
                        name,
                        cost_cents: cost,
                        amount_available: amount,
                    },
                )
                .await?;
            Ok(json!({ "product": product }))
        }

        Command::UpdateProduct {
            name,
            new_name,
            cost,
            amount,
        } => {
            let seller = require_role(&accounts, principal, Role::Seller).await?;
            let update = ProductUpdate {
                name: new_name,
                cost_cents: cost,
                amount_available: amount,
            };
            let product = catalog
                .update_product(&seller.username, &name, update)
                .await?;
            Ok(json!({ "product": product }))
        }

        Command::DeleteProduct { name } => {
            let seller = require_role(&accounts, principal, Role::Seller).await?;
            catalog.delete_product(&seller.username, &name).await?;
            Ok(json!({ "deleted": name }))
        }

        Command::Seed => seed(&accounts, &catalog).await,

        Command::Status => status(db).await,
    }
}

/// Loads the principal's account and checks it holds `role`.
async fn require_role(
    accounts: &AccountService<vend_db::SqliteStore>,
    principal: Option<&str>,
    role: Role,
) -> Result<Account, ApiError> {
    let username = principal.ok_or_else(|| {
        ApiError::new(
            ErrorCode::Forbidden,
            "No principal given (use --as or VEND_USER)",
        )
    })?;

    let account = accounts.get(username).await?;
    if !account.has_role(role) {
        return Err(ApiError::missing_role(username, role));
    }
    Ok(account)
}

/// Loads the principal's account and checks it is `username`.
async fn require_self(
    accounts: &AccountService<vend_db::SqliteStore>,
    principal: Option<&str>,
    username: &str,
) -> Result<Account, ApiError> {
    let principal = principal.ok_or_else(|| {
        ApiError::new(
            ErrorCode::Forbidden,
            "No principal given (use --as or VEND_USER)",
        )
    })?;

    let account = accounts.get(principal).await?;
    if account.username != username {
        return Err(ApiError::not_own_account(principal, username));
    }
    Ok(account)
}

/// Demo accounts and products. Safe to run twice.
async fn seed(
    accounts: &AccountService<vend_db::SqliteStore>,
    catalog: &CatalogService<vend_db::SqliteStore>,
) -> Result<Value, ApiError> {
    const SELLER: &str = "vendor";
    const BUYER: &str = "buyer";
    const PRODUCTS: &[(&str, i64, i64)] = &[
        ("Cola", 50, 10),
        ("Chips", 30, 5),
        ("Water", 25, 20),
        ("Chocolate", 75, 8),
    ];

    let mut created = Vec::new();

    for (username, role) in [(SELLER, Role::Seller), (BUYER, Role::Buyer)] {
        match accounts.register(username, &[role]).await {
            Ok(account) => created.push(account.username),
            Err(EngineError::Rejected(CoreError::DuplicateAccount(_))) => {}
            Err(err) => return Err(err.into()),
        }
    }

    for (name, cost, amount) in PRODUCTS {
        let product = NewProduct {
            name: name.to_string(),
            cost_cents: *cost,
            amount_available: *amount,
        };
        match catalog.create_product(SELLER, product).await {
            Ok(product) => created.push(product.name),
            Err(EngineError::Rejected(CoreError::DuplicateProduct(_))) => {}
            Err(err) => return Err(err.into()),
        }
    }

    info!(created = created.len(), "Seed complete");
    Ok(json!({ "created": created }))
}

async fn status(db: &Database) -> Result<Value, ApiError> {
    let store_failure = |e: vend_db::DbError| ApiError::from(EngineError::StoreFailure(e.into()));

    let (embedded, applied) = db.migration_status().await.map_err(store_failure)?;
    Ok(json!({
        "healthy": db.health_check().await,
        "migrations": { "embedded": embedded, "applied": applied },
        "accounts": db.accounts().count().await.map_err(store_failure)?,
        "products": db.products().count().await.map_err(store_failure)?,
        "held_cents": db.accounts().total_balance().await.map_err(store_failure)?,
    }))
}

/// Parses `NAME=QTY` (the name may itself contain `=`).
pub fn parse_purchase_line(raw: &str) -> Result<PurchaseLine, String> {
    let (name, quantity) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=QTY, got '{raw}'"))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing product name in '{raw}'"));
    }

    let quantity: i64 = quantity
        .trim()
        .parse()
        .map_err(|_| format!("invalid quantity in '{raw}'"))?;

    Ok(PurchaseLine::new(name, quantity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RoleArg;
    use vend_db::DbConfig;

    async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        execute(&db, None, Command::Seed).await.unwrap();
        db
    }

    #[test]
    fn test_parse_purchase_line() {
        assert_eq!(
            parse_purchase_line("Cola=2").unwrap(),
            PurchaseLine::new("Cola", 2)
        );
        assert_eq!(
            parse_purchase_line("Sparkling Water = 3").unwrap(),
            PurchaseLine::new("Sparkling Water", 3)
        );
        assert_eq!(
            parse_purchase_line("A=B=1").unwrap(),
            PurchaseLine::new("A=B", 1)
        );
        assert!(parse_purchase_line("Cola").is_err());
        assert!(parse_purchase_line("=2").is_err());
        assert!(parse_purchase_line("Cola=two").is_err());
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let db = seeded().await;
        let again = execute(&db, None, Command::Seed).await.unwrap();
        assert_eq!(again["created"], json!([]));
        assert_eq!(db.products().count().await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_buyer_flow() {
        let db = seeded().await;
        let buyer = Some("buyer");

        for amount in [100, 50] {
            execute(&db, buyer, Command::Deposit { amount }).await.unwrap();
        }

        let out = execute(
            &db,
            buyer,
            Command::Buy {
                items: vec![PurchaseLine::new("Cola", 2), PurchaseLine::new("Chips", 1)],
            },
        )
        .await
        .unwrap();
        assert_eq!(out["total_spent_cents"], 130);
        assert_eq!(out["items"][0], "Cola x 2 (cost: 100 cents)");
        assert_eq!(out["change"], json!([{ "coin": 20, "count": 1 }]));

        let out = execute(&db, buyer, Command::Reset).await.unwrap();
        assert_eq!(out["message"], "No deposit to reset");
    }

    #[tokio::test]
    async fn test_role_checks() {
        let db = seeded().await;

        let err = execute(&db, Some("vendor"), Command::Deposit { amount: 50 })
            .await
            .unwrap_err();
        assert_eq!(err.status, 403);

        let err = execute(
            &db,
            Some("buyer"),
            Command::DeleteProduct {
                name: "Cola".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, 403);

        let err = execute(&db, None, Command::Balance).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let err = execute(&db, Some("ghost"), Command::Balance)
            .await
            .unwrap_err();
        assert_eq!(err.status, 404);
    }

    #[tokio::test]
    async fn test_seller_flow() {
        let db = seeded().await;
        let seller = Some("vendor");

        execute(
            &db,
            None,
            Command::Register {
                username: "rival".to_string(),
                roles: vec![RoleArg::Seller],
            },
        )
        .await
        .unwrap();

        let out = execute(
            &db,
            seller,
            Command::UpdateProduct {
                name: "Cola".to_string(),
                new_name: None,
                cost: Some(60),
                amount: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(out["product"]["cost_cents"], 60);
        assert_eq!(out["product"]["amount_available"], 10);

        let err = execute(
            &db,
            Some("rival"),
            Command::DeleteProduct {
                name: "Cola".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, 403);

        let err = execute(
            &db,
            seller,
            Command::AddProduct {
                name: "Cola".to_string(),
                cost: 50,
                amount: 1,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, 409);

        let out = execute(
            &db,
            None,
            Command::Products {
                seller: Some("rival".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(out["products"], json!([]));
    }

    #[tokio::test]
    async fn test_status() {
        let db = seeded().await;
        let out = execute(&db, None, Command::Status).await.unwrap();
        assert_eq!(out["healthy"], true);
        assert_eq!(out["migrations"]["applied"], 1);
        assert_eq!(out["accounts"], 2);
        assert_eq!(out["products"], 4);
        assert_eq!(out["held_cents"], 0);
    }

    #[tokio::test]
    async fn test_account_management() {
        let db = seeded().await;

        let err = execute(
            &db,
            Some("buyer"),
            Command::DeleteAccount {
                username: "vendor".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, 403);

        let err = execute(
            &db,
            None,
            Command::UpdateAccount {
                username: "vendor".to_string(),
                new_name: Some("shop".to_string()),
                roles: vec![],
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let err = execute(
            &db,
            Some("vendor"),
            Command::UpdateAccount {
                username: "vendor".to_string(),
                new_name: Some("buyer".to_string()),
                roles: vec![],
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, 409);

        let out = execute(
            &db,
            Some("vendor"),
            Command::UpdateAccount {
                username: "vendor".to_string(),
                new_name: Some("shop".to_string()),
                roles: vec![RoleArg::Seller, RoleArg::Buyer],
            },
        )
        .await
        .unwrap();
        assert_eq!(out["account"]["username"], "shop");
        assert_eq!(out["account"]["roles"], json!(["buyer", "seller"]));

        // The products moved with the rename.
        let out = execute(
            &db,
            None,
            Command::Products {
                seller: Some("shop".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(out["products"].as_array().unwrap().len(), 4);

        execute(
            &db,
            Some("shop"),
            Command::DeleteAccount {
                username: "shop".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(db.products().count().await.unwrap(), 0);
        assert_eq!(db.accounts().count().await.unwrap(), 1);
    }
}
