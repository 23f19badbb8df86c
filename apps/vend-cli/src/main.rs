//! # vend: Vending Machine Command Line
//!
//! Opens the SQLite database, runs one subcommand and prints JSON.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Initialize tracing (stderr)                                         │
//! │  2. Load CliConfig from VEND_* environment variables                    │
//! │  3. Open the database (pool + migrations)                               │
//! │  4. Execute the subcommand                                              │
//! │  5. Print the result on stdout, or ApiError JSON on stderr              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```text
//! $ vend seed
//! $ vend --as buyer deposit 100
//! $ vend --as buyer buy Cola=1 Chips=1
//! {"change":[{"coin":20,"count":1}],"total_spent_cents":80,...}
//! ```

mod commands;
mod config;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vend_core::{PurchaseLine, Role};
use vend_db::Database;

use crate::config::CliConfig;
use crate::error::ApiError;

#[derive(Debug, Parser)]
#[command(name = "vend", version, about = "Coin-operated vending machine")]
struct Cli {
    /// SQLite database file (overrides VEND_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Account the command runs as
    #[arg(long = "as", env = "VEND_USER", global = true)]
    principal: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account
    Register {
        username: String,

        /// Repeat for several roles
        #[arg(long = "role", value_enum, required = true)]
        roles: Vec<RoleArg>,
    },

    /// Rename your account or replace its roles
    UpdateAccount {
        username: String,

        /// New username
        #[arg(long = "name")]
        new_name: Option<String>,

        /// Replaces all roles; repeat for several
        #[arg(long = "role", value_enum)]
        roles: Vec<RoleArg>,
    },

    /// Delete your account and the products you sell
    DeleteAccount { username: String },

    /// Insert one coin (5, 10, 20, 50 or 100 cents)
    Deposit {
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },

    /// Buy products, e.g. `buy Cola=2 Chips=1`
    Buy {
        #[arg(value_parser = commands::parse_purchase_line, required = true)]
        items: Vec<PurchaseLine>,
    },

    /// Return the whole balance as coins
    Reset,

    /// Show the current balance
    Balance,

    /// List products
    Products {
        /// Only products owned by this seller
        #[arg(long)]
        seller: Option<String>,
    },

    /// Add a product you sell
    AddProduct {
        name: String,

        /// Price in cents (multiple of 5)
        #[arg(long, allow_negative_numbers = true)]
        cost: i64,

        /// Units in stock
        #[arg(long, allow_negative_numbers = true)]
        amount: i64,
    },

    /// Change a product you sell
    UpdateProduct {
        name: String,

        /// Rename the product
        #[arg(long = "name")]
        new_name: Option<String>,

        #[arg(long, allow_negative_numbers = true)]
        cost: Option<i64>,

        #[arg(long, allow_negative_numbers = true)]
        amount: Option<i64>,
    },

    /// Remove a product you sell
    DeleteProduct { name: String },

    /// Create demo accounts and products
    Seed,

    /// Database health and totals
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    Buyer,
    Seller,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Buyer => Role::Buyer,
            RoleArg::Seller => Role::Seller,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => {
            print_json(&output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprint_json(&err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<serde_json::Value, ApiError> {
    let config = CliConfig::load()
        .context("Failed to load configuration")?
        .with_db_path(cli.db);

    let db = open_database(&config).await?;
    let result = commands::execute(&db, cli.principal.as_deref(), cli.command).await;
    db.close().await;
    result
}

async fn open_database(config: &CliConfig) -> anyhow::Result<Database> {
    info!(path = %config.db_path.display(), "Opening database");
    Database::new(config.db_config())
        .await
        .with_context(|| format!("Failed to open database at {}", config.db_path.display()))
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,vend=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json(value: &impl Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(err) => tracing::error!(error = %err, "Failed to serialize output"),
    }
}

fn eprint_json(value: &impl Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => eprintln!("{text}"),
        Err(err) => tracing::error!(error = %err, "Failed to serialize error"),
    }
}
