use clap::{Args, Parser, Subcommand, ValueEnum};
use mercato_common::Role;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mercato")]
#[command(about = "Mercato marketplace ledger")]
pub struct Cli {
    /// Data directory (overrides the config file)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// JSON config file with data directory and file names
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Who is running the command.
#[derive(Args, Debug, Clone)]
pub struct Credentials {
    #[arg(long)]
    pub user: String,
    #[arg(long)]
    pub password: String,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum RoleArg {
    Customer,
    Seller,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Customer => Role::Customer,
            RoleArg::Seller => Role::Seller,
            RoleArg::Admin => Role::Admin,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account
    Register {
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, value_enum, default_value = "customer")]
        role: RoleArg,
    },
    /// List every product
    Products,
    /// Find products by name or category
    Search { query: String },
    /// List a new product (sellers)
    AddProduct {
        #[command(flatten)]
        auth: Credentials,
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        category: String,
        #[arg(long)]
        stock: u32,
    },
    /// Add stock to one of your products (sellers)
    Restock {
        #[command(flatten)]
        auth: Credentials,
        product: u32,
        quantity: u32,
    },
    /// Inspect or change your cart
    Cart {
        #[command(flatten)]
        auth: Credentials,
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for everything in your cart
    Order {
        #[command(flatten)]
        auth: Credentials,
    },
    /// Show your order history
    Orders {
        #[command(flatten)]
        auth: Credentials,
    },
    /// Record a business expense (sellers)
    Expense {
        #[command(flatten)]
        auth: Credentials,
        amount: f64,
        description: String,
    },
    /// Refund an order (admins)
    Refund {
        #[command(flatten)]
        auth: Credentials,
        order: u32,
    },
    /// Financial reports
    Report {
        #[command(flatten)]
        auth: Credentials,
        #[command(subcommand)]
        kind: ReportKind,
    },
}

#[derive(Subcommand)]
pub enum CartAction {
    Add { product: u32, quantity: u32 },
    Remove { product: u32 },
    Clear,
    Show,
}

/// Optional inclusive date range, `YYYY-MM-DD`.
#[derive(Args, Debug, Clone, Default)]
pub struct Range {
    #[arg(long, requires = "to")]
    pub from: Option<String>,
    #[arg(long, requires = "from")]
    pub to: Option<String>,
}

#[derive(Subcommand)]
pub enum ReportKind {
    /// Revenue, expenses and profit
    Seller {
        #[command(flatten)]
        range: Range,
        /// Print every entry
        #[arg(long)]
        detailed: bool,
        /// Print net movement per day
        #[arg(long)]
        daily: bool,
    },
    /// Spending and refunds
    Customer {
        #[command(flatten)]
        range: Range,
        #[arg(long)]
        detailed: bool,
        /// Print purchases per month
        #[arg(long)]
        monthly: bool,
    },
}
