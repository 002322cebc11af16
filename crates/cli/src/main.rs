//! LineMart CLI - command-line access to the customer storefront.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password from the flag or LINEMART_PASSWORD)
//! lm-cli login amina --password hunter22
//!
//! # Browse the catalog
//! lm-cli products --search milk
//! lm-cli categories
//!
//! # Orders and deliveries
//! lm-cli orders
//! lm-cli cancel-order 42
//! lm-cli track TRK-0042
//!
//! # Follow live data until Ctrl+C
//! lm-cli watch product_updates notifications --interval 10
//! ```
//!
//! # Commands
//!
//! - `login`, `register`, `logout`, `whoami` - Account session
//! - `products`, `categories` - Catalog (with cashier fallback)
//! - `orders`, `cancel-order`, `track` - Orders and deliveries
//! - `cart` - Server-side cart and checkout totals
//! - `notifications` - List or mark notifications read
//! - `watch` - Print polled updates as they arrive

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use linemart_core::{CategoryId, NotificationId, OrderId};
use linemart_storefront::config::StorefrontConfig;
use linemart_storefront::{AppError, AppShell};

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "lm-cli")]
#[command(author, version, about = "LineMart storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in as a customer
    Login {
        /// Account username
        username: String,

        /// Account password
        #[arg(short, long, env = "LINEMART_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create a customer account and sign in
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        phone: String,
        #[arg(short, long, env = "LINEMART_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the stored token
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List products
    Products {
        /// Search term
        #[arg(short, long)]
        search: Option<String>,

        /// Category id
        #[arg(short, long)]
        category: Option<i64>,
    },
    /// List categories
    Categories,
    /// List your orders
    Orders,
    /// Cancel an order
    CancelOrder {
        /// Order id
        id: i64,
    },
    /// Show the server-side cart
    Cart,
    /// Look up a delivery by tracking number
    Track {
        tracking_number: String,

        /// Also show the tracking history
        #[arg(long)]
        history: bool,
    },
    /// List notifications
    Notifications {
        /// Mark one notification read
        #[arg(long, conflicts_with = "all")]
        read: Option<i64>,

        /// Mark every notification read
        #[arg(long)]
        all: bool,
    },
    /// Print polled updates until interrupted
    Watch {
        /// Data types to poll (product_updates, category_updates, promotions,
        /// deals, advertisements, notifications, orders, cart)
        #[arg(required = true)]
        data_types: Vec<String>,

        /// Override the configured interval, in seconds
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {}", e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let shell = AppShell::new(StorefrontConfig::from_env()?)?;

    match cli.command {
        Commands::Login { username, password } => {
            commands::account::login(&shell, &username, &password).await?;
        }
        Commands::Register {
            username,
            email,
            first_name,
            last_name,
            phone,
            password,
        } => {
            let form = linemart_storefront::auth::RegistrationForm {
                first_name,
                last_name,
                email,
                phone,
                username,
                confirm_password: password.clone(),
                password,
            };
            commands::account::register(&shell, &form).await?;
        }
        Commands::Logout => commands::account::logout(&shell).await?,
        Commands::Whoami => commands::account::whoami(&shell),
        Commands::Products { search, category } => {
            commands::catalog::products(&shell, search, category.map(CategoryId::new)).await?;
        }
        Commands::Categories => commands::catalog::categories(&shell).await?,
        Commands::Orders => commands::orders::list(&shell).await?,
        Commands::CancelOrder { id } => commands::orders::cancel(&shell, OrderId::new(id)).await?,
        Commands::Cart => commands::orders::cart(&shell).await?,
        Commands::Track {
            tracking_number,
            history,
        } => commands::orders::track(&shell, &tracking_number, history).await?,
        Commands::Notifications { read, all } => {
            commands::notifications::run(&shell, read.map(NotificationId::new), all).await?;
        }
        Commands::Watch {
            data_types,
            interval,
        } => commands::watch::run(&shell, &data_types, interval).await?,
    }

    shell.unmount();
    Ok(())
}
