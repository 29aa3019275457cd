//! Shopcart CLI - a command-line storefront.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog (no login required)
//! shopcart products list --category keyboards --search clacky
//! shopcart products show 665f1a2b3c4d5e6f70819202
//!
//! # Authenticate (session persists across invocations)
//! shopcart login -e alice@example.com -p hunter2
//! shopcart whoami
//!
//! # Shop
//! shopcart cart add 665f1a2b3c4d5e6f70819202 -q 2
//! shopcart cart show
//! shopcart checkout --name "Alice Smith" --street "1 Main St" \
//!     --city Springfield --state IL --zip 62701 --country USA
//! shopcart orders list
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPCART_API_URL` - Base URL of the commerce API (required)
//! - `SHOPCART_CREDENTIAL_FILE` - Credential path (default: `~/.config/shopcart/credential`)

#![cfg_attr(not(test), forbid(unsafe_code))]
// A CLI's job is to print
#![allow(clippy::print_stdout)]

use std::sync::Arc;

use clap::{Parser, Subcommand};
use shopcart_client::{
    ApiClient, BasketManager, ClientConfig, FileCredentialStore, SessionManager,
};

mod commands;

use commands::{auth, cart, orders, products};

#[derive(Parser)]
#[command(name = "shopcart")]
#[command(author, version, about = "Command-line storefront")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the commerce API is reachable
    Health,
    /// Log in with email and password
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Create a new account and log in
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long)]
        password: String,
    },
    /// Log out and forget the stored session
    Logout,
    /// Show the currently authenticated user
    Whoami,
    /// Update the profile of the authenticated user
    Profile(auth::ProfileArgs),
    /// Browse the product catalog
    Products {
        #[command(subcommand)]
        action: products::ProductsAction,
    },
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: cart::CartAction,
    },
    /// Place an order from the current cart
    Checkout(orders::CheckoutArgs),
    /// View order history
    Orders {
        #[command(subcommand)]
        action: orders::OrdersAction,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let api = Arc::new(ApiClient::new(&config)?);
    let store = Arc::new(FileCredentialStore::new(config.credential_path.clone()));
    let session = SessionManager::new(api.clone(), store);
    let basket = BasketManager::new(api.clone(), session.clone());

    // The API layer publishes credential invalidations as an event; the
    // shell subscribes instead of the client performing a hidden redirect.
    let invalidations = api.subscribe_invalidations();
    let generation = *invalidations.borrow();

    let result = dispatch(cli, &api, &session, &basket).await;

    if *invalidations.borrow() > generation {
        session.invalidate();
        println!("Session expired. Run `shopcart login` to sign in again.");
    }

    result
}

async fn dispatch(
    cli: Cli,
    api: &Arc<ApiClient>,
    session: &SessionManager,
    basket: &BasketManager,
) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Health => {
            products::health(api.as_ref()).await?;
        }
        Commands::Login { email, password } => {
            auth::login(session, &email, &password).await?;
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            auth::register(session, &name, &email, &password).await?;
        }
        Commands::Logout => {
            session.resume().await;
            auth::logout(session);
        }
        Commands::Whoami => {
            session.resume().await;
            auth::whoami(session);
        }
        Commands::Profile(args) => {
            session.resume().await;
            auth::update_profile(session, args).await?;
        }
        Commands::Products { action } => {
            products::dispatch(api.as_ref(), action).await?;
        }
        Commands::Cart { action } => {
            session.resume().await;
            cart::dispatch(basket, action).await?;
        }
        Commands::Checkout(args) => {
            session.resume().await;
            orders::checkout(api.as_ref(), session, basket, args).await?;
        }
        Commands::Orders { action } => {
            session.resume().await;
            orders::dispatch(api.as_ref(), session, action).await?;
        }
    }
    Ok(())
}
