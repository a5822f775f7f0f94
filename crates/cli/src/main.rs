//! Heirloom CLI - browse the catalog, manage the cart and check out.
//!
//! # Usage
//!
//! ```bash
//! # Browse
//! heirloom products list --region "West Africa"
//! heirloom products search mask
//! heirloom categories featured
//!
//! # Cart
//! heirloom cart add <product-id> --quantity 2
//! heirloom cart show
//!
//! # Account and checkout
//! heirloom auth login -e buyer@example.com
//! heirloom checkout --full-name "A. Buyer" --address "1 Main St" --city Accra \
//!     --postal-code 00233 --country Ghana --phone 555-0100 --method paypal
//! ```
//!
//! # Commands
//!
//! - `products` - List, search and inspect products
//! - `categories` - List and inspect categories
//! - `cart` - Show and change the cart
//! - `checkout` - Place an order for the current cart
//! - `auth` - Sign in, sign out and manage the password
//! - `orders` - List, inspect and cancel orders; follow up PayPal payments

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use heirloom_storefront::config::StorefrontConfig;
use heirloom_storefront::error::AppError;
use heirloom_storefront::state::Storefront;

mod commands;
mod output;

use commands::{
    auth::AuthAction, cart::CartAction, categories::CategoriesAction, checkout::CheckoutArgs,
    orders::OrdersAction, products::ProductsAction,
};

#[derive(Parser)]
#[command(name = "heirloom")]
#[command(author, version, about = "Heirloom storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Browse categories
    Categories {
        #[command(subcommand)]
        action: CategoriesAction,
    },
    /// Show or change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Place an order for the current cart
    Checkout(CheckoutArgs),
    /// Manage the signed-in account
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// View, cancel and pay for orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing() {
    // Logs go to stderr so command output on stdout stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "heirloom=info,heirloom_storefront=warn".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing();
            tracing::error!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);
    init_tracing();

    let state = match Storefront::new(config) {
        Ok(state) => state,
        Err(e) => {
            e.report();
            std::process::exit(1);
        }
    };
    state.init().await;

    let result = run(cli, &state).await;

    if let Err(e) = state.shutdown() {
        e.report();
    }

    if let Err(e) = result {
        e.report();
        output::failure(&e.user_message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, state: &Storefront) -> Result<(), AppError> {
    match cli.command {
        Commands::Products { action } => commands::products::run(action, state).await,
        Commands::Categories { action } => commands::categories::run(action, state).await,
        Commands::Cart { action } => commands::cart::run(action, state).await,
        Commands::Checkout(args) => commands::checkout::run(args, state).await,
        Commands::Auth { action } => commands::auth::run(action, state).await,
        Commands::Orders { action } => commands::orders::run(action, state).await,
    }
}
