//! Terminal Shop CLI - browse, manage saved details, and check out.
//!
//! # Usage
//!
//! ```bash
//! # Show the catalog
//! tshop products
//!
//! # Save an address
//! tshop addresses add --name "Ada Lovelace" --street1 "12 Analytical Way" \
//!     --city Austin --province TX --country US --zip 78701
//!
//! # Total and place an order
//! tshop checkout --item var_01J1 --item var_01J2:2 --address shp_01 --card crd_01
//!
//! # Drive a checkout form over JSON lines on stdin/stdout
//! tshop bridge
//! ```
//!
//! # Commands
//!
//! - `products` - Catalog grouped into featured and originals
//! - `addresses` - List, add, or delete shipping addresses
//! - `cards` - List, collect, or delete payment cards
//! - `orders` - Order history
//! - `checkout` - Total the cart and place the order
//! - `bridge` - Checkout form protocol over stdio

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use terminal_shop::{ShopConfig, ShopSession};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;

#[derive(Parser)]
#[command(name = "tshop")]
#[command(author, version, about = "Terminal Shop from the command line")]
struct Cli {
    /// Print JSON instead of trees
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the product catalog
    Products,
    /// Manage shipping addresses
    Addresses {
        #[command(subcommand)]
        action: commands::addresses::AddressAction,
    },
    /// Manage payment cards
    Cards {
        #[command(subcommand)]
        action: commands::cards::CardAction,
    },
    /// Show order history
    Orders,
    /// Total the cart and place the order
    Checkout(commands::checkout::CheckoutArgs),
    /// Speak the checkout form protocol over stdin/stdout
    Bridge(commands::bridge::BridgeArgs),
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ShopConfig) -> Option<sentry::ClientInitGuard> {
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

#[tokio::main]
#[allow(clippy::print_stderr)]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ShopConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            // Tracing is not set up yet
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr so stdout stays clean for output and the bridge
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "terminal_shop=info,tshop=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli, config: &ShopConfig) -> Result<(), CliError> {
    let mut session = ShopSession::from_config(config)?;

    match cli.command {
        Commands::Products => {
            commands::print_tree(&session.product_tree().await?, cli.json)?;
        }
        Commands::Addresses { action } => {
            commands::addresses::run(&mut session, action, cli.json).await?;
        }
        Commands::Cards { action } => {
            commands::cards::run(&mut session, action, cli.json).await?;
        }
        Commands::Orders => {
            commands::print_tree(&session.order_tree().await?, cli.json)?;
        }
        Commands::Checkout(args) => commands::checkout::run(&mut session, args).await?,
        Commands::Bridge(args) => commands::bridge::run(&mut session, args).await?,
    }
    Ok(())
}
