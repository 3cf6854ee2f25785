//! Storefront pricing CLI
//!
//! Fetches exchange rates, converts and formats prices, and drives live
//! price displays against the shopper's preferred currency.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_common::CurrencyCode;
use storefront_display::FilePreferenceStore;
use storefront_fx::FxConfig;

mod app;
mod commands;

use app::PricingApp;

/// Storefront pricing CLI
#[derive(Parser, Debug)]
#[command(name = "pricectl")]
#[command(about = "Currency conversion and price display for the storefront")]
struct Args {
    /// File holding the shopper's preferred currency
    #[arg(
        long,
        env = "STOREFRONT_PREFERENCE_FILE",
        default_value = "storefront-preference.json"
    )]
    preference_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the rate table for a base currency as JSON
    Rates { base: CurrencyCode },

    /// Convert an amount and print both prices
    Convert {
        amount: Decimal,
        from: CurrencyCode,
        to: CurrencyCode,
        #[arg(long)]
        locale: Option<String>,
    },

    /// Format an amount without converting it
    Format {
        amount: Decimal,
        currency: CurrencyCode,
        #[arg(long)]
        locale: Option<String>,
    },

    /// List supported currencies
    Currencies,

    /// Persist the preferred currency
    Prefer { currency: CurrencyCode },

    /// Render a price in the preferred currency
    Show {
        amount: Decimal,
        currency: CurrencyCode,
        #[arg(long)]
        locale: Option<String>,
    },

    /// Follow currency codes read from stdin, one per line
    Watch {
        amount: Decimal,
        currency: CurrencyCode,
        #[arg(long)]
        locale: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Initialize logging
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();

    // Load configuration
    let config = FxConfig::from_env();
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    info!(preference_file = %args.preference_file.display(), "Starting pricing services");
    let store = Arc::new(FilePreferenceStore::new(args.preference_file));
    let app = PricingApp::start(&config, store)?;

    let result = run(&app, args.command).await;
    app.shutdown().await;
    result
}

async fn run(app: &PricingApp, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Rates { base } => println!("{}", commands::rates(app, base).await?),
        Command::Convert {
            amount,
            from,
            to,
            locale,
        } => println!(
            "{}",
            commands::convert(app, amount, from, to, locale.as_deref()).await
        ),
        Command::Prefer { currency } => println!("{}", commands::prefer(app, currency).await?),
        Command::Show {
            amount,
            currency,
            locale,
        } => println!(
            "{}",
            commands::show(app, amount, currency, locale.as_deref()).await
        ),
        Command::Watch {
            amount,
            currency,
            locale,
        } => {
            let stdin = BufReader::new(tokio::io::stdin());
            commands::watch(app, amount, currency, locale.as_deref(), stdin, |line| {
                println!("{}", line)
            })
            .await?;
        }
        Command::Currencies => println!("{}", commands::currencies()),
        Command::Format {
            amount,
            currency,
            locale,
        } => println!("{}", commands::format(amount, currency, locale.as_deref())),
    }
    Ok(())
}
