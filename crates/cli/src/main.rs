//! Shop Ledger CLI - build the combined user and product sales tables.
//!
//! # Usage
//!
//! ```bash
//! # Scrape clients, fetch carts/users/products, write both CSV files
//! shop-ledger run
//!
//! # Same, from a fixture directory into ./out
//! shop-ledger run --fixtures ./fixtures --output-dir ./out
//!
//! # Flatten nested columns of the written files
//! shop-ledger expand --output-dir ./out
//!
//! # Structured logs
//! shop-ledger --log-format json run
//! ```
//!
//! # Commands
//!
//! - `run` - Fetch inputs, reconcile, aggregate and write the tables
//! - `expand` - Flatten `address`, `name` and `rating` in written tables

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "shop-ledger")]
#[command(author, version, about = "Reconcile shop clients, carts and products into CSV tables")]
struct Cli {
    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch inputs, build both tables and write them
    Run {
        /// Directory for the CSV files (overrides `SHOP_LEDGER_OUTPUT_DIR`)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Read inputs from JSON fixtures in this directory instead of the network
        #[arg(short, long)]
        fixtures: Option<PathBuf>,

        /// Skip the pauses between requests, pages and stages
        #[arg(long)]
        no_delay: bool,
    },
    /// Flatten nested columns of previously written tables in place
    Expand {
        /// Directory holding the CSV files (overrides `SHOP_LEDGER_OUTPUT_DIR`)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

fn init_tracing(format: LogFormat) {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shop_ledger=info,shop_ledger_cli=info,shop_ledger_core=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Run {
            output_dir,
            fixtures,
            no_delay,
        } => {
            let summary = commands::run::run(commands::run::RunOptions {
                output_dir,
                fixtures,
                no_delay,
            })
            .await?;
            tracing::info!(
                clients = summary.clients,
                carts = summary.carts,
                user_profiles = summary.user_profiles,
                products = summary.products,
                "Run finished"
            );
        }
        Commands::Expand { output_dir } => commands::expand::expand(output_dir)?,
    }
    Ok(())
}
