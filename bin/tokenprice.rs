use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use jemallocator::Jemalloc;
use log::{info, LevelFilter};
use serde::Serialize;
use simple_logger::SimpleLogger;
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use tokenprice::{
    pricing::RegisterFromPool, PostgresClient, PriceResolver, PricingError, RuntimeConfig,
    RuntimeConfigSource, Settings, TheGraphClient, TokenRegistrar,
};

#[derive(Parser)]
#[command(name = "tokenprice")]
#[command(about = "Resolve registered token USD prices from V3-style pools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the USD price of a registered token
    Price {
        token_address: String,
        #[arg(short, long, default_value = "")]
        chain: String,
    },

    /// Register a token against the pool that prices it
    Register {
        token_address: String,
        pool_address: String,
        #[arg(short, long, default_value = "")]
        chain: String,
        #[arg(short, long, default_value = "")]
        dex: String,
        /// Subgraph id overriding the configured default
        #[arg(long)]
        subgraph_id: Option<String>,
        /// Force the quote token's USD stability instead of inferring it from its symbol
        #[arg(long)]
        quote_usd_stable: Option<bool>,
    },

    /// Show a single registration
    Show {
        token_address: String,
        #[arg(short, long, default_value = "")]
        chain: String,
    },

    /// List registrations
    List {
        #[arg(short, long)]
        chain: Option<String>,
    },
}

#[tokio::main()]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = Settings::new()
        .context("Failed to load config.yaml. Please ensure it exists and is valid")?;

    let level = LevelFilter::from_str(&settings.log_level).unwrap_or(LevelFilter::Info);
    SimpleLogger::new()
        .with_level(level)
        .init()
        .context("Failed to initialize logger")?;

    let db = Arc::new(
        PostgresClient::new(settings.postgres.clone())
            .await
            .context("Failed to initialize database connection")?,
    );
    db.migrate().await?;

    let thegraph = Arc::new(
        TheGraphClient::new(&settings.thegraph).context("Failed to create The Graph client")?,
    );

    // A key in settings takes precedence over the database row
    let runtime: Arc<dyn RuntimeConfigSource> = match settings.thegraph.api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => Arc::new(RuntimeConfig::with_api_key(key)),
        _ => db.clone(),
    };

    let cancellation_token = CancellationToken::new();
    spawn_shutdown_listener(cancellation_token.clone())?;

    match cli.command {
        Commands::Price {
            token_address,
            chain,
        } => {
            let resolver =
                PriceResolver::new(db.clone(), thegraph, runtime, &settings.pricing);
            let result = resolver
                .resolve_usd_cancellable(&chain, &token_address, &cancellation_token)
                .await
                .map_err(describe)?;
            print_json(&result)
        },

        Commands::Register {
            token_address,
            pool_address,
            chain,
            dex,
            subgraph_id,
            quote_usd_stable,
        } => {
            let registrar =
                TokenRegistrar::new(db.clone(), thegraph, runtime, settings.pricing.clone());
            let request = RegisterFromPool {
                chain,
                dex,
                token_address,
                pool_address,
                subgraph_id,
                quote_token_is_usd_stable: quote_usd_stable,
            };
            let record = tokio::select! {
                _ = cancellation_token.cancelled() => Err(PricingError::Cancelled),
                result = registrar.register_from_pool(request) => result,
            }
            .map_err(describe)?;
            info!("Registered {}", record.key());
            print_json(&record)
        },

        Commands::Show {
            token_address,
            chain,
        } => {
            let registrar =
                TokenRegistrar::new(db.clone(), thegraph, runtime, settings.pricing.clone());
            let record = registrar
                .get_registered(&chain, &token_address)
                .await
                .map_err(describe)?;
            print_json(&record)
        },

        Commands::List {
            chain,
        } => {
            let registrar =
                TokenRegistrar::new(db.clone(), thegraph, runtime, settings.pricing.clone());
            let records = registrar
                .list_registered(chain.as_deref())
                .await
                .map_err(describe)?;
            print_json(&records)
        },
    }
}

/// Cancel in-flight work on Ctrl+C or SIGTERM.
fn spawn_shutdown_listener(token: CancellationToken) -> anyhow::Result<()> {
    #[cfg(unix)]
    let mut sigterm_stream = {
        use tokio::signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?
    };

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal (Ctrl+C), cancelling...");
                },
                _ = sigterm_stream.recv() => {
                    info!("Received SIGTERM, cancelling...");
                },
            };
        }

        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            info!("Received shutdown signal (Ctrl+C), cancelling...");
        }

        token.cancel();
    });

    Ok(())
}

/// Keep the stable error code visible at the process boundary.
fn describe(e: PricingError) -> anyhow::Error {
    anyhow::anyhow!("{}: {}", e.code(), e)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
