mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sigbridge_brokers_crypto::{canonical_query, OrderSubmitter, Signer};
use sigbridge_core::{OrderGateway, OrderTicket};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{AppConfig, Overrides, DEFAULT_BIND};

#[derive(Parser)]
#[command(name = "sigbridge")]
#[command(about = "Relay alert webhooks to signed exchange orders")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// TOML config file; flags and environment variables take precedence
    #[arg(short, long, env = "SIGBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server
    Serve {
        /// Bind address
        #[arg(short, long, env = "WEBHOOK_BIND")]
        bind: Option<String>,
    },

    /// Place a single order and print the result
    Place {
        /// Instrument symbol (e.g. "BTCUSDT")
        #[arg(short, long)]
        symbol: String,

        /// Order side (buy or sell)
        #[arg(long)]
        side: String,

        /// Order quantity
        #[arg(short, long)]
        qty: Decimal,

        /// Order type (market or limit)
        #[arg(long)]
        order_type: Option<String>,

        /// Limit price (required for limit orders)
        #[arg(long)]
        price: Option<Decimal>,

        /// Product category for this order only
        #[arg(long = "order-category")]
        order_category: Option<String>,
    },

    /// Print the canonical string and signature for KEY=VALUE parameters
    Sign {
        /// Parameters as KEY=VALUE
        #[arg(required = true)]
        params: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply(&cli.overrides);

    match cli.command {
        Commands::Serve { bind } => {
            let bind = bind
                .or_else(|| config.webhook.bind.clone())
                .unwrap_or_else(|| DEFAULT_BIND.to_string());
            if config.webhook.secret.is_none() {
                tracing::warn!("No webhook secret configured; accepting unauthenticated alerts");
            }
            tracing::info!(
                base_url = %config.exchange.base_url,
                recv_window_ms = config.exchange.recv_window_ms,
                "Starting order relay"
            );
            let submitter = OrderSubmitter::new(config.exchange)?;
            let state = sigbridge_api::AppState::new(Arc::new(submitter), config.webhook.secret);
            sigbridge_api::start_server(state, &bind).await?;
        }
        Commands::Place {
            symbol,
            side,
            qty,
            order_type,
            price,
            order_category,
        } => {
            let submitter = OrderSubmitter::new(config.exchange)?;
            let ticket = OrderTicket {
                symbol,
                side,
                quantity: qty,
                order_type,
                price,
                category: order_category,
            };
            let result = submitter.place_ticket(ticket).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.success {
                anyhow::bail!(
                    "Order failed: {}",
                    result.message.unwrap_or_else(|| "unknown error".to_string())
                );
            }
        }
        Commands::Sign { params } => {
            let pairs = parse_params(&params)?;
            let signer = Signer::new(config.exchange.api_secret.clone());
            println!("canonical: {}", canonical_query(pairs.iter().cloned()));
            println!("signature: {}", signer.sign(pairs));
        }
    }

    Ok(())
}

fn parse_params(raw: &[String]) -> Result<Vec<(String, String)>> {
    raw.iter()
        .map(|p| {
            p.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .with_context(|| format!("expected KEY=VALUE, got `{p}`"))
        })
        .collect()
}
