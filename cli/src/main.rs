//! RemitFX command-line tool
//!
//! Fetches live USD rates, quotes transfers and polls rates on a timer.

use std::time::Duration;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use remitfx_common::{format_exchange_rate, rate_age_minutes, PayoutCurrency, RateSnapshot};
use remitfx_fx::{FxEngine, FxEngineConfig};

/// RemitFX CLI
#[derive(Parser, Debug)]
#[command(name = "remitfx")]
#[command(about = "Live USD exchange rates and transfer quotes")]
struct Args {
    /// Rates endpoint (overrides FX_RATES_URL)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and print current rates
    Rates,

    /// Quote a transfer from USD
    Quote {
        /// Amount to send in USD
        #[arg(short, long)]
        amount: Decimal,

        /// Payout currency (GBP or ZAR)
        #[arg(short, long, default_value = "GBP")]
        to: PayoutCurrency,

        /// Print the quote as JSON
        #[arg(long)]
        json: bool,
    },

    /// Poll rates on a timer
    Watch {
        /// Seconds between polls
        #[arg(short, long, default_value = "30")]
        interval: u64,

        /// Stop after this many polls (0 = run until Ctrl+C)
        #[arg(short, long, default_value = "0")]
        count: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_json);

    let mut config = FxEngineConfig::from_env();
    if let Some(endpoint) = &args.endpoint {
        config = config.with_endpoint(endpoint.clone());
    }
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    info!(endpoint = %config.endpoint, "Starting RemitFX");
    let engine = FxEngine::with_http(config)?;

    match args.command {
        Command::Rates => {
            let rates = engine.get_rates().await;
            print_rates(&rates);
        }
        Command::Quote { amount, to, json } => {
            let quote = engine.quote(amount, to).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&quote)?);
            } else {
                let result = &quote.result;
                println!("Send:         ${:.2}", quote.amount_usd);
                println!("Fee ({}%):    ${:.2}", result.fee_percentage, result.fee);
                println!("After fee:    ${:.2}", quote.amount_usd - result.fee);
                println!(
                    "Rate:         {}",
                    format_exchange_rate(quote.rates.rate_for(to), to)
                );
                println!(
                    "Recipient:    {}{:.2}",
                    to.symbol(),
                    result.total_received
                );
                if quote.rates.is_synthetic() {
                    println!("(live rates unavailable, using estimated rates)");
                }
            }
        }
        Command::Watch { interval, count } => {
            watch(&engine, Duration::from_secs(interval.max(1)), count).await;
        }
    }

    Ok(())
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn print_rates(rates: &RateSnapshot) {
    for currency in PayoutCurrency::ALL {
        println!(
            "1 USD = {} ({})",
            format_exchange_rate(rates.rate_for(currency), currency),
            currency
        );
    }
    println!(
        "Source: {}, captured {} min ago",
        rates.origin,
        rate_age_minutes(rates.captured_at)
    );
}

async fn watch(engine: &FxEngine, interval: Duration, count: u64) {
    let mut ticker = tokio::time::interval(interval);
    let mut polls = 0u64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }

        let cached = engine.peek_cached().is_some();
        let rates = engine.get_rates().await;
        polls += 1;

        info!(
            poll = polls,
            cached,
            origin = %rates.origin,
            usd_to_gbp = %rates.usd_to_gbp,
            usd_to_zar = %rates.usd_to_zar,
            last_fetched_at = ?engine.last_fetched_at(),
            "Polled FX rates"
        );

        if count > 0 && polls >= count {
            break;
        }
    }

    println!("{}", engine.metrics().to_prometheus());
}
