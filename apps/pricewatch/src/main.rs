use chrono::{Local, Timelike};
use clap::Parser;
use dotenv::dotenv;
use nabi_coingecko::CoingeckoClient;
use nabi_email::EmailConfig;
use nabi_pricelog::{LastPriceTable, PriceLogStore, PriceReading};
use std::path::PathBuf;
use std::time::Duration;

mod price_fetcher;
mod reporter;

use price_fetcher::{fetch_prices, PriceMap};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// CoinGecko ids tracked when --coins is not given.
const DEFAULT_COINS: &[&str] = &[
    "bitcoin",
    "ethereum",
    "solana",
    "chainlink",
    "polkadot",
    "ripple",
    "cardano",
    "dogecoin",
    "vechain",
];

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path of the persisted price log
    #[arg(long, default_value = "crypto_price_log.csv")]
    store: PathBuf,

    /// Comma-separated CoinGecko ids to track instead of the built-in list
    #[arg(long)]
    coins: Option<String>,
}

fn tracked_assets(coins: Option<&str>) -> Vec<String> {
    match coins {
        Some(list) => list
            .split(',')
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect(),
        None => DEFAULT_COINS.iter().map(|id| id.to_string()).collect(),
    }
}

/// Seconds to wait before the next cycle: loosely aligned to the next minute
/// boundary, never less than a full minute.
fn sleep_secs(second_of_minute: u32) -> u64 {
    std::cmp::max(60, 65u64.saturating_sub(u64::from(second_of_minute)))
}

/// One fetch -> log -> report pass. Takes the last-price table by value and
/// returns the updated one; every failure is logged and the cycle carries on.
async fn run_cycle(
    client: &CoingeckoClient,
    store: &PriceLogStore,
    assets: &[String],
    mut last_prices: LastPriceTable,
) -> LastPriceTable {
    let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();

    let prices = match fetch_prices(client, assets).await {
        Ok(prices) => prices,
        Err(e) => {
            eprintln!("Error fetching prices: {}", e);
            PriceMap::new()
        }
    };

    let readings: Vec<PriceReading> = assets
        .iter()
        .filter_map(|asset| {
            prices.get(asset).map(|&quote| {
                PriceReading::observe(
                    timestamp.clone(),
                    asset.clone(),
                    quote,
                    last_prices.previous(asset),
                )
            })
        })
        .collect();

    match store.append(readings) {
        Ok(retained) => println!("Logged prices at {} ({} rows retained)", timestamp, retained),
        Err(e) => eprintln!("Error writing the price log: {}", e),
    }

    reporter::print_cycle(&timestamp, assets, &prices, &last_prices);

    for (asset, quote) in &prices {
        last_prices.record(asset, *quote);
    }

    last_prices
}

async fn run_loop(client: &CoingeckoClient, store: &PriceLogStore, assets: &[String]) {
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

    // Interrupts are only observed between cycles: an in-flight cycle always
    // runs to completion before the loop exits.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let mut last_prices = LastPriceTable::default();

    loop {
        last_prices = run_cycle(client, store, assets, last_prices).await;

        let wait = sleep_secs(Local::now().second());
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(wait)) => {}
            _ = shutdown_rx.changed() => break,
        }
    }
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let args = Args::parse();

    let assets = tracked_assets(args.coins.as_deref());
    if assets.is_empty() {
        anyhow::bail!("--coins resolved to an empty asset list");
    }

    // Validated once up front; a missing credential only disables the final
    // report, it never stops the price loop.
    let email_config = match EmailConfig::new() {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!("Email report disabled: {}", e);
            None
        }
    };

    let store = PriceLogStore::new(&args.store);
    let client = CoingeckoClient::new();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_loop(&client, &store, &assets));

    println!("\nStopping. Sending the price log by email...");
    match &email_config {
        Some(cfg) => match cfg.send_price_log(store.path()) {
            Ok(()) => println!("Email sent!"),
            Err(e) => eprintln!("Error sending the report email: {}", e),
        },
        None => eprintln!("Email credentials are not configured; skipping the report email."),
    }

    println!("Done.");
    Ok(())
}
