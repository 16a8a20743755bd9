use crate::price_fetcher::PriceMap;
use nabi_pricelog::{format_change, percent_change, LastPriceTable};
use nabi_shared_models::{PriceQuote, UNAVAILABLE};

const BANNER_WIDTH: usize = 40;

/// Print the current cycle against the last-price table. This change
/// rendering is computed independently of the logged row, but through the
/// same helpers, so the two always agree for numeric transitions.
pub fn print_cycle(
    timestamp: &str,
    assets: &[String],
    prices: &PriceMap,
    last_prices: &LastPriceTable,
) {
    println!("\n{}", "=".repeat(BANNER_WIDTH));
    println!("{timestamp} - Crypto Prices:");
    println!("{}", "-".repeat(BANNER_WIDTH));

    for asset in assets {
        if let Some(quote) = prices.get(asset) {
            println!("{}", format_row(asset, *quote, last_prices.previous(asset)));
        }
    }

    println!("{}", "=".repeat(BANNER_WIDTH));
}

fn format_row(asset: &str, quote: PriceQuote, previous: Option<f64>) -> String {
    let price_cell = match quote {
        PriceQuote::Price(value) => format!("${value:<12.5}"),
        PriceQuote::Unavailable => format!("{UNAVAILABLE:<13}"),
    };

    let change_cell = match (previous, quote) {
        (Some(prev), PriceQuote::Price(current)) if prev != 0.0 => {
            format!("{}%", format_change(percent_change(prev, current)))
        }
        _ => UNAVAILABLE.to_string(),
    };

    format!("{:<10} | {} | Change: {}", capitalize(asset), price_cell, change_cell)
}

fn capitalize(asset: &str) -> String {
    let mut chars = asset.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
