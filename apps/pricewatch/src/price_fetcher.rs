use nabi_coingecko::simple_price::{SimplePrice, SimplePriceParams};
use nabi_coingecko::CoingeckoClient;
use nabi_shared_models::PriceQuote;
use std::collections::HashMap;
use thiserror::Error;

pub type PriceMap = HashMap<String, PriceQuote>;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Price request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Fetch current USD quotes for every tracked asset. Each requested id gets
/// an entry: ids the provider omitted come back as `Unavailable`. The caller
/// decides what to do with a failed cycle.
pub async fn fetch_prices(
    client: &CoingeckoClient,
    assets: &[String],
) -> Result<PriceMap, FetchError> {
    let params = SimplePriceParams::builder()
        .ids(assets.join(","))
        .vs_currencies("usd")
        .build();

    let response = client.call::<SimplePrice>(params).await?;

    let mut prices = PriceMap::with_capacity(assets.len());
    for asset in assets {
        let quote = response
            .get(asset)
            .and_then(|vs| vs.usd)
            .map(PriceQuote::Price)
            .unwrap_or(PriceQuote::Unavailable);
        prices.insert(asset.clone(), quote);
    }

    Ok(prices)
}
