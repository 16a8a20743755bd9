use crate::method::Method;
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Serialize, Deserialize, Debug, Builder)]
#[builder(on(String, into))]
pub struct SimplePriceParams {
    /// Comma-separated CoinGecko asset ids, e.g. `bitcoin,ethereum`.
    pub ids: String,

    /// Comma-separated target currencies, e.g. `usd`.
    pub vs_currencies: String,

    /// Decimal places in the response, full precision when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<u8>,
}

/// Prices keyed by target currency. Ids the provider does not know are
/// omitted from the response map entirely, so every field here is optional.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct VsCurrencyPrices {
    #[serde(default)]
    pub usd: Option<f64>,
}

pub type SimplePriceResponse = HashMap<String, VsCurrencyPrices>;

pub struct SimplePrice;

impl Method for SimplePrice {
    const PATH: &'static str = "/simple/price";

    type Response = SimplePriceResponse;
    type Params = SimplePriceParams;
}
