pub mod method;
pub mod simple_price;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;

// Base URL for the CoinGecko public API
pub const BASE_URL: &str = "https://api.coingecko.com/api/v3";

pub struct CoingeckoClient {
    reqwest: Client,
    base_url: String,
}

impl CoingeckoClient {
    /// Keyless client against the public API. The free tier is enough for
    /// per-minute polling of a handful of ids.
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Client with a demo/pro API key sent on every request.
    pub fn with_api_key(api_key: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-cg-demo-api-key",
            HeaderValue::from_str(api_key).expect("Failed to create header value"),
        );

        let reqwest = ClientBuilder::new()
            .default_headers(headers)
            .build()
            .expect("Failed to build reqwest client");

        Self {
            reqwest,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Client against an alternate endpoint, used by the test suite.
    pub fn with_base_url(base_url: &str) -> Self {
        let reqwest = ClientBuilder::new()
            .build()
            .expect("Failed to build reqwest client");

        Self {
            reqwest,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub(crate) async fn get<T: DeserializeOwned, P: Serialize + ?Sized>(
        &self,
        url: &str,
        params: &P,
    ) -> reqwest::Result<T> {
        let response = self
            .reqwest
            .get(url)
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await?;

        Ok(response)
    }

    pub async fn call<M: method::Method>(&self, params: M::Params) -> reqwest::Result<M::Response> {
        let url = format!("{}{}", self.base_url, M::PATH);
        self.get(&url, &params).await
    }
}

impl Default for CoingeckoClient {
    fn default() -> Self {
        Self::new()
    }
}
