//! CoinGecko simple price API

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tokio::time::Instant;

use swapc_core::{EndpointConfig, PairContext, Quote, SourceFailure};

use super::{fetch_json, is_empty, required_number, PriceSource};

pub const NAME: &str = "CoinGecko";

pub struct CoinGeckoSource {
    client: Client,
    endpoint: EndpointConfig,
}

impl CoinGeckoSource {
    pub fn new(client: Client, endpoint: EndpointConfig) -> Self {
        Self { client, endpoint }
    }
}

pub fn parse_simple_price(body: &Value, asset_id: &str) -> Result<f64, SourceFailure> {
    let asset = body.get(asset_id);
    if is_empty(asset) {
        return Err(SourceFailure::no_data(NAME, format!("no price for `{}`", asset_id)));
    }
    required_number(NAME, asset.and_then(|a| a.get("usd")), "usd")
}

#[async_trait::async_trait]
impl PriceSource for CoinGeckoSource {
    fn name(&self) -> &str {
        NAME
    }

    fn timeout(&self) -> Option<Duration> {
        self.endpoint.timeout()
    }

    async fn fetch(&self, pair: &PairContext, deadline: Instant) -> Result<Quote, SourceFailure> {
        let asset_id = pair.base.coingecko_id.as_deref().ok_or_else(|| {
            SourceFailure::no_data(NAME, format!("{} is not listed on CoinGecko", pair.base.symbol))
        })?;
        let started = Instant::now();

        let request = self
            .client
            .get(self.endpoint.url("api/v3/simple/price"))
            .query(&[("ids", asset_id), ("vs_currencies", "usd")]);

        let body = fetch_json(NAME, request, deadline).await?;
        let price = parse_simple_price(&body, asset_id)?;

        Ok(Quote::new(NAME, price, started.elapsed()))
    }
}
