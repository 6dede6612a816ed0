//! Birdeye public price API

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tokio::time::Instant;

use swapc_core::{EndpointConfig, PairContext, Quote, SourceFailure};

use super::{fetch_json, is_empty, parse_number, required_number, PriceSource};

pub const NAME: &str = "Birdeye";

pub struct BirdeyeSource {
    client: Client,
    endpoint: EndpointConfig,
    api_key: Option<String>,
}

impl BirdeyeSource {
    pub fn new(client: Client, endpoint: EndpointConfig, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }
}

/// `data.value` in USD, with optional `data.liquidity`
pub fn parse_price(body: &Value) -> Result<(f64, Option<f64>), SourceFailure> {
    let data = body.get("data");
    if is_empty(data) {
        return Err(SourceFailure::no_data(NAME, "response has no data"));
    }

    let price = required_number(NAME, data.and_then(|d| d.get("value")), "data.value")?;
    let liquidity = data.and_then(|d| d.get("liquidity")).and_then(parse_number);

    Ok((price, liquidity))
}

#[async_trait::async_trait]
impl PriceSource for BirdeyeSource {
    fn name(&self) -> &str {
        NAME
    }

    fn timeout(&self) -> Option<Duration> {
        self.endpoint.timeout()
    }

    async fn fetch(&self, pair: &PairContext, deadline: Instant) -> Result<Quote, SourceFailure> {
        let started = Instant::now();

        let mut request = self
            .client
            .get(self.endpoint.url("defi/price"))
            .query(&[("address", pair.base.mint.as_str())])
            .header("x-chain", "solana");
        if let Some(key) = &self.api_key {
            request = request.header("X-API-KEY", key);
        }

        let body = fetch_json(NAME, request, deadline).await?;
        let (price, liquidity) = parse_price(&body)?;

        Ok(Quote::new(NAME, price, started.elapsed()).with_liquidity(liquidity))
    }
}
