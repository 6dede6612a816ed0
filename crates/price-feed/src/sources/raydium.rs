//! Raydium token price API
//!
//! Primary: `POST /v2/sdk/token/real-price`. When it fails for any reason
//! other than the deadline, `GET /v2/main/price` is tried once under the same
//! deadline.

use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::debug;

use swapc_core::{EndpointConfig, FailureReason, PairContext, Quote, SourceFailure};

use super::{fetch_json, is_empty, required_number, PriceSource};

pub const NAME: &str = "Raydium";

pub struct RaydiumSource {
    client: Client,
    endpoint: EndpointConfig,
}

impl RaydiumSource {
    pub fn new(client: Client, endpoint: EndpointConfig) -> Self {
        Self { client, endpoint }
    }

    async fn fetch_real_price(&self, mint: &str, deadline: Instant) -> Result<f64, SourceFailure> {
        let request = self
            .client
            .post(self.endpoint.url("v2/sdk/token/real-price"))
            .json(&json!({ "tokens": [mint] }));

        let body = fetch_json(NAME, request, deadline).await?;
        parse_price_map(&body, mint)
    }

    async fn fetch_main_price(&self, mint: &str, deadline: Instant) -> Result<f64, SourceFailure> {
        let request = self.client.get(self.endpoint.url("v2/main/price"));

        let body = fetch_json(NAME, request, deadline).await?;
        parse_price_map(&body, mint)
    }
}

/// Look up `mint` in a price map.
///
/// Both endpoints return a map keyed by mint, either at the top level or under
/// `data`, whose values are a bare number or an object with `price`.
pub fn parse_price_map(body: &Value, mint: &str) -> Result<f64, SourceFailure> {
    let map = match body.get("data") {
        Some(data) if data.is_object() => data,
        _ => body,
    };

    let entry = map.get(mint);
    if is_empty(entry) {
        return Err(SourceFailure::no_data(NAME, format!("no price for mint {}", mint)));
    }

    match entry {
        Some(Value::Object(fields)) => required_number(NAME, fields.get("price"), "price"),
        other => required_number(NAME, other, mint),
    }
}

#[async_trait::async_trait]
impl PriceSource for RaydiumSource {
    fn name(&self) -> &str {
        NAME
    }

    fn timeout(&self) -> Option<Duration> {
        self.endpoint.timeout()
    }

    async fn fetch(&self, pair: &PairContext, deadline: Instant) -> Result<Quote, SourceFailure> {
        let started = Instant::now();
        let mint = pair.base.mint.as_str();

        let price = match self.fetch_real_price(mint, deadline).await {
            Ok(price) => price,
            Err(failure) if failure.reason == FailureReason::Timeout => return Err(failure),
            Err(failure) => {
                debug!("Raydium primary endpoint failed ({}), trying fallback", failure.detail);
                self.fetch_main_price(mint, deadline).await?
            }
        };

        Ok(Quote::new(NAME, price, started.elapsed()))
    }
}
