//! Jupiter aggregator quote API

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tokio::time::Instant;

use swapc_core::{EndpointConfig, PairContext, Quote, SourceFailure, TokenInfo};

use super::{fetch_json, is_empty, required_number, PriceSource};

pub const NAME: &str = "Jupiter";

/// Quotes one whole base token through the Jupiter router.
///
/// The price is the router's output amount, so it is denominated in the quote
/// token rather than USD like the other sources. Spreads against those sources
/// only mean something when the quote token is a USD stablecoin.
pub struct JupiterSource {
    client: Client,
    endpoint: EndpointConfig,
}

impl JupiterSource {
    pub fn new(client: Client, endpoint: EndpointConfig) -> Self {
        Self { client, endpoint }
    }
}

/// Output amount for one base token, scaled by the quote token's decimals
pub fn parse_quote(body: &Value, pair: &PairContext) -> Result<f64, SourceFailure> {
    if let Some(error) = body.get("error") {
        return Err(SourceFailure::no_data(NAME, format!("no route: {}", error)));
    }
    if body.get("outAmount").is_none() || is_empty(body.get("routePlan")) {
        return Err(SourceFailure::no_data(NAME, format!("no route for {}", pair)));
    }

    let out_amount = required_number(NAME, body.get("outAmount"), "outAmount")?;
    Ok(out_amount / one_unit(&pair.quote)? as f64)
}

fn one_unit(token: &TokenInfo) -> Result<u128, SourceFailure> {
    token.one_unit().ok_or_else(|| {
        SourceFailure::parse(
            NAME,
            format!("unsupported decimals {} for {}", token.decimals, token.symbol),
        )
    })
}

#[async_trait::async_trait]
impl PriceSource for JupiterSource {
    fn name(&self) -> &str {
        NAME
    }

    fn timeout(&self) -> Option<Duration> {
        self.endpoint.timeout()
    }

    async fn fetch(&self, pair: &PairContext, deadline: Instant) -> Result<Quote, SourceFailure> {
        let started = Instant::now();
        let amount = one_unit(&pair.base)?.to_string();

        let request = self.client.get(self.endpoint.url("v6/quote")).query(&[
            ("inputMint", pair.base.mint.as_str()),
            ("outputMint", pair.quote.mint.as_str()),
            ("amount", amount.as_str()),
            ("slippageBps", "50"),
        ]);

        let body = fetch_json(NAME, request, deadline).await?;
        let price = parse_quote(&body, pair)?;

        Ok(Quote::new(NAME, price, started.elapsed()))
    }
}
