//! DexScreener pair search

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tokio::time::Instant;

use swapc_core::{EndpointConfig, PairContext, Quote, SourceFailure};

use super::{fetch_json, is_empty, parse_number, required_number, PriceSource};

pub const NAME: &str = "DexScreener";

pub struct DexScreenerSource {
    client: Client,
    endpoint: EndpointConfig,
}

impl DexScreenerSource {
    pub fn new(client: Client, endpoint: EndpointConfig) -> Self {
        Self { client, endpoint }
    }
}

/// Price and USD liquidity of the matching pair, or of the first listed pair
pub fn parse_pairs(body: &Value, pair: &PairContext) -> Result<(f64, Option<f64>), SourceFailure> {
    let pairs = body.get("pairs");
    if is_empty(pairs) {
        return Err(SourceFailure::no_data(NAME, format!("no pairs listed for {}", pair.base.symbol)));
    }
    let pairs = pairs
        .and_then(Value::as_array)
        .ok_or_else(|| SourceFailure::parse(NAME, "`pairs` is not an array"))?;

    let chosen = pairs
        .iter()
        .find(|p| {
            p.pointer("/baseToken/address").and_then(Value::as_str) == Some(pair.base.mint.as_str())
                && p.pointer("/quoteToken/address").and_then(Value::as_str) == Some(pair.quote.mint.as_str())
        })
        .unwrap_or(&pairs[0]);

    let price = required_number(NAME, chosen.get("priceUsd"), "priceUsd")?;
    let liquidity = chosen.pointer("/liquidity/usd").and_then(parse_number);

    Ok((price, liquidity))
}

#[async_trait::async_trait]
impl PriceSource for DexScreenerSource {
    fn name(&self) -> &str {
        NAME
    }

    fn timeout(&self) -> Option<Duration> {
        self.endpoint.timeout()
    }

    async fn fetch(&self, pair: &PairContext, deadline: Instant) -> Result<Quote, SourceFailure> {
        let started = Instant::now();

        let request = self
            .client
            .get(self.endpoint.url("latest/dex/search"))
            .query(&[("q", pair.base.mint.as_str())]);

        let body = fetch_json(NAME, request, deadline).await?;
        let (price, liquidity) = parse_pairs(&body, pair)?;

        Ok(Quote::new(NAME, price, started.elapsed()).with_liquidity(liquidity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::testutil::sol_usdc;
    use serde_json::json;
    use swapc_core::FailureReason;

    #[test]
    fn test_prefers_exact_pair() {
        let body = json!({
            "pairs": [
                {
                    "baseToken": { "address": "So11111111111111111111111111111111111111112" },
                    "quoteToken": { "address": "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB" },
                    "priceUsd": "149.10",
                    "liquidity": { "usd": 1000.0 }
                },
                {
                    "baseToken": { "address": "So11111111111111111111111111111111111111112" },
                    "quoteToken": { "address": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v" },
                    "priceUsd": "150.25",
                    "liquidity": { "usd": 2500000.5 }
                }
            ]
        });

        let (price, liquidity) = parse_pairs(&body, &sol_usdc()).unwrap();
        assert_eq!(price, 150.25);
        assert_eq!(liquidity, Some(2500000.5));
    }

    #[test]
    fn test_falls_back_to_first_pair() {
        let body = json!({
            "pairs": [
                { "baseToken": { "address": "x" }, "quoteToken": { "address": "y" }, "priceUsd": "148.00" }
            ]
        });

        let (price, liquidity) = parse_pairs(&body, &sol_usdc()).unwrap();
        assert_eq!(price, 148.0);
        assert_eq!(liquidity, None);
    }

    #[test]
    fn test_empty_pairs_is_no_data() {
        for body in [json!({ "pairs": [] }), json!({ "pairs": null }), json!({ "schemaVersion": "1.0.0" })] {
            let err = parse_pairs(&body, &sol_usdc()).unwrap_err();
            assert_eq!(err.reason, FailureReason::NoData);
        }
    }

    #[test]
    fn test_missing_price_is_parse_error() {
        let body = json!({ "pairs": [{ "baseToken": { "address": "x" } }] });
        let err = parse_pairs(&body, &sol_usdc()).unwrap_err();
        assert_eq!(err.reason, FailureReason::ParseError);

        let body = json!({ "pairs": "oops" });
        let err = parse_pairs(&body, &sol_usdc()).unwrap_err();
        assert_eq!(err.reason, FailureReason::ParseError);
    }
}
