//! HTTP price source implementations
//!
//! Every source issues one request per comparison (Raydium may fall back to a
//! second endpoint of its own API) and turns the body into a [`Quote`] or a
//! [`SourceFailure`]. Deadlines are enforced here: a request still pending at
//! its deadline is dropped, which aborts the underlying connection.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use swapc_core::{PairContext, Quote, SourceFailure, SourcesConfig};

pub mod birdeye;
pub mod coingecko;
pub mod dexscreener;
pub mod jupiter;
pub mod raydium;

#[cfg(test)]
pub(crate) mod testutil;

pub use birdeye::BirdeyeSource;
pub use coingecko::CoinGeckoSource;
pub use dexscreener::DexScreenerSource;
pub use jupiter::JupiterSource;
pub use raydium::RaydiumSource;

/// A single upstream price provider
#[async_trait::async_trait]
pub trait PriceSource: Send + Sync {
    /// Stable, unique source name; used as the aggregation key
    fn name(&self) -> &str;

    /// Source-specific budget; the aggregator default applies when `None`
    fn timeout(&self) -> Option<Duration> {
        None
    }

    /// Fetch one quote for the pair, giving up at `deadline`
    async fn fetch(&self, pair: &PairContext, deadline: Instant) -> Result<Quote, SourceFailure>;
}

/// Shared HTTP client for all sources (connection pooling)
pub fn http_client(config: &SourcesConfig) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(8)
        .build()
}

/// Build the enabled sources in registration order
pub fn build_sources(config: &SourcesConfig, client: Client) -> Vec<Arc<dyn PriceSource>> {
    let mut sources: Vec<Arc<dyn PriceSource>> = Vec::new();

    if config.jupiter.enabled {
        sources.push(Arc::new(JupiterSource::new(client.clone(), config.jupiter.clone())));
    }
    if config.dexscreener.enabled {
        sources.push(Arc::new(DexScreenerSource::new(client.clone(), config.dexscreener.clone())));
    }
    if config.coingecko.enabled {
        sources.push(Arc::new(CoinGeckoSource::new(client.clone(), config.coingecko.clone())));
    }
    if config.birdeye.enabled {
        sources.push(Arc::new(BirdeyeSource::new(
            client.clone(),
            config.birdeye.clone(),
            config.birdeye_api_key.clone(),
        )));
    }
    if config.raydium.enabled {
        sources.push(Arc::new(RaydiumSource::new(client, config.raydium.clone())));
    }

    sources
}

/// Send a request and decode its JSON body, bounded by `deadline`
pub(crate) async fn fetch_json(
    source: &str,
    request: RequestBuilder,
    deadline: Instant,
) -> Result<Value, SourceFailure> {
    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
        return Err(SourceFailure::timeout(source, "deadline elapsed before request"));
    }

    let body = tokio::time::timeout_at(deadline, async {
        let response = request.timeout(remaining).send().await?.error_for_status()?;
        response.bytes().await
    })
    .await
    .map_err(|_| {
        SourceFailure::timeout(source, format!("no response within {}ms", remaining.as_millis()))
    })?
    .map_err(|e| classify_error(source, e))?;

    debug!("{} responded with {} bytes", source, body.len());

    serde_json::from_slice(&body)
        .map_err(|e| SourceFailure::parse(source, format!("invalid JSON body: {}", e)))
}

fn classify_error(source: &str, error: reqwest::Error) -> SourceFailure {
    if error.is_timeout() {
        SourceFailure::timeout(source, "request timed out")
    } else if let Some(status) = error.status() {
        SourceFailure::network(source, format!("HTTP {}", status))
    } else if error.is_connect() {
        SourceFailure::network(source, "connection failed")
    } else {
        SourceFailure::network(source, error.to_string())
    }
}

/// Accept JSON numbers and numeric strings
pub(crate) fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Required numeric field: absent or non-numeric is a parse error
pub(crate) fn required_number(
    source: &str,
    value: Option<&Value>,
    field: &str,
) -> Result<f64, SourceFailure> {
    match value {
        None | Some(Value::Null) => Err(SourceFailure::parse(source, format!("missing field `{}`", field))),
        Some(v) => parse_number(v)
            .ok_or_else(|| SourceFailure::parse(source, format!("field `{}` is not numeric: {}", field, v))),
    }
}

/// Absent, null, empty-array and empty-object values count as "no data"
pub(crate) fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}
