//! Response shapes and conversions from aggregation results

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use swapc_core::{AggregationResult, Quote, SourceFailure};

/// One source's price as shown to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceView {
    pub dex_name: String,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidity: Option<f64>,
    pub latency_ms: u64,
    pub last_updated: DateTime<Utc>,
}

impl From<&Quote> for PriceView {
    fn from(quote: &Quote) -> Self {
        Self {
            dex_name: quote.source.clone(),
            price: quote.price,
            liquidity: quote.liquidity,
            latency_ms: millis(quote.latency),
            last_updated: quote.observed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    pub best_dex: String,
    pub worst_dex: String,
    pub price_difference: f64,
    pub percentage_difference: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureView {
    pub source: String,
    pub reason: &'static str,
    pub detail: String,
}

impl From<&SourceFailure> for FailureView {
    fn from(failure: &SourceFailure) -> Self {
        Self {
            source: failure.source_name.clone(),
            reason: failure.reason.as_str(),
            detail: failure.detail.clone(),
        }
    }
}

pub fn failure_views(failures: &[SourceFailure]) -> Vec<FailureView> {
    failures.iter().map(FailureView::from).collect()
}

/// `/api/prices/compare` success body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    pub success: bool,
    pub pair: String,
    pub best_price: PriceView,
    pub all_prices: Vec<PriceView>,
    pub comparison: Comparison,
    pub elapsed_ms: u64,
    pub failures: Vec<FailureView>,
    pub grace_applied: bool,
    pub cached: bool,
}

impl CompareResponse {
    pub fn new(result: &AggregationResult, cached: bool) -> Self {
        Self {
            success: true,
            pair: result.pair.label(),
            best_price: PriceView::from(&result.best),
            all_prices: result.quotes.iter().map(PriceView::from).collect(),
            comparison: Comparison {
                best_dex: result.best.source.clone(),
                worst_dex: result.worst.source.clone(),
                price_difference: result.absolute_spread,
                percentage_difference: result.percent_spread,
            },
            elapsed_ms: millis(result.elapsed),
            failures: failure_views(&result.failures),
            grace_applied: result.grace_applied,
            cached,
        }
    }
}

/// Where a dashboard response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    Cache,
    Stale,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPrice {
    #[serde(flatten)]
    pub price: PriceView,
    pub is_best: bool,
    pub is_worst: bool,
}

/// `/api/prices/dashboard` body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub success: bool,
    pub pair: String,
    pub prices: Vec<DashboardPrice>,
    pub timestamp: DateTime<Utc>,
    pub total_dexes: usize,
    pub source: DataSource,
    /// Age of a stale result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_ms: Option<u64>,
    pub failures: Vec<FailureView>,
}

impl DashboardResponse {
    pub fn new(result: &AggregationResult, source: DataSource, age: Option<Duration>) -> Self {
        // quotes are already ordered best first
        let last = result.quotes.len().saturating_sub(1);
        let prices = result
            .quotes
            .iter()
            .enumerate()
            .map(|(i, quote)| DashboardPrice {
                price: PriceView::from(quote),
                is_best: i == 0,
                is_worst: i == last,
            })
            .collect::<Vec<_>>();

        Self {
            success: true,
            pair: result.pair.label(),
            total_dexes: prices.len(),
            prices,
            timestamp: Utc::now(),
            source,
            age_ms: age.map(millis),
            failures: failure_views(&result.failures),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
