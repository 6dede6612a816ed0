//! Quote, failure and aggregation result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::PairContext;

/// One source's answer for a pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub source: String,
    pub price: f64,
    pub liquidity: Option<f64>,
    pub observed_at: DateTime<Utc>,
    #[serde(with = "duration_ms")]
    pub latency: Duration,
}

impl Quote {
    pub fn new(source: impl Into<String>, price: f64, latency: Duration) -> Self {
        Self {
            source: source.into(),
            price,
            liquidity: None,
            observed_at: Utc::now(),
            latency,
        }
    }

    pub fn with_liquidity(mut self, liquidity: Option<f64>) -> Self {
        self.liquidity = liquidity;
        self
    }

    /// Price is finite and strictly positive
    pub fn is_valid(&self) -> bool {
        is_valid_quote(self)
    }
}

/// Validity policy applied to every collected quote before ranking
pub fn is_valid_quote(quote: &Quote) -> bool {
    quote.price.is_finite() && quote.price > 0.0
}

/// Why a source produced no quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureReason {
    Timeout,
    NetworkError,
    ParseError,
    NoData,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Timeout => "timeout",
            FailureReason::NetworkError => "network error",
            FailureReason::ParseError => "parse error",
            FailureReason::NoData => "no data",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-source failure, carried as diagnostics and never fatal on its own
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{source_name}: {reason} ({detail})")]
pub struct SourceFailure {
    #[serde(rename = "source")]
    pub source_name: String,
    pub reason: FailureReason,
    pub detail: String,
}

impl SourceFailure {
    pub fn new(source: &str, reason: FailureReason, detail: impl Into<String>) -> Self {
        Self {
            source_name: source.to_string(),
            reason,
            detail: detail.into(),
        }
    }

    pub fn timeout(source: &str, detail: impl Into<String>) -> Self {
        Self::new(source, FailureReason::Timeout, detail)
    }

    pub fn network(source: &str, detail: impl Into<String>) -> Self {
        Self::new(source, FailureReason::NetworkError, detail)
    }

    pub fn parse(source: &str, detail: impl Into<String>) -> Self {
        Self::new(source, FailureReason::ParseError, detail)
    }

    pub fn no_data(source: &str, detail: impl Into<String>) -> Self {
        Self::new(source, FailureReason::NoData, detail)
    }
}

/// Ranked comparison for one pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    pub pair: PairContext,
    /// Highest price first
    pub quotes: Vec<Quote>,
    pub best: Quote,
    pub worst: Quote,
    pub absolute_spread: f64,
    pub percent_spread: f64,
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
    pub failures: Vec<SourceFailure>,
    /// Whether collection waited past the overall deadline
    pub grace_applied: bool,
}

impl AggregationResult {
    pub fn quote_count(&self) -> usize {
        self.quotes.len()
    }

    pub fn failed_sources(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|f| f.source_name.as_str())
    }
}

/// Serialize durations as integer milliseconds
pub mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
