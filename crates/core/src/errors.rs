//! Error types

use thiserror::Error;

use crate::SourceFailure;

/// Symbol resolution errors
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("Token symbol \"{0}\" not found in token list")]
    UnknownSymbol(String),

    #[error("Token list unavailable: {0}")]
    TokenListUnavailable(String),
}

/// Fatal errors for a single comparison request
#[derive(Debug, Clone, Error)]
pub enum AggregationError {
    #[error("Unknown token symbol: {symbol}")]
    UnknownSymbol { symbol: String, detail: String },

    #[error("No valid prices fetched for {pair}")]
    NoValidQuotes {
        pair: String,
        failures: Vec<SourceFailure>,
        /// Quotes fetched but dropped by validation
        rejected: usize,
    },
}

impl AggregationError {
    /// Per-source diagnostics, empty for resolution errors
    pub fn failures(&self) -> &[SourceFailure] {
        match self {
            AggregationError::UnknownSymbol { .. } => &[],
            AggregationError::NoValidQuotes { failures, .. } => failures,
        }
    }
}

/// Errors building an aggregator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("No price sources configured")]
    NoSources,

    #[error("Price source name must not be empty")]
    EmptySourceName,

    #[error("Duplicate price source name: {0}")]
    DuplicateSource(String),

    #[error("Token resolver not configured")]
    MissingResolver,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias
pub type ResolveResult<T> = Result<T, ResolveError>;
