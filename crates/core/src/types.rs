//! Core type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tokens::canonical_symbol;

/// Resolved token information
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub mint: String,
    pub decimals: u8,
    /// CoinGecko asset id, when the token is listed there
    pub coingecko_id: Option<String>,
}

impl TokenInfo {
    pub fn new(symbol: &str, mint: &str, decimals: u8) -> Self {
        Self {
            symbol: symbol.to_string(),
            mint: mint.to_string(),
            decimals,
            coingecko_id: None,
        }
    }

    pub fn with_coingecko_id(mut self, id: &str) -> Self {
        self.coingecko_id = Some(id.to_string());
        self
    }

    /// One whole token expressed in base units (10^decimals), `None` past u128
    pub fn one_unit(&self) -> Option<u128> {
        10u128.checked_pow(u32::from(self.decimals))
    }
}

/// Pair as requested by a caller, before symbol resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairRequest {
    pub token_a: String,
    pub token_b: String,
}

impl PairRequest {
    pub fn new(token_a: impl Into<String>, token_b: impl Into<String>) -> Self {
        Self {
            token_a: token_a.into(),
            token_b: token_b.into(),
        }
    }

    /// Cache key over canonical symbols, so `sol/usdc`, `WSOL/USDC` and `SOL/USDC`
    /// share an entry
    pub fn cache_key(&self) -> String {
        format!(
            "{}/{}",
            canonical_symbol(&self.token_a),
            canonical_symbol(&self.token_b)
        )
    }
}

impl fmt::Display for PairRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.token_a, self.token_b)
    }
}

/// Resolved pair handed to every price source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairContext {
    pub base: TokenInfo,
    pub quote: TokenInfo,
}

impl PairContext {
    pub fn new(base: TokenInfo, quote: TokenInfo) -> Self {
        Self { base, quote }
    }

    pub fn label(&self) -> String {
        format!("{}/{}", self.base.symbol, self.quote.symbol)
    }
}

impl fmt::Display for PairContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base.symbol, self.quote.symbol)
    }
}
