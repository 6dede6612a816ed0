//! Symbol to token resolution
//!
//! The built-in list answers the popular symbols without any I/O. A remote
//! Solana token list can be layered on top; it is downloaded once and kept in
//! memory for the life of the process.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use swapc_core::{get_token, ResolveError, ResolveResult, TokenInfo};

/// Resolves a ticker symbol to source-facing token identifiers
#[async_trait::async_trait]
pub trait TokenResolver: Send + Sync {
    async fn resolve(&self, symbol: &str) -> ResolveResult<TokenInfo>;
}

/// Built-in token list only
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticResolver;

#[async_trait::async_trait]
impl TokenResolver for StaticResolver {
    async fn resolve(&self, symbol: &str) -> ResolveResult<TokenInfo> {
        get_token(symbol)
            .cloned()
            .ok_or_else(|| ResolveError::UnknownSymbol(symbol.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct TokenList {
    tokens: Vec<TokenListEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenListEntry {
    address: String,
    symbol: String,
    decimals: u8,
    #[serde(default)]
    extensions: Option<TokenListExtensions>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenListExtensions {
    coingecko_id: Option<String>,
}

/// Parse a Solana token-list document
pub fn parse_token_list(body: &[u8]) -> Result<Vec<TokenInfo>, serde_json::Error> {
    let list: TokenList = serde_json::from_slice(body)?;
    Ok(list
        .tokens
        .into_iter()
        .map(|entry| {
            let mut token = TokenInfo::new(&entry.symbol, &entry.address, entry.decimals);
            token.coingecko_id = entry.extensions.and_then(|e| e.coingecko_id);
            token
        })
        .collect())
}

/// Built-in list first, then a lazily downloaded remote token list
pub struct TokenListResolver {
    client: Client,
    url: String,
    timeout: Duration,
    tokens: OnceCell<Arc<Vec<TokenInfo>>>,
}

impl TokenListResolver {
    pub fn new(client: Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
            tokens: OnceCell::new(),
        }
    }

    /// Pre-seeded list, skips the download
    pub fn with_tokens(client: Client, url: impl Into<String>, tokens: Vec<TokenInfo>) -> Self {
        Self {
            client,
            url: url.into(),
            timeout: Duration::from_secs(5),
            tokens: OnceCell::new_with(Some(Arc::new(tokens))),
        }
    }

    async fn tokens(&self) -> ResolveResult<Arc<Vec<TokenInfo>>> {
        self.tokens
            .get_or_try_init(|| async {
                info!("Downloading token list from {}", self.url);
                let body = self
                    .client
                    .get(&self.url)
                    .timeout(self.timeout)
                    .send()
                    .await
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| ResolveError::TokenListUnavailable(e.to_string()))?
                    .bytes()
                    .await
                    .map_err(|e| ResolveError::TokenListUnavailable(e.to_string()))?;

                let tokens = parse_token_list(&body)
                    .map_err(|e| ResolveError::TokenListUnavailable(e.to_string()))?;
                info!("Loaded {} tokens", tokens.len());
                Ok::<_, ResolveError>(Arc::new(tokens))
            })
            .await
            .cloned()
    }
}

#[async_trait::async_trait]
impl TokenResolver for TokenListResolver {
    async fn resolve(&self, symbol: &str) -> ResolveResult<TokenInfo> {
        if let Some(token) = get_token(symbol) {
            return Ok(token.clone());
        }

        let tokens = match self.tokens().await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("Token list lookup for {} failed: {}", symbol, e);
                return Err(e);
            }
        };

        let wanted = symbol.trim().to_uppercase();
        tokens
            .iter()
            .find(|t| t.symbol.to_uppercase() == wanted)
            .cloned()
            .ok_or_else(|| ResolveError::UnknownSymbol(symbol.to_string()))
    }
}
