//! Well-known Solana token definitions
//!
//! CRITICAL: Always use correct decimals!
//! - SOL: 9 decimals
//! - USDC/USDT: 6 decimals
//! - Wormhole ETH/BTC: 8 decimals
//! - BONK: 5 decimals

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::TokenInfo;

/// Symbols suggested to callers when a lookup fails
pub const POPULAR_SYMBOLS: &[&str] = &["SOL", "USDC", "USDT", "ETH", "BTC"];

/// Well-known token list keyed by upper-case symbol
pub static TOKENS: LazyLock<HashMap<&'static str, TokenInfo>> = LazyLock::new(|| {
    let mut tokens = HashMap::new();

    tokens.insert("SOL", TokenInfo::new(
        "SOL", "So11111111111111111111111111111111111111112", 9,
    ).with_coingecko_id("solana"));
    tokens.insert("USDC", TokenInfo::new(
        "USDC", "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", 6,  // ⚠️ 6 decimals!
    ).with_coingecko_id("usd-coin"));
    tokens.insert("USDT", TokenInfo::new(
        "USDT", "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB", 6,  // ⚠️ 6 decimals!
    ).with_coingecko_id("tether"));
    tokens.insert("ETH", TokenInfo::new(
        "ETH", "7vfCXTUXx5WJV5JADk17DUJ4ksgau7utNKj4b963voxs", 8,  // Wormhole, 8 decimals
    ).with_coingecko_id("ethereum"));
    tokens.insert("BTC", TokenInfo::new(
        "BTC", "3NZ9JMVBmGAqocybic2c7LQCJScmgsAZ6vQqTDzcqmJh", 8,  // Wormhole WBTC
    ).with_coingecko_id("bitcoin"));
    tokens.insert("BONK", TokenInfo::new(
        "BONK", "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263", 5,
    ).with_coingecko_id("bonk"));
    tokens.insert("JUP", TokenInfo::new(
        "JUP", "JUPyiwrYJFskUPiHa7hkeR8VUtAeFoSYbKedZNsDvCN", 6,
    ).with_coingecko_id("jupiter-exchange-solana"));
    tokens.insert("RAY", TokenInfo::new(
        "RAY", "4k3Dyjzvzp8eMZWUXbBCjEvwSkkk59S5iCNLY3QrkX6R", 6,
    ).with_coingecko_id("raydium"));

    tokens
});

/// Upper-cased symbol with aliases folded onto the token they name
pub fn canonical_symbol(symbol: &str) -> String {
    let symbol = symbol.trim().to_uppercase();
    // wrapped SOL shares the native mint
    if symbol == "WSOL" {
        "SOL".to_string()
    } else {
        symbol
    }
}

/// Get token by symbol (case-insensitive)
pub fn get_token(symbol: &str) -> Option<&'static TokenInfo> {
    TOKENS.get(canonical_symbol(symbol).as_str())
}

/// Get token by mint address
pub fn get_token_by_mint(mint: &str) -> Option<&'static TokenInfo> {
    TOKENS.values().find(|t| t.mint == mint)
}
