//! Configuration types

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::BuildError;

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Deadline policy for one comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Ceiling for the whole fan-out
    pub overall_timeout_ms: u64,
    /// Default budget for a single source
    pub source_timeout_ms: u64,
    /// Extra wait when too few quotes arrived by the overall deadline
    pub grace_window_ms: u64,
    /// Quote count below which the grace window applies
    pub min_quotes_before_grace: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            overall_timeout_ms: 4_000,
            source_timeout_ms: 3_000,
            grace_window_ms: 1_000,
            min_quotes_before_grace: 2,
        }
    }
}

impl AggregatorConfig {
    pub fn overall_timeout(&self) -> Duration {
        Duration::from_millis(self.overall_timeout_ms)
    }

    pub fn source_timeout(&self) -> Duration {
        Duration::from_millis(self.source_timeout_ms)
    }

    pub fn grace_window(&self) -> Duration {
        Duration::from_millis(self.grace_window_ms)
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        if self.overall_timeout_ms == 0 {
            return Err(BuildError::InvalidConfig(
                "overall_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.source_timeout_ms == 0 {
            return Err(BuildError::InvalidConfig(
                "source_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_ms: 2_000 }  // dashboard polls every few seconds
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

/// Symbol resolution configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Remote token list consulted for symbols missing from the built-in list
    pub token_list_url: Option<String>,
    pub timeout_ms: Option<u64>,
}

/// One upstream endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub base_url: String,
    /// Overrides the aggregator's default per-source budget
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn enabled_by_default() -> bool {
    true
}

impl EndpointConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            enabled: true,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_ms: None,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Join a path onto the base URL
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

/// Upstream price sources, in registration (tie-break) order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub user_agent: String,
    pub jupiter: EndpointConfig,
    pub dexscreener: EndpointConfig,
    pub coingecko: EndpointConfig,
    pub birdeye: EndpointConfig,
    pub raydium: EndpointConfig,
    pub birdeye_api_key: Option<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            user_agent: "SwapC-Dashboard/1.0".to_string(),
            jupiter: EndpointConfig::new("https://quote-api.jup.ag"),
            dexscreener: EndpointConfig::new("https://api.dexscreener.com"),
            coingecko: EndpointConfig::new("https://api.coingecko.com"),
            birdeye: EndpointConfig::new("https://public-api.birdeye.so"),
            raydium: EndpointConfig::new("https://api.raydium.io"),
            birdeye_api_key: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub json: bool,
}

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub aggregator: AggregatorConfig,
    pub cache: CacheConfig,
    pub resolver: ResolverConfig,
    pub sources: SourcesConfig,
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_deadlines() {
        let config = AggregatorConfig::default();
        assert_eq!(config.overall_timeout(), Duration::from_secs(4));
        assert_eq!(config.source_timeout(), Duration::from_secs(3));
        assert_eq!(config.grace_window(), Duration::from_secs(1));
        assert_eq!(config.min_quotes_before_grace, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = AggregatorConfig {
            overall_timeout_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(BuildError::InvalidConfig(_))));
    }

    #[test]
    fn test_endpoint_url_join() {
        let endpoint = EndpointConfig::new("https://api.raydium.io/");
        assert_eq!(endpoint.url("/v2/main/price"), "https://api.raydium.io/v2/main/price");
        assert_eq!(endpoint.url("v2/main/price"), "https://api.raydium.io/v2/main/price");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{ "cache": { "ttl_ms": 500 }, "sources": { "birdeye_api_key": "k" } }"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.cache.ttl(), Duration::from_millis(500));
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.sources.birdeye_api_key.as_deref(), Some("k"));
        assert!(config.sources.jupiter.enabled);
    }
}
