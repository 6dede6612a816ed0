//! Layered configuration loading
//!
//! Built-in defaults, then `config/swapc.{toml,json,yaml}` if present, then
//! `SWAPC_*` environment variables with `__` separating nested keys
//! (`SWAPC_SERVER__PORT=8080`, `SWAPC_SOURCES__BIRDEYE__ENABLED=false`).

use config::{Config, ConfigError, Environment, File, Source};

use swapc_core::AppConfig;

pub const DEFAULT_CONFIG_FILE: &str = "config/swapc";

/// Load settings from the default file location and the environment
pub fn load() -> Result<AppConfig, ConfigError> {
    load_from(DEFAULT_CONFIG_FILE)
}

/// Load settings from `path` (extension optional) and the environment
pub fn load_from(path: &str) -> Result<AppConfig, ConfigError> {
    let mut settings = assemble(File::with_name(path).required(false))?;

    if settings.sources.birdeye_api_key.is_none() {
        settings.sources.birdeye_api_key = std::env::var("BIRDEYE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
    }

    Ok(settings)
}

fn assemble<S>(file: S) -> Result<AppConfig, ConfigError>
where
    S: Source + Send + Sync + 'static,
{
    Config::builder()
        .add_source(Config::try_from(&AppConfig::default())?)
        .add_source(file)
        .add_source(
            Environment::with_prefix("SWAPC")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}
