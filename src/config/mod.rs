//! Configuration management for MetalPost
//!
//! Loads from YAML files + environment variables via .env. Credentials are
//! not part of the config tree; they are resolved at first use through
//! [`Credentials`].

mod credentials;
mod types;

pub use credentials::Credentials;
pub use types::*;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub prices: PricesConfig,
    pub news: NewsConfig,
    pub llm: LlmConfig,
    pub publisher: PublisherConfig,
    pub http: HttpConfig,
    pub log: LogConfig,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::builder_with_defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (METALPOST__*)
            .add_source(Environment::with_prefix("METALPOST").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Built-in defaults only, no files or environment
    pub fn defaults() -> Result<Self> {
        Self::builder_with_defaults()?
            .build()
            .context("Failed to build default configuration")?
            .try_deserialize()
            .context("Failed to deserialize default configuration")
    }

    fn builder_with_defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>> {
        let builder = Config::builder()
            // Server defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            // Storage defaults
            .set_default("storage.data_dir", "./data")?
            .set_default("storage.settings_file", "bot-settings.json")?
            .set_default("storage.price_cache_file", "metal-prices.json")?
            // Pricing provider defaults
            .set_default("prices.api_url", "https://api.metalpriceapi.com/v1")?
            .set_default("prices.base_currency", "USD")?
            // News provider defaults
            .set_default("news.api_url", "https://newsdata.io/api/1")?
            .set_default("news.language", "en")?
            .set_default("news.market_query", "gold OR silver OR precious metals")?
            .set_default("news.per_feed_limit", 10)?
            // Oracle defaults
            .set_default("llm.api_url", "https://api.openai.com/v1")?
            .set_default("llm.classifier_model", "gpt-4o-mini")?
            .set_default("llm.generator_model", "gpt-4o-mini")?
            .set_default("llm.temperature", 0.8)?
            .set_default("llm.max_tokens", 150)?
            // Publisher defaults
            .set_default("publisher.api_url", "https://api.twitter.com/2")?
            .set_default("publisher.dry_run", false)?
            // Transport defaults
            .set_default("http.timeout_secs", 30)?
            .set_default("log.json", false)?;
        Ok(builder)
    }

    pub fn settings_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir).join(&self.storage.settings_file)
    }

    pub fn price_cache_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir).join(&self.storage.price_cache_file)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs.max(1))
    }

    /// Generate a digest of the config (without secrets) for logging
    pub fn digest(&self) -> String {
        format!(
            "bind={}:{} data_dir={} model={} dry_run={}",
            self.server.host,
            self.server.port,
            self.storage.data_dir,
            self.llm.generator_model,
            self.publisher.dry_run
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}
