//! Configuration section types

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind host for the HTTP API
    pub host: String,
    /// Bind port for the HTTP API
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Data directory holding both single-record documents
    pub data_dir: String,
    /// Settings document file name
    pub settings_file: String,
    /// Price snapshot document file name
    pub price_cache_file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PricesConfig {
    /// Pricing provider base URL
    pub api_url: String,
    /// Quote currency requested from the provider
    pub base_currency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsConfig {
    /// News provider base URL
    pub api_url: String,
    /// Article language filter
    pub language: String,
    /// Search query for the market/business feed
    pub market_query: String,
    /// Maximum articles taken from each feed
    pub per_feed_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Chat-completions endpoint base URL
    pub api_url: String,
    /// Model used for relevance classification
    pub classifier_model: String,
    /// Model used for post generation
    pub generator_model: String,
    /// Sampling temperature for generation
    pub temperature: f32,
    /// Token budget for generation
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublisherConfig {
    /// Social platform API base URL
    pub api_url: String,
    /// Validate and log posts without sending them
    pub dry_run: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds for every outbound call
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Emit JSON lines instead of human-readable logs
    pub json: bool,
}
