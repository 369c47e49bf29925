//! Metals pricing provider REST client

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::config::Credentials;
use crate::error::UpstreamError;
use crate::http::ensure_success;
use crate::types::Instrument;

const SERVICE: &str = "pricing provider";

/// Source of raw spot-price responses
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Fetch the latest quote as raw JSON, shape left to the caller
    async fn latest(&self) -> Result<Value, UpstreamError>;
}

/// REST client for the metals price API
#[derive(Debug, Clone)]
pub struct MetalPriceClient {
    client: Client,
    base_url: String,
    base_currency: String,
}

impl MetalPriceClient {
    pub fn new(client: Client, base_url: &str, base_currency: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            base_currency: base_currency.to_uppercase(),
        }
    }
}

#[async_trait]
impl PriceProvider for MetalPriceClient {
    fn name(&self) -> &'static str {
        "MetalPriceAPI"
    }

    async fn latest(&self) -> Result<Value, UpstreamError> {
        let api_key = Credentials::MetalPriceApiKey.require()?;
        let currencies = Instrument::ALL
            .iter()
            .map(Instrument::code)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("{}/latest", self.base_url);

        tracing::debug!(source = %self.name(), url = %url, "Fetching spot prices");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("api_key", api_key.as_str()),
                ("base", self.base_currency.as_str()),
                ("currencies", currencies.as_str()),
            ])
            .send()
            .await
            .map_err(|e| UpstreamError::transport(SERVICE, e))?;

        let response = ensure_success(SERVICE, response).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| UpstreamError::decode(SERVICE, e.to_string()))
    }
}
