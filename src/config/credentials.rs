//! Credential resolution
//!
//! Credentials are read from the environment when an operation first needs
//! them. A missing one fails only that operation.

use crate::error::ConfigError;

/// Named credential with its accepted environment variable names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credentials {
    MetalPriceApiKey,
    NewsApiKey,
    LlmApiKey,
    PlatformConsumerKey,
    PlatformConsumerSecret,
    PlatformAccessToken,
    PlatformAccessSecret,
}

impl Credentials {
    fn env_names(&self) -> &'static [&'static str] {
        match self {
            Credentials::MetalPriceApiKey => &["METAL_PRICE_API_KEY"],
            Credentials::NewsApiKey => &["NEWSDATA_API_KEY", "NEWS_API_KEY"],
            Credentials::LlmApiKey => &["OPENAI_API_KEY"],
            Credentials::PlatformConsumerKey => &["TWITTER_API_KEY", "X_API_KEY"],
            Credentials::PlatformConsumerSecret => &["TWITTER_API_SECRET", "X_API_SECRET"],
            Credentials::PlatformAccessToken => &["TWITTER_ACCESS_TOKEN", "X_ACCESS_TOKEN"],
            Credentials::PlatformAccessSecret => &["TWITTER_ACCESS_SECRET", "X_ACCESS_SECRET"],
        }
    }

    /// Primary variable name, used in error messages
    pub fn name(&self) -> &'static str {
        self.env_names()[0]
    }

    /// First non-blank value among the accepted variable names
    pub fn resolve(&self) -> Option<String> {
        self.env_names().iter().find_map(|var| {
            std::env::var(var)
                .ok()
                .filter(|value| !value.trim().is_empty())
        })
    }

    pub fn require(&self) -> Result<String, ConfigError> {
        self.resolve()
            .ok_or(ConfigError::MissingCredential { name: self.name() })
    }
}
