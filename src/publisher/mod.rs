//! Publisher
//!
//! Validates generated text and submits it to the social platform. Length
//! and emptiness are checked before any network call.

mod oauth;

pub use oauth::{authorization_header, generate_nonce, sign, OAuthCredentials};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::error::{PublishError, UpstreamError};
use crate::http::truncate_chars;
use crate::types::{PostReceipt, MAX_POST_CHARS};

const SERVICE: &str = "social platform";
const MAX_REJECTION_BODY_CHARS: usize = 500;

/// Destination for validated posts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SocialPlatform: Send + Sync {
    fn name(&self) -> &'static str;

    async fn create_post(&self, text: String) -> Result<PostReceipt, PublishError>;
}

#[derive(Debug, Deserialize)]
struct CreatePostResponse {
    data: CreatePostData,
}

#[derive(Debug, Deserialize)]
struct CreatePostData {
    id: String,
    text: String,
}

/// X/Twitter API v2 client, OAuth 1.0a user context
#[derive(Debug, Clone)]
pub struct TwitterClient {
    client: Client,
    base_url: String,
}

impl TwitterClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SocialPlatform for TwitterClient {
    fn name(&self) -> &'static str {
        "X"
    }

    async fn create_post(&self, text: String) -> Result<PostReceipt, PublishError> {
        let creds = OAuthCredentials::from_env()?;
        let url = format!("{}/tweets", self.base_url);
        let auth = authorization_header(
            "POST",
            &url,
            &[],
            &creds,
            &generate_nonce(),
            Utc::now().timestamp(),
        );

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| UpstreamError::transport(SERVICE, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| UpstreamError::transport(SERVICE, e))?;

        if !status.is_success() {
            return Err(PublishError::Rejected {
                status: status.as_u16(),
                body: sanitize_body(&body),
            });
        }

        let parsed: CreatePostResponse = serde_json::from_str(&body)
            .map_err(|e| UpstreamError::decode(SERVICE, e.to_string()))?;
        Ok(PostReceipt {
            id: parsed.data.id,
            text: parsed.data.text,
        })
    }
}

/// Compact JSON when the body parses, otherwise the truncated raw text
pub fn sanitize_body(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => serde_json::to_string(&value)
            .unwrap_or_else(|_| truncate_chars(body, MAX_REJECTION_BODY_CHARS)),
        Err(_) => truncate_chars(body.trim(), MAX_REJECTION_BODY_CHARS),
    }
}

/// Check a post before it leaves the process
pub fn validate_post(text: &str) -> Result<(), PublishError> {
    if text.trim().is_empty() {
        return Err(PublishError::EmptyText);
    }
    let len = text.chars().count();
    if len > MAX_POST_CHARS {
        return Err(PublishError::TooLong {
            len,
            max: MAX_POST_CHARS,
        });
    }
    Ok(())
}

#[derive(Clone)]
pub struct Publisher {
    platform: Arc<dyn SocialPlatform>,
    dry_run: bool,
}

impl Publisher {
    pub fn new(platform: Arc<dyn SocialPlatform>) -> Self {
        Self {
            platform,
            dry_run: false,
        }
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn publish(&self, text: &str) -> Result<PostReceipt, PublishError> {
        validate_post(text)?;

        if self.dry_run {
            info!(platform = %self.platform.name(), text = %text, "Dry run, post not sent");
            return Ok(PostReceipt {
                id: "dry-run".to_string(),
                text: text.to_string(),
            });
        }

        let receipt = self.platform.create_post(text.to_string()).await?;
        info!(platform = %self.platform.name(), id = %receipt.id, "Post published");
        Ok(receipt)
    }
}
