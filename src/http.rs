//! Shared HTTP plumbing for the upstream clients

use anyhow::{Context, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client, Response,
};
use std::time::Duration;

use crate::error::UpstreamError;

const MAX_ERROR_BODY_CHARS: usize = 500;

/// Build the HTTP client every upstream uses. The timeout is the only
/// cancellation mechanism for outbound calls.
pub fn build_client(timeout: Duration) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .user_agent(concat!("metalpost/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to create HTTP client")
}

/// Pass successful responses through; turn anything else into
/// [`UpstreamError::Status`] with a truncated body.
pub async fn ensure_success(
    service: &'static str,
    response: Response,
) -> Result<Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(UpstreamError::Status {
        service,
        status: status.as_u16(),
        body: truncate_chars(&body, MAX_ERROR_BODY_CHARS),
    })
}

pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max).collect()
}
