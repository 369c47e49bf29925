//! NewsData REST client
//!
//! One API key, two endpoints: `/crypto` for the crypto feed and `/latest`
//! (business category) for the market feed.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::NewsSource;
use crate::config::Credentials;
use crate::error::UpstreamError;
use crate::http::ensure_success;
use crate::types::{FeedKind, NewsArticle};

const SERVICE: &str = "news provider";

/// Placeholder the provider puts in `content` on restricted plans
const PAID_PLAN_PLACEHOLDER: &str = "ONLY AVAILABLE IN PAID PLANS";

#[derive(Debug, Deserialize)]
struct NewsDataResponse {
    status: String,
    #[serde(default)]
    results: Value,
}

#[derive(Debug, Deserialize)]
struct NewsDataArticle {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    content: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    source_id: Option<String>,
    source_name: Option<String>,
    keywords: Option<Vec<String>>,
}

impl NewsDataArticle {
    /// Articles without a title or link are unusable downstream
    fn into_article(self) -> Option<NewsArticle> {
        let title = non_blank(self.title)?;
        let link = non_blank(self.link)?;
        Some(NewsArticle {
            title,
            link,
            description: non_blank(self.description),
            content: non_blank(self.content).filter(|c| c != PAID_PLAN_PLACEHOLDER),
            published_at: self.pub_date.as_deref().and_then(parse_pub_date),
            source: non_blank(self.source_name).or_else(|| non_blank(self.source_id)),
            keywords: self.keywords.unwrap_or_default(),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `2024-05-01 10:00:00` (UTC) or RFC 3339
fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
        })
}

/// Decode a provider response body into articles
pub(crate) fn decode_articles(body: Value) -> Result<Vec<NewsArticle>, UpstreamError> {
    let response: NewsDataResponse =
        serde_json::from_value(body).map_err(|e| UpstreamError::decode(SERVICE, e.to_string()))?;

    if response.status != "success" {
        let message = response
            .results
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        return Err(UpstreamError::decode(
            SERVICE,
            format!("status '{}': {}", response.status, message),
        ));
    }

    let raw: Vec<NewsDataArticle> = match response.results {
        Value::Null => Vec::new(),
        results => serde_json::from_value(results)
            .map_err(|e| UpstreamError::decode(SERVICE, e.to_string()))?,
    };

    Ok(raw
        .into_iter()
        .filter_map(NewsDataArticle::into_article)
        .collect())
}

#[derive(Debug, Clone)]
pub struct NewsDataClient {
    client: Client,
    base_url: String,
    language: String,
    market_query: String,
    page_size: usize,
}

impl NewsDataClient {
    pub fn new(
        client: Client,
        base_url: &str,
        language: &str,
        market_query: &str,
        page_size: usize,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            language: language.to_string(),
            market_query: market_query.to_string(),
            page_size: page_size.max(1),
        }
    }

    fn request_for(&self, kind: FeedKind, api_key: &str) -> (String, Vec<(&'static str, String)>) {
        let mut query = vec![
            ("apikey", api_key.to_string()),
            ("language", self.language.clone()),
            ("size", self.page_size.to_string()),
        ];
        let url = match kind {
            FeedKind::Crypto => format!("{}/crypto", self.base_url),
            FeedKind::Market => {
                query.push(("category", "business".to_string()));
                query.push(("q", self.market_query.clone()));
                format!("{}/latest", self.base_url)
            }
        };
        (url, query)
    }
}

#[async_trait]
impl NewsSource for NewsDataClient {
    fn name(&self) -> &'static str {
        "NewsData"
    }

    async fn fetch_feed(&self, kind: FeedKind) -> Result<Vec<NewsArticle>, UpstreamError> {
        let api_key = Credentials::NewsApiKey.require()?;
        let (url, query) = self.request_for(kind, &api_key);

        tracing::debug!(source = %self.name(), feed = %kind, url = %url, "Fetching news feed");

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| UpstreamError::transport(SERVICE, e))?;

        let response = ensure_success(SERVICE, response).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::decode(SERVICE, e.to_string()))?;

        decode_articles(body)
    }
}
