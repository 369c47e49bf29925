//! News Fetcher
//!
//! Retrieves candidate articles from the crypto feed and the market feed.
//! The two feeds are fetched concurrently and fail independently: a failed
//! feed contributes no articles and a recorded reason.

mod newsdata;

pub use newsdata::NewsDataClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::UpstreamError;
use crate::types::{FeedKind, NewsArticle};

/// Upstream news provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_feed(&self, kind: FeedKind) -> Result<Vec<NewsArticle>, UpstreamError>;
}

/// Why one feed produced nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedFailure {
    pub kind: FeedKind,
    pub reason: String,
}

/// Articles from both feeds, in provider order
#[derive(Debug, Clone, Default)]
pub struct FeedBatch {
    pub crypto: Vec<NewsArticle>,
    pub market: Vec<NewsArticle>,
    pub failures: Vec<FeedFailure>,
}

impl FeedBatch {
    /// Up to `per_feed` articles from each feed, crypto first
    pub fn combined(&self, per_feed: usize) -> Vec<NewsArticle> {
        self.crypto
            .iter()
            .take(per_feed)
            .chain(self.market.iter().take(per_feed))
            .cloned()
            .collect()
    }
}

#[derive(Clone)]
pub struct NewsFetcher {
    source: Arc<dyn NewsSource>,
}

impl NewsFetcher {
    pub fn new(source: Arc<dyn NewsSource>) -> Self {
        Self { source }
    }

    /// Fetch both feeds concurrently. Never fails.
    pub async fn fetch_both(&self) -> FeedBatch {
        let (crypto, market) = tokio::join!(
            self.source.fetch_feed(FeedKind::Crypto),
            self.source.fetch_feed(FeedKind::Market),
        );

        let mut failures = Vec::new();
        let batch = FeedBatch {
            crypto: self.settle(FeedKind::Crypto, crypto, &mut failures),
            market: self.settle(FeedKind::Market, market, &mut failures),
            failures,
        };

        info!(
            source = %self.source.name(),
            crypto = batch.crypto.len(),
            market = batch.market.len(),
            failed_feeds = batch.failures.len(),
            "News feeds fetched"
        );
        batch
    }

    fn settle(
        &self,
        kind: FeedKind,
        result: Result<Vec<NewsArticle>, UpstreamError>,
        failures: &mut Vec<FeedFailure>,
    ) -> Vec<NewsArticle> {
        match result {
            Ok(articles) => articles,
            Err(e) => {
                warn!(source = %self.source.name(), feed = %kind, error = %e, "News feed failed");
                failures.push(FeedFailure {
                    kind,
                    reason: e.to_string(),
                });
                Vec::new()
            }
        }
    }
}
