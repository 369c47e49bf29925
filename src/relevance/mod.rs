//! Relevance Pipeline
//!
//! Fetches both news feeds, classifies the combined list one article at a
//! time and stops at the first three accepted.

mod filter;

pub use filter::{parse_verdict, RelevanceFilter, TOKEN_NOT_RELEVANT, TOKEN_RELEVANT, TOKEN_UNSURE};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::news::{FeedFailure, NewsFetcher};
use crate::types::{NewsArticle, RelevanceVerdict};

pub const DEFAULT_PER_FEED_LIMIT: usize = 10;
pub const MAX_ACCEPTED: usize = 3;

/// Per-verdict tallies for one pipeline run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictCounts {
    pub relevant: usize,
    pub not_relevant: usize,
    pub undetermined: usize,
}

impl VerdictCounts {
    fn record(&mut self, verdict: RelevanceVerdict) {
        match verdict {
            RelevanceVerdict::Relevant => self.relevant += 1,
            RelevanceVerdict::NotRelevant => self.not_relevant += 1,
            RelevanceVerdict::Undetermined => self.undetermined += 1,
        }
    }
}

/// Everything one pipeline run observed
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub accepted: Vec<NewsArticle>,
    pub candidates: usize,
    pub examined: usize,
    pub verdicts: VerdictCounts,
    pub feed_failures: Vec<FeedFailure>,
}

impl PipelineReport {
    /// Accepted articles, `None` when nothing passed
    pub fn into_relevant(self) -> Option<Vec<NewsArticle>> {
        (!self.accepted.is_empty()).then_some(self.accepted)
    }
}

#[derive(Clone)]
pub struct RelevancePipeline {
    fetcher: NewsFetcher,
    filter: RelevanceFilter,
    per_feed_limit: usize,
}

impl RelevancePipeline {
    pub fn new(fetcher: NewsFetcher, filter: RelevanceFilter) -> Self {
        Self {
            fetcher,
            filter,
            per_feed_limit: DEFAULT_PER_FEED_LIMIT,
        }
    }

    #[must_use]
    pub fn with_per_feed_limit(mut self, limit: usize) -> Self {
        self.per_feed_limit = limit;
        self
    }

    /// Up to [`MAX_ACCEPTED`] relevant articles, or `None`. Not an error
    /// when nothing is found, including when both feeds fail.
    pub async fn collect_relevant(&self) -> Option<Vec<NewsArticle>> {
        self.run().await.into_relevant()
    }

    /// Full run with diagnostics
    pub async fn run(&self) -> PipelineReport {
        let batch = self.fetcher.fetch_both().await;
        let candidates = batch.combined(self.per_feed_limit);

        let mut report = PipelineReport {
            candidates: candidates.len(),
            feed_failures: batch.failures,
            ..PipelineReport::default()
        };

        // Sequential: the oracle is rate limited.
        for article in candidates {
            if report.accepted.len() >= MAX_ACCEPTED {
                break;
            }
            let verdict = self.filter.classify(&article).await;
            report.examined += 1;
            report.verdicts.record(verdict);
            if verdict.is_accepted() {
                report.accepted.push(article);
            }
        }

        info!(
            candidates = report.candidates,
            examined = report.examined,
            accepted = report.accepted.len(),
            undetermined = report.verdicts.undetermined,
            "Relevance pipeline finished"
        );
        report
    }
}
