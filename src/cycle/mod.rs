//! Cycle Orchestrator
//!
//! One cycle runs three branches: price, news and post. Each branch records
//! its own outcome; no branch failure stops another from running. The post
//! branch always runs, using the best input the other two left behind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::content::ContentGenerator;
use crate::news::FeedFailure;
use crate::prices::PriceCache;
use crate::publisher::Publisher;
use crate::relevance::{PipelineReport, RelevancePipeline, VerdictCounts};
use crate::settings::{BotSettings, SettingsStore};
use crate::types::{NewsArticle, PriceSnapshot};

/// Result of one branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchOutcome<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<T>,
}

impl<T> BranchOutcome<T> {
    pub fn ok(message: impl Into<String>, details: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn failed(message: impl Into<String>, details: Option<T>) -> Self {
        Self {
            success: false,
            message: message.into(),
            details,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRef {
    pub title: String,
    pub link: String,
}

impl From<&NewsArticle> for ArticleRef {
    fn from(article: &NewsArticle) -> Self {
        Self {
            title: article.title.clone(),
            link: article.link.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsDetails {
    pub accepted: Vec<ArticleRef>,
    pub candidates: usize,
    pub examined: usize,
    pub verdicts: VerdictCounts,
    pub feed_failures: Vec<FeedFailure>,
}

impl From<&PipelineReport> for NewsDetails {
    fn from(report: &PipelineReport) -> Self {
        Self {
            accepted: report.accepted.iter().map(ArticleRef::from).collect(),
            candidates: report.candidates,
            examined: report.examined,
            verdicts: report.verdicts,
            feed_failures: report.feed_failures.clone(),
        }
    }
}

/// Input the post branch was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostInput {
    #[serde(rename = "article+prices")]
    ArticleWithPrices,
    #[serde(rename = "article")]
    ArticleOnly,
    #[serde(rename = "prices")]
    PricesOnly,
    #[serde(rename = "absent-prices")]
    AbsentPrices,
}

/// (article available, prices available) -> post input, highest precedence
/// first.
const POST_INPUT_TABLE: [(bool, bool, PostInput); 4] = [
    (true, true, PostInput::ArticleWithPrices),
    (true, false, PostInput::ArticleOnly),
    (false, true, PostInput::PricesOnly),
    (false, false, PostInput::AbsentPrices),
];

pub fn choose_post_input(has_article: bool, has_prices: bool) -> PostInput {
    POST_INPUT_TABLE
        .iter()
        .find(|(article, prices, _)| *article == has_article && *prices == has_prices)
        .map(|(_, _, input)| *input)
        .unwrap_or(PostInput::AbsentPrices)
}

impl PostInput {
    pub fn uses_article(&self) -> bool {
        matches!(self, PostInput::ArticleWithPrices | PostInput::ArticleOnly)
    }

    pub fn uses_prices(&self) -> bool {
        matches!(self, PostInput::ArticleWithPrices | PostInput::PricesOnly)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetails {
    pub input: PostInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
}

/// Externally visible report of one cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleResult {
    pub cycle_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub price_outcome: BranchOutcome<PriceSnapshot>,
    pub news_outcome: BranchOutcome<NewsDetails>,
    pub post_outcome: BranchOutcome<PostDetails>,
}

pub struct CycleRunner {
    settings: Arc<SettingsStore>,
    prices: Arc<PriceCache>,
    pipeline: RelevancePipeline,
    generator: ContentGenerator,
    publisher: Publisher,
}

impl CycleRunner {
    pub fn new(
        settings: Arc<SettingsStore>,
        prices: Arc<PriceCache>,
        pipeline: RelevancePipeline,
        generator: ContentGenerator,
        publisher: Publisher,
    ) -> Self {
        Self {
            settings,
            prices,
            pipeline,
            generator,
            publisher,
        }
    }

    pub async fn run_cycle(&self) -> CycleResult {
        let cycle_id = Uuid::new_v4();
        let span = tracing::info_span!("cycle", cycle_id = %cycle_id);
        self.run_branches(cycle_id).instrument(span).await
    }

    async fn run_branches(&self, cycle_id: Uuid) -> CycleResult {
        let started_at = Utc::now();
        let settings = self.settings.read();
        info!(tone = %settings.tone, "Cycle started");

        let (price_outcome, snapshot) = self.price_branch().await;
        let (news_outcome, article) = self.news_branch().await;
        let post_outcome = self
            .post_branch(article.as_ref(), snapshot.as_ref(), &settings)
            .await;

        info!(
            price_ok = price_outcome.success,
            news_ok = news_outcome.success,
            post_ok = post_outcome.success,
            "Cycle finished"
        );

        CycleResult {
            cycle_id,
            started_at,
            finished_at: Utc::now(),
            price_outcome,
            news_outcome,
            post_outcome,
        }
    }

    /// Fetch, then persist. A failed write still hands the live snapshot to
    /// the post branch; a failed fetch falls back to whatever the cache holds.
    async fn price_branch(&self) -> (BranchOutcome<PriceSnapshot>, Option<PriceSnapshot>) {
        let snapshot = match self.prices.fetch_live().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Price branch failed");
                let cached = self.prices.read();
                let fallback = cached.has_prices().then_some(cached);
                return (
                    BranchOutcome::failed(format!("Price refresh failed: {}", e), None),
                    fallback,
                );
            }
        };

        match self.prices.write(&snapshot) {
            Ok(()) => {
                info!(
                    xau = ?snapshot.prices.xau,
                    xag = ?snapshot.prices.xag,
                    base = %snapshot.base,
                    "Price cache refreshed"
                );
                (
                    BranchOutcome::ok("Prices refreshed", snapshot.clone()),
                    Some(snapshot),
                )
            }
            Err(e) => {
                warn!(error = %e, "Live prices fetched but cache write failed");
                (
                    BranchOutcome::failed(
                        format!("Price cache write failed: {}", e),
                        Some(snapshot.clone()),
                    ),
                    Some(snapshot),
                )
            }
        }
    }

    async fn news_branch(&self) -> (BranchOutcome<NewsDetails>, Option<NewsArticle>) {
        let report = self.pipeline.run().await;
        let details = NewsDetails::from(&report);

        match report.into_relevant() {
            Some(accepted) => {
                let message = format!("{} relevant article(s) found", accepted.len());
                let first = accepted.into_iter().next();
                (BranchOutcome::ok(message, details), first)
            }
            None => (
                BranchOutcome::failed("No relevant articles found", Some(details)),
                None,
            ),
        }
    }

    async fn post_branch(
        &self,
        article: Option<&NewsArticle>,
        snapshot: Option<&PriceSnapshot>,
        settings: &BotSettings,
    ) -> BranchOutcome<PostDetails> {
        let input = choose_post_input(article.is_some(), snapshot.is_some());
        let article = article.filter(|_| input.uses_article());
        let snapshot = snapshot.filter(|_| input.uses_prices());
        info!(input = ?input, "Composing post");

        let post = match self.generator.compose(article, snapshot, settings).await {
            Ok(post) => post,
            Err(e) => {
                warn!(error = %e, "Post generation failed");
                return BranchOutcome::failed(
                    format!("Generation failed: {}", e),
                    Some(PostDetails {
                        input,
                        text: None,
                        post_id: None,
                    }),
                );
            }
        };

        match self.publisher.publish(&post.text).await {
            Ok(receipt) => BranchOutcome::ok(
                "Post published",
                PostDetails {
                    input,
                    text: Some(post.text),
                    post_id: Some(receipt.id),
                },
            ),
            Err(e) => {
                warn!(error = %e, "Publish failed");
                BranchOutcome::failed(
                    format!("Publish failed: {}", e),
                    Some(PostDetails {
                        input,
                        text: Some(post.text),
                        post_id: None,
                    }),
                )
            }
        }
    }
}
