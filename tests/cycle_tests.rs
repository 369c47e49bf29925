//! End-to-end cycle tests with every upstream mocked

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use mockall::mock;
    use serde_json::{json, Value};
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use metalpost::content::ContentGenerator;
    use metalpost::cycle::{CycleRunner, PostInput};
    use metalpost::error::{PublishError, UpstreamError};
    use metalpost::llm::{CompletionRequest, LanguageModel};
    use metalpost::news::{NewsFetcher, NewsSource};
    use metalpost::prices::{PriceCache, PriceProvider};
    use metalpost::publisher::{Publisher, SocialPlatform};
    use metalpost::relevance::{RelevanceFilter, RelevancePipeline};
    use metalpost::settings::{SettingsStore, SettingsUpdate};
    use metalpost::types::{FeedKind, MetalPrices, NewsArticle, PostReceipt, PriceSnapshot};

    mock! {
        pub Prices {}
        #[async_trait]
        impl PriceProvider for Prices {
            fn name(&self) -> &'static str;
            async fn latest(&self) -> Result<Value, UpstreamError>;
        }
    }

    mock! {
        pub Source {}
        #[async_trait]
        impl NewsSource for Source {
            fn name(&self) -> &'static str;
            async fn fetch_feed(&self, kind: FeedKind) -> Result<Vec<NewsArticle>, UpstreamError>;
        }
    }

    mock! {
        pub Oracle {}
        #[async_trait]
        impl LanguageModel for Oracle {
            fn name(&self) -> &'static str;
            async fn complete(&self, request: CompletionRequest) -> Result<String, UpstreamError>;
        }
    }

    mock! {
        pub Platform {}
        #[async_trait]
        impl SocialPlatform for Platform {
            fn name(&self) -> &'static str;
            async fn create_post(&self, text: String) -> Result<PostReceipt, PublishError>;
        }
    }

    fn temp_dir(test_name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "metalpost_cycle_{}_{}",
            test_name,
            uuid::Uuid::new_v4()
        ))
    }

    fn live_prices() -> MockPrices {
        let mut provider = MockPrices::new();
        provider.expect_name().return_const("mock");
        provider.expect_latest().returning(|| {
            Ok(json!({
                "success": true,
                "base": "USD",
                "rates": { "USDXAU": 2412.5, "USDXAG": 28.731, "XAU": 0.000414 }
            }))
        });
        provider
    }

    fn failing_prices() -> MockPrices {
        let mut provider = MockPrices::new();
        provider.expect_name().return_const("mock");
        provider
            .expect_latest()
            .returning(|| Err(UpstreamError::decode("pricing provider", "503")));
        provider
    }

    fn news(articles: Vec<NewsArticle>) -> MockSource {
        let mut source = MockSource::new();
        source.expect_name().return_const("mock");
        source.expect_fetch_feed().returning(move |kind| match kind {
            FeedKind::Crypto => Ok(articles.clone()),
            FeedKind::Market => Ok(Vec::new()),
        });
        source
    }

    fn failing_news() -> MockSource {
        let mut source = MockSource::new();
        source.expect_name().return_const("mock");
        source
            .expect_fetch_feed()
            .returning(|_| Err(UpstreamError::decode("news provider", "unauthorized")));
        source
    }

    /// Classifier requests (max_tokens 5) get `verdict`; generation requests
    /// are recorded and answered with `post_text`.
    fn oracle(
        verdict: &'static str,
        post_text: String,
        generation_requests: Arc<Mutex<Vec<CompletionRequest>>>,
    ) -> MockOracle {
        let mut oracle = MockOracle::new();
        oracle.expect_name().return_const("mock");
        oracle.expect_complete().returning(move |request| {
            if request.max_tokens == 5 {
                return Ok(verdict.to_string());
            }
            generation_requests.lock().unwrap().push(request);
            Ok(post_text.clone())
        });
        oracle
    }

    fn accepting_platform() -> MockPlatform {
        let mut platform = MockPlatform::new();
        platform.expect_name().return_const("mock");
        platform.expect_create_post().returning(|text| {
            Ok(PostReceipt {
                id: "1801".to_string(),
                text,
            })
        });
        platform
    }

    fn runner(
        dir: &Path,
        prices: MockPrices,
        source: MockSource,
        oracle: MockOracle,
        platform: MockPlatform,
    ) -> (CycleRunner, Arc<PriceCache>, Arc<SettingsStore>) {
        let model = Arc::new(oracle);
        let settings = Arc::new(SettingsStore::new(dir.join("bot-settings.json")));
        let cache = Arc::new(PriceCache::new(
            Arc::new(prices),
            dir.join("metal-prices.json"),
        ));
        let runner = CycleRunner::new(
            Arc::clone(&settings),
            Arc::clone(&cache),
            RelevancePipeline::new(
                NewsFetcher::new(Arc::new(source)),
                RelevanceFilter::new(model.clone()),
            ),
            ContentGenerator::new(model),
            Publisher::new(Arc::new(platform)),
        );
        (runner, cache, settings)
    }

    fn headline() -> NewsArticle {
        let mut article = NewsArticle::new(
            "Fed signals rate cuts as inflation cools",
            "https://news.example/fed",
        );
        article.description = Some("Treasury yields slid after the announcement.".to_string());
        article
    }

    #[tokio::test]
    async fn test_post_still_published_when_prices_and_news_fail() {
        let dir = temp_dir("degraded");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let (runner, cache, _) = runner(
            &dir,
            failing_prices(),
            failing_news(),
            oracle("RELEVANT", "Metals never sleep.".to_string(), Arc::clone(&requests)),
            accepting_platform(),
        );

        let result = runner.run_cycle().await;

        assert!(!result.price_outcome.success);
        assert!(!result.news_outcome.success);
        assert_eq!(result.news_outcome.message, "No relevant articles found");
        assert!(result.post_outcome.success);
        let details = result.post_outcome.details.unwrap();
        assert_eq!(details.input, PostInput::AbsentPrices);
        assert_eq!(details.post_id.as_deref(), Some("1801"));

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].user.contains("Gold (XAU): N/A"));
        assert!(!cache.read().has_prices());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_happy_path_uses_article_and_fresh_prices() {
        let dir = temp_dir("happy");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let (runner, cache, _) = runner(
            &dir,
            live_prices(),
            news(vec![headline()]),
            oracle("RELEVANT", "\"Rate cuts, gold shines.\"".to_string(), Arc::clone(&requests)),
            accepting_platform(),
        );

        let result = runner.run_cycle().await;

        assert!(result.price_outcome.success);
        assert!(result.news_outcome.success);
        let details = result.post_outcome.details.clone().unwrap();
        assert_eq!(details.input, PostInput::ArticleWithPrices);
        assert_eq!(details.text.as_deref(), Some("Rate cuts, gold shines."));

        let prompt = &requests.lock().unwrap()[0].user;
        assert!(prompt.contains("Headline: Fed signals rate cuts as inflation cools"));
        assert!(prompt.contains("Gold (XAU): 2412.50"));
        assert!(prompt.contains("Silver (XAG): 28.73"));

        assert_eq!(cache.read().prices.xau, Some(2412.5));
        assert!(result.finished_at >= result.started_at);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_failed_refresh_falls_back_to_cached_prices() {
        let dir = temp_dir("fallback");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let (runner, cache, _) = runner(
            &dir,
            failing_prices(),
            news(vec![headline()]),
            oracle("NOT_RELEVANT", "Spot check.".to_string(), Arc::clone(&requests)),
            accepting_platform(),
        );
        cache
            .write(&PriceSnapshot {
                last_updated: Some(chrono::Utc::now()),
                prices: MetalPrices {
                    xau: Some(2300.0),
                    xag: None,
                },
                base: "USD".to_string(),
            })
            .unwrap();

        let result = runner.run_cycle().await;

        assert!(!result.price_outcome.success);
        assert!(!result.news_outcome.success);
        let details = result.post_outcome.details.unwrap();
        assert_eq!(details.input, PostInput::PricesOnly);
        let prompt = &requests.lock().unwrap()[0].user;
        assert!(prompt.contains("Gold (XAU): 2300.00"));
        assert!(prompt.contains("Silver (XAG): N/A"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_cache_write_failure_still_feeds_live_prices_to_post() {
        // A regular file where the data directory should be
        let blocker = temp_dir("unwritable");
        std::fs::write(&blocker, "not a directory").unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let (runner, _, _) = runner(
            &blocker,
            live_prices(),
            news(Vec::new()),
            oracle("RELEVANT", "Spot check.".to_string(), Arc::clone(&requests)),
            accepting_platform(),
        );

        let result = runner.run_cycle().await;

        assert!(!result.price_outcome.success);
        assert!(result.price_outcome.message.contains("write failed"));
        let live = result.price_outcome.details.unwrap();
        assert_eq!(live.prices.xau, Some(2412.5));

        let details = result.post_outcome.details.unwrap();
        assert_eq!(details.input, PostInput::PricesOnly);
        let prompt = &requests.lock().unwrap()[0].user;
        assert!(prompt.contains("Gold (XAU): 2412.50"));
        assert!(prompt.contains("Silver (XAG): 28.73"));

        let _ = std::fs::remove_file(&blocker);
    }

    #[tokio::test]
    async fn test_rejected_publish_keeps_generated_text() {
        let dir = temp_dir("rejected");
        let mut platform = MockPlatform::new();
        platform.expect_name().return_const("mock");
        platform.expect_create_post().returning(|_| {
            Err(PublishError::Rejected {
                status: 403,
                body: r#"{"detail":"duplicate content"}"#.to_string(),
            })
        });
        let (runner, _, _) = runner(
            &dir,
            live_prices(),
            news(Vec::new()),
            oracle("RELEVANT", "Silver slips.".to_string(), Arc::new(Mutex::new(Vec::new()))),
            platform,
        );

        let result = runner.run_cycle().await;

        assert!(result.price_outcome.success);
        assert!(!result.post_outcome.success);
        assert!(result.post_outcome.message.contains("403"));
        let details = result.post_outcome.details.unwrap();
        assert_eq!(details.input, PostInput::PricesOnly);
        assert_eq!(details.text.as_deref(), Some("Silver slips."));
        assert!(details.post_id.is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_overlong_generation_is_truncated_before_publish() {
        let dir = temp_dir("overlong");
        let mut platform = MockPlatform::new();
        platform.expect_name().return_const("mock");
        platform
            .expect_create_post()
            .withf(|text| text.chars().count() == 280 && text.ends_with("..."))
            .times(1)
            .returning(|text| {
                Ok(PostReceipt {
                    id: "1802".to_string(),
                    text,
                })
            });
        let (runner, _, _) = runner(
            &dir,
            live_prices(),
            news(Vec::new()),
            oracle("RELEVANT", "g".repeat(300), Arc::new(Mutex::new(Vec::new()))),
            platform,
        );

        let result = runner.run_cycle().await;
        assert!(result.post_outcome.success);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_empty_generation_skips_publish() {
        let dir = temp_dir("empty");
        let mut platform = MockPlatform::new();
        platform.expect_create_post().times(0);
        let (runner, _, _) = runner(
            &dir,
            live_prices(),
            news(Vec::new()),
            oracle("RELEVANT", "   ".to_string(), Arc::new(Mutex::new(Vec::new()))),
            platform,
        );

        let result = runner.run_cycle().await;
        assert!(!result.post_outcome.success);
        assert!(result.post_outcome.details.unwrap().text.is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_stored_settings_shape_the_prompt() {
        let dir = temp_dir("settings");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let (runner, _, settings) = runner(
            &dir,
            live_prices(),
            news(Vec::new()),
            oracle("RELEVANT", "Steady.".to_string(), Arc::clone(&requests)),
            accepting_platform(),
        );
        settings
            .write(&SettingsUpdate {
                post_frequency: Some(45),
                tone: Some("witty".to_string()),
                personality: Some("A grizzled bullion dealer".to_string()),
            })
            .unwrap();

        runner.run_cycle().await;

        let system = &requests.lock().unwrap()[0].system;
        assert!(system.contains("Tone: witty"));
        assert!(system.contains("Personality: A grizzled bullion dealer"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
