//! MetalPost entry point
//!
//! Usage:
//!   metalpost            run the HTTP API (same as `metalpost serve`)
//!   metalpost cycle      run one cycle, print the result as JSON and exit

use anyhow::{bail, Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use metalpost::config::AppConfig;
use metalpost::content::ContentGenerator;
use metalpost::cycle::CycleRunner;
use metalpost::http::build_client;
use metalpost::llm::OpenAiClient;
use metalpost::news::{NewsDataClient, NewsFetcher};
use metalpost::prices::{MetalPriceClient, PriceCache};
use metalpost::publisher::{Publisher, TwitterClient};
use metalpost::relevance::{RelevanceFilter, RelevancePipeline};
use metalpost::server::{start_server, ServerState};
use metalpost::settings::SettingsStore;

enum Mode {
    Serve,
    Cycle,
}

fn parse_mode() -> Result<Mode> {
    match std::env::args().nth(1).as_deref() {
        None | Some("serve") => Ok(Mode::Serve),
        Some("cycle") => Ok(Mode::Cycle),
        Some(other) => bail!("unknown mode '{}', expected 'serve' or 'cycle'", other),
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_state(config: &AppConfig) -> Result<ServerState> {
    let client = build_client(config.http_timeout())?;

    let settings = Arc::new(SettingsStore::new(config.settings_path()));

    let price_provider = MetalPriceClient::new(
        client.clone(),
        &config.prices.api_url,
        &config.prices.base_currency,
    );
    let prices = Arc::new(
        PriceCache::new(Arc::new(price_provider), config.price_cache_path())
            .with_default_base(config.prices.base_currency.clone()),
    );

    let news = NewsDataClient::new(
        client.clone(),
        &config.news.api_url,
        &config.news.language,
        &config.news.market_query,
        config.news.per_feed_limit,
    );
    let classifier = OpenAiClient::new(
        client.clone(),
        &config.llm.api_url,
        &config.llm.classifier_model,
    );
    let pipeline = RelevancePipeline::new(
        NewsFetcher::new(Arc::new(news)),
        RelevanceFilter::new(Arc::new(classifier)),
    )
    .with_per_feed_limit(config.news.per_feed_limit);

    let writer = OpenAiClient::new(
        client.clone(),
        &config.llm.api_url,
        &config.llm.generator_model,
    );
    let generator = ContentGenerator::new(Arc::new(writer))
        .with_sampling(config.llm.max_tokens, config.llm.temperature);

    let platform = TwitterClient::new(client, &config.publisher.api_url);
    let publisher = Publisher::new(Arc::new(platform)).with_dry_run(config.publisher.dry_run);

    let runner = Arc::new(CycleRunner::new(
        Arc::clone(&settings),
        Arc::clone(&prices),
        pipeline,
        generator,
        publisher,
    ));

    Ok(ServerState::new(settings, prices, runner))
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging(config.log.json);

    let mode = parse_mode()?;
    info!(config = %config, "MetalPost starting");

    let state = Arc::new(build_state(&config)?);

    match mode {
        Mode::Serve => {
            let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
                .parse()
                .context("Invalid server bind address")?;
            start_server(state, addr).await
        }
        Mode::Cycle => {
            let result = state
                .trigger_cycle()
                .await
                .context("Cycle task aborted")?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.post_outcome.success {
                warn!(message = %result.post_outcome.message, "Cycle finished without publishing");
            }
            Ok(())
        }
    }
}
