//! Content Generator
//!
//! Builds a news-grounded or price-only prompt, calls the generative oracle
//! and enforces the platform length bound on the result.

use std::sync::Arc;
use tracing::info;

use crate::error::GenerationError;
use crate::llm::{CompletionRequest, LanguageModel};
use crate::settings::BotSettings;
use crate::types::{GeneratedPost, Instrument, NewsArticle, PriceSnapshot, MAX_POST_CHARS};

pub const ELLIPSIS: &str = "...";

const NO_EXTREMA_CONSTRAINT: &str = "\
Only current point-in-time prices are available to you. Never claim or imply an all-time high, \
all-time low, record, multi-year high or low, or any other historical extreme.";

/// Which template a prompt was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTemplate {
    NewsGrounded,
    PriceOnly,
}

#[derive(Clone)]
pub struct ContentGenerator {
    model: Arc<dyn LanguageModel>,
    max_tokens: u32,
    temperature: f32,
}

impl ContentGenerator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            max_tokens: 150,
            temperature: 0.8,
        }
    }

    #[must_use]
    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    /// Compose one post. The article selects the template; missing prices
    /// render as N/A.
    pub async fn compose(
        &self,
        article: Option<&NewsArticle>,
        prices: Option<&PriceSnapshot>,
        settings: &BotSettings,
    ) -> Result<GeneratedPost, GenerationError> {
        let (template, request) = self.build_request(article, prices, settings);
        let raw = self.model.complete(request).await?;
        let text = enforce_length(&raw)?;

        info!(
            source = %self.model.name(),
            template = ?template,
            chars = text.chars().count(),
            "Post generated"
        );
        Ok(GeneratedPost { text })
    }

    pub fn build_request(
        &self,
        article: Option<&NewsArticle>,
        prices: Option<&PriceSnapshot>,
        settings: &BotSettings,
    ) -> (PromptTemplate, CompletionRequest) {
        let template = match article {
            Some(_) => PromptTemplate::NewsGrounded,
            None => PromptTemplate::PriceOnly,
        };
        let request = CompletionRequest {
            system: system_prompt(settings),
            user: match article {
                Some(article) => news_prompt(article, prices),
                None => price_prompt(prices),
            },
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        (template, request)
    }
}

fn system_prompt(settings: &BotSettings) -> String {
    format!(
        "You write short social media posts about precious metals.\n\
         Tone: {tone}\n\
         Personality: {personality}\n\
         Keep every post under {max} characters, including hashtags.\n\
         {constraint}",
        tone = settings.tone,
        personality = settings.personality,
        max = MAX_POST_CHARS,
        constraint = NO_EXTREMA_CONSTRAINT,
    )
}

fn news_prompt(article: &NewsArticle, prices: Option<&PriceSnapshot>) -> String {
    let mut prompt = String::from("Write one post connecting this news to precious metals.\n\n");
    prompt.push_str(&format!("Headline: {}\n", article.title));
    if let Some(description) = &article.description {
        prompt.push_str(&format!("Summary: {}\n", description));
    }
    if let Some(source) = &article.source {
        prompt.push_str(&format!("Source: {}\n", source));
    }
    prompt.push('\n');
    prompt.push_str(&price_block(prices));
    prompt
}

fn price_prompt(prices: Option<&PriceSnapshot>) -> String {
    format!(
        "Write one post commenting on the current precious-metal prices.\n\n{}",
        price_block(prices)
    )
}

/// Current prices, two decimals each, `N/A` when unknown
pub fn price_block(prices: Option<&PriceSnapshot>) -> String {
    let base = prices.map(|p| p.base.as_str()).unwrap_or("USD");
    let mut block = format!("Current spot prices ({} per troy ounce):\n", base);
    for instrument in Instrument::ALL {
        let value = prices
            .and_then(|p| p.prices.get(instrument))
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "N/A".to_string());
        block.push_str(&format!(
            "- {} ({}): {}\n",
            instrument.metal_name(),
            instrument.code(),
            value
        ));
    }
    block
}

/// Trim, unwrap outer quotes, reject empty output, and cut anything over
/// the limit to 277 characters plus [`ELLIPSIS`].
pub fn enforce_length(raw: &str) -> Result<String, GenerationError> {
    let trimmed = strip_outer_quotes(raw.trim()).trim();
    if trimmed.is_empty() {
        return Err(GenerationError::EmptyGeneration);
    }

    if trimmed.chars().count() <= MAX_POST_CHARS {
        return Ok(trimmed.to_string());
    }

    let keep = MAX_POST_CHARS - ELLIPSIS.chars().count();
    let mut text: String = trimmed.chars().take(keep).collect();
    text.push_str(ELLIPSIS);
    Ok(text)
}

/// Unwrap a single quotation spanning the whole text. `"Buy" or "sell"` is
/// two quotations and stays as is.
fn strip_outer_quotes(text: &str) -> &str {
    for (open, close) in [('"', '"'), ('\u{201C}', '\u{201D}')] {
        if text.chars().count() >= 2 && text.starts_with(open) && text.ends_with(close) {
            let inner = &text[open.len_utf8()..text.len() - close.len_utf8()];
            if !inner.contains(open) && !inner.contains(close) {
                return inner;
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLanguageModel;
    use crate::settings::Tone;
    use crate::types::MetalPrices;

    fn settings() -> BotSettings {
        BotSettings {
            post_frequency_minutes: 30,
            tone: Tone::Witty,
            personality: "A sardonic vault keeper".to_string(),
        }
    }

    fn snapshot(xau: Option<f64>, xag: Option<f64>) -> PriceSnapshot {
        PriceSnapshot {
            last_updated: None,
            prices: MetalPrices { xau, xag },
            base: "USD".to_string(),
        }
    }

    #[test]
    fn long_output_is_cut_to_limit_with_ellipsis() {
        let raw: String = (0..300).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let text = enforce_length(&raw).unwrap();
        assert_eq!(text.chars().count(), 280);
        assert!(text.ends_with(ELLIPSIS));
        assert_eq!(&text[..277], &raw[..277]);
    }

    #[test]
    fn output_at_limit_is_untouched() {
        let raw = "g".repeat(280);
        assert_eq!(enforce_length(&raw).unwrap(), raw);
    }

    #[test]
    fn blank_output_is_empty_generation() {
        assert!(matches!(
            enforce_length("   \n "),
            Err(GenerationError::EmptyGeneration)
        ));
        assert!(matches!(
            enforce_length("\"\""),
            Err(GenerationError::EmptyGeneration)
        ));
    }

    #[test]
    fn outer_quotes_are_removed() {
        assert_eq!(enforce_length("\"Gold shines\"").unwrap(), "Gold shines");
        assert_eq!(
            enforce_length("\u{201C}Silver too\u{201D}").unwrap(),
            "Silver too"
        );
    }

    #[test]
    fn separate_quotations_are_left_intact() {
        assert_eq!(
            enforce_length("\"Buy\" or \"sell\"? Gold doesn't care.\"").unwrap(),
            "\"Buy\" or \"sell\"? Gold doesn't care.\""
        );
        assert_eq!(
            enforce_length("\"Buy\" or \"sell\"").unwrap(),
            "\"Buy\" or \"sell\""
        );
        assert_eq!(
            enforce_length("\u{201C}Hold\u{201D} vs \u{201C}fold\u{201D}").unwrap(),
            "\u{201C}Hold\u{201D} vs \u{201C}fold\u{201D}"
        );
    }

    #[test]
    fn price_block_formats_two_decimals_and_na() {
        let block = price_block(Some(&snapshot(Some(2350.256), None)));
        assert!(block.contains("Gold (XAU): 2350.26"));
        assert!(block.contains("Silver (XAG): N/A"));

        let absent = price_block(None);
        assert!(absent.contains("Gold (XAU): N/A"));
        assert!(absent.contains("Silver (XAG): N/A"));
    }

    #[test]
    fn both_templates_carry_settings_and_extrema_constraint() {
        let generator = ContentGenerator::new(Arc::new(MockLanguageModel::new()));
        let article = NewsArticle::new("Dollar weakens", "https://example.com/usd");
        let prices = snapshot(Some(2400.0), Some(30.0));

        let (template, news) = generator.build_request(Some(&article), Some(&prices), &settings());
        assert_eq!(template, PromptTemplate::NewsGrounded);
        assert!(news.user.contains("Headline: Dollar weakens"));
        assert!(news.user.contains("2400.00"));

        let (template, price_only) = generator.build_request(None, None, &settings());
        assert_eq!(template, PromptTemplate::PriceOnly);
        assert!(price_only.user.contains("N/A"));

        for request in [&news, &price_only] {
            assert!(request.system.contains("Tone: witty"));
            assert!(request.system.contains("Personality: A sardonic vault keeper"));
            assert!(request.system.contains("all-time high"));
        }
    }

    #[tokio::test]
    async fn compose_returns_bounded_post() {
        let mut model = MockLanguageModel::new();
        model.expect_name().return_const("mock");
        model
            .expect_complete()
            .times(1)
            .returning(|_| Ok(format!("  {}  ", "x".repeat(400))));

        let post = ContentGenerator::new(Arc::new(model))
            .compose(None, None, &settings())
            .await
            .unwrap();
        assert_eq!(post.char_len(), 280);
    }

    #[tokio::test]
    async fn compose_empty_output_fails() {
        let mut model = MockLanguageModel::new();
        model.expect_complete().returning(|_| Ok(String::new()));

        let err = ContentGenerator::new(Arc::new(model))
            .compose(None, None, &settings())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::EmptyGeneration));
    }
}
