//! Relevance Filter
//!
//! One oracle call per article. The oracle answers with a literal token;
//! anything else, or any failure, degrades to `Undetermined`.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::http::truncate_chars;
use crate::llm::{CompletionRequest, LanguageModel};
use crate::types::{NewsArticle, RelevanceVerdict};

pub const TOKEN_RELEVANT: &str = "RELEVANT";
pub const TOKEN_NOT_RELEVANT: &str = "NOT_RELEVANT";
pub const TOKEN_UNSURE: &str = "UNSURE";

const MAX_CONTENT_CHARS: usize = 500;
const CLASSIFY_MAX_TOKENS: u32 = 5;

fn classifier_instructions() -> String {
    format!(
        "You screen news articles for a social media account that covers precious metals (gold and silver).\n\
         \n\
         Answer {relevant} if the article:\n\
         - directly concerns gold, silver or precious-metal markets, or\n\
         - concerns macro factors known to move precious metals: inflation, central-bank policy rates, currency moves (especially the US dollar), or safe-haven flows, or\n\
         - can be connected to precious metals without forcing the connection.\n\
         \n\
         Answer {not_relevant} if connecting the article to precious metals would be a stretch.\n\
         Answer {unsure} if you cannot decide.\n\
         \n\
         Reply with exactly one word: {relevant}, {not_relevant} or {unsure}.",
        relevant = TOKEN_RELEVANT,
        not_relevant = TOKEN_NOT_RELEVANT,
        unsure = TOKEN_UNSURE,
    )
}

#[derive(Clone)]
pub struct RelevanceFilter {
    model: Arc<dyn LanguageModel>,
}

impl RelevanceFilter {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Classify one article. Never fails.
    pub async fn classify(&self, article: &NewsArticle) -> RelevanceVerdict {
        let request = CompletionRequest {
            system: classifier_instructions(),
            user: article_prompt(article),
            max_tokens: CLASSIFY_MAX_TOKENS,
            temperature: 0.0,
        };

        match self.model.complete(request).await {
            Ok(answer) => {
                let verdict = parse_verdict(&answer);
                debug!(title = %article.title, answer = %answer.trim(), ?verdict, "Article classified");
                verdict
            }
            Err(e) => {
                warn!(
                    source = %self.model.name(),
                    title = %article.title,
                    error = %e,
                    "Classification failed, treating as undetermined"
                );
                RelevanceVerdict::Undetermined
            }
        }
    }
}

fn article_prompt(article: &NewsArticle) -> String {
    let mut prompt = format!("Title: {}\n", article.title);
    if let Some(description) = &article.description {
        prompt.push_str(&format!("Description: {}\n", description));
    }
    if let Some(content) = &article.content {
        prompt.push_str(&format!(
            "Content: {}\n",
            truncate_chars(content, MAX_CONTENT_CHARS)
        ));
    }
    prompt
}

/// Map raw oracle output to a verdict. Case, surrounding whitespace, quotes
/// and trailing punctuation are ignored; anything else is undetermined.
pub fn parse_verdict(answer: &str) -> RelevanceVerdict {
    let token = answer
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '.' || c == '!')
        .trim()
        .to_uppercase();

    match token.as_str() {
        TOKEN_RELEVANT => RelevanceVerdict::Relevant,
        TOKEN_NOT_RELEVANT => RelevanceVerdict::NotRelevant,
        TOKEN_UNSURE => RelevanceVerdict::Undetermined,
        _ => RelevanceVerdict::Undetermined,
    }
}
