//! Core types used throughout MetalPost
//!
//! Price snapshots, news articles, relevance verdicts and generated posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum post length accepted by the social platform
pub const MAX_POST_CHARS: usize = 280;

/// Tracked precious-metal instruments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instrument {
    XAU,
    XAG,
}

impl Instrument {
    pub const ALL: [Instrument; 2] = [Instrument::XAU, Instrument::XAG];

    /// ISO 4217 code used by pricing providers
    pub fn code(&self) -> &'static str {
        match self {
            Instrument::XAU => "XAU",
            Instrument::XAG => "XAG",
        }
    }

    /// Human-readable metal name, used in prompts
    pub fn metal_name(&self) -> &'static str {
        match self {
            Instrument::XAU => "Gold",
            Instrument::XAG => "Silver",
        }
    }

    /// Key aliases a provider may use for this instrument, matched
    /// case-insensitively. Quoted-pair keys win over bare codes, which some
    /// providers report as the inverse rate.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Instrument::XAU => &["usdxau", "xauusd", "xau", "gold"],
            Instrument::XAG => &["usdxag", "xagusd", "xag", "silver"],
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Per-instrument prices. Both keys are always serialized, `null` when unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetalPrices {
    #[serde(rename = "XAU", default)]
    pub xau: Option<f64>,
    #[serde(rename = "XAG", default)]
    pub xag: Option<f64>,
}

impl MetalPrices {
    pub fn get(&self, instrument: Instrument) -> Option<f64> {
        match instrument {
            Instrument::XAU => self.xau,
            Instrument::XAG => self.xag,
        }
    }

    pub fn set(&mut self, instrument: Instrument, value: Option<f64>) {
        match instrument {
            Instrument::XAU => self.xau = value,
            Instrument::XAG => self.xag = value,
        }
    }

    pub fn any(&self) -> bool {
        self.xau.is_some() || self.xag.is_some()
    }
}

/// Point-in-time price snapshot, persisted as a single-slot document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub prices: MetalPrices,
    #[serde(default = "default_base_currency")]
    pub base: String,
}

fn default_base_currency() -> String {
    "USD".to_string()
}

impl Default for PriceSnapshot {
    fn default() -> Self {
        Self {
            last_updated: None,
            prices: MetalPrices::default(),
            base: default_base_currency(),
        }
    }
}

impl PriceSnapshot {
    /// True when at least one instrument has a price
    pub fn has_prices(&self) -> bool {
        self.prices.any()
    }
}

/// Which upstream feed an article came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Crypto,
    Market,
}

impl FeedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedKind::Crypto => "crypto",
            FeedKind::Market => "market",
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate news article. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub title: String,
    pub link: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub source: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl NewsArticle {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            description: None,
            content: None,
            published_at: None,
            source: None,
            keywords: Vec::new(),
        }
    }
}

/// Relevance classification outcome.
///
/// `Undetermined` gates acceptance exactly like `NotRelevant` but stays
/// distinguishable in logs and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelevanceVerdict {
    Relevant,
    NotRelevant,
    Undetermined,
}

impl RelevanceVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, RelevanceVerdict::Relevant)
    }
}

/// Generated post text, at most [`MAX_POST_CHARS`] characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedPost {
    pub text: String,
}

impl GeneratedPost {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Platform acknowledgement of a published post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostReceipt {
    pub id: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_serializes_both_instrument_keys() {
        let json = serde_json::to_value(PriceSnapshot::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "lastUpdated": null,
                "prices": { "XAU": null, "XAG": null },
                "base": "USD"
            })
        );
    }

    #[test]
    fn snapshot_missing_fields_fill_defaults() {
        let snapshot: PriceSnapshot =
            serde_json::from_str(r#"{"prices":{"XAU":2400.5}}"#).unwrap();
        assert_eq!(snapshot.prices.xau, Some(2400.5));
        assert_eq!(snapshot.prices.xag, None);
        assert_eq!(snapshot.base, "USD");
        assert!(snapshot.last_updated.is_none());
    }

    #[test]
    fn only_relevant_is_accepted() {
        assert!(RelevanceVerdict::Relevant.is_accepted());
        assert!(!RelevanceVerdict::NotRelevant.is_accepted());
        assert!(!RelevanceVerdict::Undetermined.is_accepted());
    }
}
