//! Price Cache
//!
//! Fetches live spot prices for gold and silver, normalizes whatever shape
//! the provider returns, and keeps the latest snapshot in a single-slot
//! JSON document.

mod normalize;
mod provider;

pub use normalize::{normalize_quote, shape_summary, NormalizedQuote};
#[cfg(test)]
pub use provider::MockPriceProvider;
pub use provider::{MetalPriceClient, PriceProvider};

use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{PriceError, StoreError, UpstreamError};
use crate::persistence::JsonSlot;
use crate::types::PriceSnapshot;

pub struct PriceCache {
    provider: Arc<dyn PriceProvider>,
    slot: JsonSlot<PriceSnapshot>,
    default_base: String,
}

impl PriceCache {
    pub fn new(provider: Arc<dyn PriceProvider>, path: impl Into<PathBuf>) -> Self {
        Self {
            provider,
            slot: JsonSlot::new(path),
            default_base: "USD".to_string(),
        }
    }

    #[must_use]
    pub fn with_default_base(mut self, base: impl Into<String>) -> Self {
        self.default_base = base.into().to_uppercase();
        self
    }

    /// Fetch and normalize a live snapshot. Does not touch the cache.
    pub async fn fetch_live(&self) -> Result<PriceSnapshot, UpstreamError> {
        let body = self.provider.latest().await?;
        let quote = normalize_quote(&body)?;

        Ok(PriceSnapshot {
            last_updated: Some(Utc::now()),
            prices: quote.prices,
            base: quote.base.unwrap_or_else(|| self.default_base.clone()),
        })
    }

    /// Cached snapshot, or the default snapshot if absent or unreadable
    pub fn read(&self) -> PriceSnapshot {
        match self.slot.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => PriceSnapshot::default(),
            Err(e) => {
                warn!(error = %e, "Price cache unreadable, using default snapshot");
                PriceSnapshot::default()
            }
        }
    }

    pub fn write(&self, snapshot: &PriceSnapshot) -> Result<(), StoreError> {
        self.slot.store(snapshot)
    }

    /// Fetch then persist. Nothing is written when the fetch fails.
    pub async fn refresh(&self) -> Result<PriceSnapshot, PriceError> {
        let snapshot = self.fetch_live().await?;
        self.write(&snapshot)?;
        info!(
            source = %self.provider.name(),
            xau = ?snapshot.prices.xau,
            xag = ?snapshot.prices.xag,
            base = %snapshot.base,
            "Price cache refreshed"
        );
        Ok(snapshot)
    }
}
