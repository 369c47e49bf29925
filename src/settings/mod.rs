//! Settings Store
//!
//! Reads, validates and writes the bot settings record (tone, personality,
//! posting interval). Reads never fail; writes either fully succeed or are
//! rejected without touching the stored record.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

use crate::error::{SettingsError, ValidationError};
use crate::persistence::JsonSlot;

pub const MIN_POST_FREQUENCY_MINUTES: i64 = 5;
pub const MAX_POST_FREQUENCY_MINUTES: i64 = 120;
pub const DEFAULT_POST_FREQUENCY_MINUTES: i64 = 30;
pub const DEFAULT_PERSONALITY: &str = "A knowledgeable precious-metals enthusiast who shares market insights in an approachable way.";

/// Voice used for generated posts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Casual,
    Professional,
    Witty,
    Friendly,
    Formal,
}

impl Tone {
    pub const ALL: [Tone; 5] = [
        Tone::Casual,
        Tone::Professional,
        Tone::Witty,
        Tone::Friendly,
        Tone::Formal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Casual => "casual",
            Tone::Professional => "professional",
            Tone::Witty => "witty",
            Tone::Friendly => "friendly",
            Tone::Formal => "formal",
        }
    }
}

impl FromStr for Tone {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Tone::ALL
            .into_iter()
            .find(|tone| tone.as_str() == wanted)
            .ok_or_else(|| ValidationError::UnknownTone {
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted bot settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotSettings {
    pub post_frequency_minutes: i64,
    pub tone: Tone,
    pub personality: String,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            post_frequency_minutes: DEFAULT_POST_FREQUENCY_MINUTES,
            tone: Tone::default(),
            personality: DEFAULT_PERSONALITY.to_string(),
        }
    }
}

/// On-disk shape, tolerant of hand edits. Normalized on read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSettings {
    #[serde(default)]
    post_frequency_minutes: Option<i64>,
    #[serde(default)]
    tone: Option<String>,
    #[serde(default)]
    personality: Option<String>,
}

impl From<&BotSettings> for StoredSettings {
    fn from(settings: &BotSettings) -> Self {
        Self {
            post_frequency_minutes: Some(settings.post_frequency_minutes),
            tone: Some(settings.tone.as_str().to_string()),
            personality: Some(settings.personality.clone()),
        }
    }
}

impl StoredSettings {
    fn normalize(self) -> BotSettings {
        let defaults = BotSettings::default();
        BotSettings {
            post_frequency_minutes: self
                .post_frequency_minutes
                .map(|m| m.clamp(MIN_POST_FREQUENCY_MINUTES, MAX_POST_FREQUENCY_MINUTES))
                .unwrap_or(defaults.post_frequency_minutes),
            tone: self
                .tone
                .and_then(|t| t.parse().ok())
                .unwrap_or(defaults.tone),
            personality: self
                .personality
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(defaults.personality),
        }
    }
}

/// Settings write request. Absent fields take the documented defaults;
/// present but invalid fields are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub post_frequency: Option<i64>,
    pub tone: Option<String>,
    pub personality: Option<String>,
}

impl SettingsUpdate {
    /// Parse a `{postFrequency, tone, personality}` request body
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let obj = body.as_object().ok_or_else(|| ValidationError::Malformed {
            reason: "expected a JSON object".to_string(),
        })?;

        let post_frequency = match obj.get("postFrequency") {
            None | Some(Value::Null) => None,
            Some(v) => Some(parse_integer(v).ok_or_else(|| ValidationError::Malformed {
                reason: format!("postFrequency must be an integer, got {}", v),
            })?),
        };

        let tone = match obj.get("tone") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(v) => {
                return Err(ValidationError::Malformed {
                    reason: format!("tone must be a string, got {}", v),
                })
            }
        };

        let personality = match obj.get("personality") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(v) => {
                return Err(ValidationError::Malformed {
                    reason: format!("personality must be a string, got {}", v),
                })
            }
        };

        Ok(Self {
            post_frequency,
            tone,
            personality,
        })
    }

    /// Validate and resolve into a full settings record
    pub fn validate(&self) -> Result<BotSettings, ValidationError> {
        let defaults = BotSettings::default();

        let post_frequency_minutes = match self.post_frequency {
            Some(value)
                if !(MIN_POST_FREQUENCY_MINUTES..=MAX_POST_FREQUENCY_MINUTES)
                    .contains(&value) =>
            {
                return Err(ValidationError::FrequencyOutOfRange {
                    value,
                    min: MIN_POST_FREQUENCY_MINUTES,
                    max: MAX_POST_FREQUENCY_MINUTES,
                })
            }
            Some(value) => value,
            None => defaults.post_frequency_minutes,
        };

        let tone = match &self.tone {
            Some(raw) => raw.parse()?,
            None => defaults.tone,
        };

        let personality = self
            .personality
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .unwrap_or(defaults.personality);

        Ok(BotSettings {
            post_frequency_minutes,
            tone,
            personality,
        })
    }
}

/// Integers, or floats with no fractional part (JSON forms send `30.0`)
fn parse_integer(value: &Value) -> Option<i64> {
    if let Some(i) = value.as_i64() {
        return Some(i);
    }
    value
        .as_f64()
        .filter(|f| f.is_finite() && f.fract() == 0.0)
        .map(|f| f as i64)
}

/// File-backed settings store
#[derive(Debug, Clone)]
pub struct SettingsStore {
    slot: JsonSlot<StoredSettings>,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            slot: JsonSlot::new(path),
        }
    }

    /// Current settings, or defaults when absent or unreadable
    pub fn read(&self) -> BotSettings {
        match self.slot.load() {
            Ok(Some(stored)) => stored.normalize(),
            Ok(None) => BotSettings::default(),
            Err(e) => {
                warn!(error = %e, "Settings unreadable, using defaults");
                BotSettings::default()
            }
        }
    }

    /// Validate and persist. The stored record is untouched on rejection.
    pub fn write(&self, update: &SettingsUpdate) -> Result<BotSettings, SettingsError> {
        let settings = update.validate()?;
        self.slot.store(&StoredSettings::from(&settings))?;
        info!(
            post_frequency_minutes = settings.post_frequency_minutes,
            tone = %settings.tone,
            "Settings updated"
        );
        Ok(settings)
    }
}
