// Bot configuration - the shape of the tier config file and its validation.
//
// Loaded once at startup (see infra::config) and never changed afterwards.

use crate::core::moderation::PolicyRule;
use crate::core::tiers::{Tier, TierTableError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_DEBOUNCE_WINDOW_MS: u64 = 3_000;
pub const MAX_DEBOUNCE_WINDOW_MS: u64 = 10_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid tier table: {0}")]
    Tiers(#[from] TierTableError),

    #[error("Debounce window must be between 1 and {max} ms, got {0}", max = MAX_DEBOUNCE_WINDOW_MS)]
    DebounceWindow(u64),

    #[error("Template for {tier} is missing the {{member}} placeholder: {template:?}")]
    Template { tier: Tier, template: String },

    #[error("Invalid value for {key}: {value:?}")]
    InvalidOverride { key: &'static str, value: String },

    #[error("Failed to compile classifier pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// One configured tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    pub tier: Tier,
    pub role_id: u64,
    /// Display name used in announcements
    #[serde(default)]
    pub name: String,
    /// Moderation rule; `None` means the tier is unrestricted
    #[serde(default)]
    pub policy: Option<PolicyRule>,
    /// Whether gaining this tier is announced
    #[serde(default = "default_true")]
    pub announce: bool,
    /// Announcement variants; empty uses the built-in template
    #[serde(default)]
    pub templates: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnouncementConfig {
    /// Webhook used as the primary announcement path
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Channel used when the webhook fails
    #[serde(default)]
    pub fallback_channel_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    pub tiers: Vec<TierConfig>,
    #[serde(default = "default_debounce_window_ms")]
    pub debounce_window_ms: u64,
    #[serde(default)]
    pub announcements: AnnouncementConfig,
    /// Log the classified features of every inbound message
    #[serde(default)]
    pub debug_messages: bool,
}

fn default_true() -> bool {
    true
}

fn default_debounce_window_ms() -> u64 {
    DEFAULT_DEBOUNCE_WINDOW_MS
}

impl BotConfig {
    pub fn debounce_window(&self) -> Result<Duration, ConfigError> {
        if self.debounce_window_ms == 0 || self.debounce_window_ms > MAX_DEBOUNCE_WINDOW_MS {
            return Err(ConfigError::DebounceWindow(self.debounce_window_ms));
        }
        Ok(Duration::from_millis(self.debounce_window_ms))
    }

    pub fn moderated_tiers(&self) -> impl Iterator<Item = (Tier, &PolicyRule)> {
        self.tiers
            .iter()
            .filter_map(|t| t.policy.as_ref().map(|policy| (t.tier, policy)))
    }
}
