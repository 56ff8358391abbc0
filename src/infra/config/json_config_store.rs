// JSON-file backed bot config, with environment variable overrides on top.
//
// Environment overrides (all optional):
// - ANNOUNCE_WEBHOOK_URL: primary announcement webhook
// - LEVEL_UP_CHANNEL: fallback announcement channel id
// - PROMOTION_DEBOUNCE_MS: debounce window in milliseconds
// - DEBUG_MESSAGES: log classified features for every message ("true"/"false")

use crate::core::config::{BotConfig, ConfigError};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/tiers.json";

pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the file. No overrides, no validation beyond the schema.
    pub fn load(&self) -> Result<BotConfig, ConfigError> {
        let file = std::fs::File::open(&self.path)?;
        let config = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(config)
    }

    /// Load the file and apply overrides from the process environment.
    pub fn load_with_env(&self) -> Result<BotConfig, ConfigError> {
        let config = self.load()?;
        apply_env_overrides(config, |key| std::env::var(key).ok())
    }
}

/// Apply overrides using `lookup` to read variables, so tests don't touch the real env.
pub fn apply_env_overrides(
    mut config: BotConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<BotConfig, ConfigError> {
    let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(url) = read("ANNOUNCE_WEBHOOK_URL") {
        config.announcements.webhook_url = Some(url);
    }

    if let Some(value) = read("LEVEL_UP_CHANNEL") {
        let channel_id = value
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidOverride {
                key: "LEVEL_UP_CHANNEL",
                value: value.clone(),
            })?;
        config.announcements.fallback_channel_id = Some(channel_id);
    }

    if let Some(value) = read("PROMOTION_DEBOUNCE_MS") {
        config.debounce_window_ms =
            value
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidOverride {
                    key: "PROMOTION_DEBOUNCE_MS",
                    value: value.clone(),
                })?;
    }

    if let Some(value) = read("DEBUG_MESSAGES") {
        config.debug_messages =
            value
                .parse::<bool>()
                .map_err(|_| ConfigError::InvalidOverride {
                    key: "DEBUG_MESSAGES",
                    value: value.clone(),
                })?;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tiers::Tier;
    use std::collections::HashMap;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "tiers": [
            { "tier": "T0", "role_id": 1001, "name": "Newcomer",
              "policy": { "links": { "mode": "none" } } },
            { "tier": "T5", "role_id": 1005, "name": "Legend" }
        ],
        "announcements": { "webhook_url": "https://discord.com/api/webhooks/1/abc" }
    }"#;

    fn write_sample() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        file
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn loads_config_from_file() {
        let file = write_sample();
        let config = JsonConfigStore::new(file.path()).load().unwrap();

        assert_eq!(config.tiers.len(), 2);
        assert_eq!(config.tiers[1].tier, Tier::T5);
        assert!(config.tiers[0].policy.is_some());
        assert_eq!(
            config.announcements.webhook_url.as_deref(),
            Some("https://discord.com/api/webhooks/1/abc")
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonConfigStore::new(dir.path().join("nope.json"));
        assert!(matches!(store.load(), Err(ConfigError::Io(_))));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{ "tiers": [ { "tier": "T9", "role_id": 1 } ] }"#)
            .unwrap();
        let store = JsonConfigStore::new(file.path());
        assert!(matches!(store.load(), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn env_overrides_win_over_file() {
        let file = write_sample();
        let config = JsonConfigStore::new(file.path()).load().unwrap();

        let config = apply_env_overrides(
            config,
            env(&[
                ("ANNOUNCE_WEBHOOK_URL", "https://discord.com/api/webhooks/2/xyz"),
                ("LEVEL_UP_CHANNEL", " 424242 "),
                ("PROMOTION_DEBOUNCE_MS", "4500"),
                ("DEBUG_MESSAGES", "true"),
            ]),
        )
        .unwrap();

        assert_eq!(
            config.announcements.webhook_url.as_deref(),
            Some("https://discord.com/api/webhooks/2/xyz")
        );
        assert_eq!(config.announcements.fallback_channel_id, Some(424242));
        assert_eq!(config.debounce_window_ms, 4500);
        assert!(config.debug_messages);
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let file = write_sample();
        let config = JsonConfigStore::new(file.path()).load().unwrap();
        let before = config.clone();

        let config = apply_env_overrides(config, env(&[("LEVEL_UP_CHANNEL", "  ")])).unwrap();
        assert_eq!(config, before);
    }

    #[test]
    fn unparsable_override_is_rejected() {
        let file = write_sample();
        let config = JsonConfigStore::new(file.path()).load().unwrap();

        let err = apply_env_overrides(config, env(&[("LEVEL_UP_CHANNEL", "#general")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidOverride {
                key: "LEVEL_UP_CHANNEL",
                ..
            }
        ));
    }
}
