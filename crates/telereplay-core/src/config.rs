//! Replay configuration.
//!
//! Every field has a default, so an empty TOML file (or no file at all) is a
//! valid configuration:
//!
//! ```toml
//! tick_interval_ms = 150
//! minimum_tick_ms = 25
//! kill_event_names = ["kill_feed", "kill"]
//! window_radius = 10
//!
//! [details]
//! max_depth = 3
//! value_chars = 120
//! event_pairs = 24
//! info_pairs = 28
//! raw_chars = 300
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use telereplay_types::KillCategory;

use crate::error::ConfigError;

/// Default tick interval.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 150;

/// Floor for the tick interval. Near-zero intervals would spin the actor.
pub const DEFAULT_MINIMUM_TICK_MS: u64 = 25;

/// Half-width of the cursor context window.
pub const DEFAULT_WINDOW_RADIUS: usize = 10;

/// Top-level replay configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Initial tick interval for playback.
    pub tick_interval_ms: u64,
    /// Floor applied to any requested tick interval.
    pub minimum_tick_ms: u64,
    /// Event names counted and filtered as "kill".
    pub kill_event_names: KillCategory,
    /// Limits for the display details text.
    pub details: DetailLimits,
    /// Half-width of the cursor context window.
    pub window_radius: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            minimum_tick_ms: DEFAULT_MINIMUM_TICK_MS,
            kill_event_names: KillCategory::default(),
            details: DetailLimits::default(),
            window_radius: DEFAULT_WINDOW_RADIUS,
        }
    }
}

impl ReplayConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded replay config");
        Ok(config)
    }
}

/// Bounds for the flattened `key=value` details text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailLimits {
    /// Maximum nesting depth flattened.
    pub max_depth: usize,
    /// Per-value truncation, in characters.
    pub value_chars: usize,
    /// Pair cap for occurrence details.
    pub event_pairs: usize,
    /// Pair cap for snapshot details.
    pub info_pairs: usize,
    /// Cap for the raw-JSON fallback text.
    pub raw_chars: usize,
}

impl Default for DetailLimits {
    fn default() -> Self {
        Self {
            max_depth: 3,
            value_chars: 120,
            event_pairs: 24,
            info_pairs: 28,
            raw_chars: 300,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_is_default() {
        let config = ReplayConfig::from_toml_str("").unwrap();
        assert_eq!(config, ReplayConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let config = ReplayConfig::from_toml_str(
            r#"
            tick_interval_ms = 40
            kill_event_names = ["elimination"]

            [details]
            event_pairs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.tick_interval_ms, 40);
        assert_eq!(config.minimum_tick_ms, DEFAULT_MINIMUM_TICK_MS);
        assert!(config.kill_event_names.matches("elimination"));
        assert!(!config.kill_event_names.matches("kill"));
        assert_eq!(config.details.event_pairs, 5);
        assert_eq!(config.details.info_pairs, 28);
    }

    #[test]
    fn test_invalid_config() {
        let err = ReplayConfig::from_toml_str("tick_interval_ms = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "minimum_tick_ms = 10").unwrap();

        let config = ReplayConfig::load(file.path()).unwrap();
        assert_eq!(config.minimum_tick_ms, 10);
    }

    #[test]
    fn test_load_missing_file() {
        let err = ReplayConfig::load("/nonexistent/telereplay.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
