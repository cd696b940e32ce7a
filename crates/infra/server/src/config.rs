//! Relay configuration.

use std::path::Path;

use media_webhooks::WebhookConfig;
use serde::{Deserialize, Serialize};

/// Top-level relay configuration.
///
/// ```toml
/// log_level = "debug"
///
/// [webhook]
/// url = "https://example.com/webhook"
/// api_key = "key"
/// api_secret = "secret"
///
/// [webhook.filter]
/// exclude_events = ["track_published"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Log level.
    pub log_level: String,
    /// Delivery settings.
    pub webhook: WebhookConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            webhook: WebhookConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Parses configuration from TOML.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RelayConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the configured log level, falling back to `INFO`.
    pub fn level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.webhook.url.is_empty() {
            return Err(ConfigError::Invalid("webhook.url is required".to_string()));
        }
        if self.webhook.api_key.is_empty() || self.webhook.api_secret.is_empty() {
            return Err(ConfigError::Invalid(
                "webhook.api_key and webhook.api_secret are required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads configuration from a TOML file.
pub fn load_config(path: impl AsRef<Path>) -> Result<RelayConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
    RelayConfig::from_toml(&content)
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        log_level = "debug"

        [webhook]
        url = "https://example.com/webhook"
        api_key = "key"
        api_secret = "secret"
        queue_size = 20
        max_retries = 2

        [webhook.filter]
        exclude_events = ["track_published"]
    "#;

    #[test]
    fn test_parse_full_config() {
        let config = RelayConfig::from_toml(FULL).unwrap();
        assert_eq!(config.level(), tracing::Level::DEBUG);
        assert_eq!(config.webhook.url, "https://example.com/webhook");
        assert_eq!(config.webhook.queue_size, 20);
        assert_eq!(config.webhook.max_retries, 2);
        assert_eq!(config.webhook.retry_wait_min_ms, 1_000);
        assert_eq!(config.webhook.filter.exclude_events, vec!["track_published".to_string()]);
    }

    #[test]
    fn test_missing_url_is_invalid() {
        let result = RelayConfig::from_toml("log_level = \"info\"");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_keys_are_invalid() {
        let result = RelayConfig::from_toml("[webhook]\nurl = \"http://localhost/hook\"");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let result = RelayConfig::from_toml("[webhook");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_unknown_level_falls_back_to_info() {
        let config = RelayConfig {
            log_level: "chatty".to_string(),
            ..RelayConfig::default()
        };
        assert_eq!(config.level(), tracing::Level::INFO);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/relay.toml");
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
