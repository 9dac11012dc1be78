//! Shared configuration library for notifex.
//!
//! Centralizes `.env` loading, environment-variable parsing, defaults, and
//! validation. The server binary consumes `ConfigLoader::load()` once at
//! startup; validation produces non-fatal warnings (the service can run
//! without Telegram credentials, it just cannot deliver anything).

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_AGGREGATION_DELAY_SECS: u64 = 10;
pub const DEFAULT_TMDB_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub telegram: TelegramConfig,
    pub aggregation: AggregationConfig,
    pub tmdb: TmdbConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct AggregationConfig {
    /// Sliding debounce window; zero disables aggregation entirely
    pub delay: Duration,
}

#[derive(Debug, Clone)]
pub struct TmdbConfig {
    /// Optional; enrichment is skipped without a key
    pub api_key: String,
    pub image_base_url: String,
}

impl TmdbConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// Non-fatal configuration finding surfaced at startup
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

/// A loaded configuration plus everything worth telling the operator
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: Vec<ConfigWarning>,
    pub env_file_loaded: bool,
}

#[derive(Debug, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a `.env` file (when present) and the
    /// process environment.
    pub fn load() -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = dotenvy::dotenv().is_ok();
        let config = Config::from_lookup(|key| std::env::var(key).ok())?;
        let warnings = config.validate();
        Ok(ConfigLoad {
            config,
            warnings,
            env_file_loaded,
        })
    }
}

impl Config {
    /// Build from an arbitrary key lookup; the indirection keeps parsing
    /// testable without mutating process-global environment state.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigLoadError> {
        let host = lookup("WEBHOOK_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_env(&lookup, "WEBHOOK_PORT", DEFAULT_PORT)?;
        let delay_secs = parse_env(
            &lookup,
            "AGGREGATION_DELAY",
            DEFAULT_AGGREGATION_DELAY_SECS,
        )?;

        Ok(Config {
            server: ServerConfig { host, port },
            telegram: TelegramConfig {
                bot_token: lookup("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
                chat_id: lookup("TELEGRAM_CHAT_ID").unwrap_or_default(),
            },
            aggregation: AggregationConfig {
                delay: Duration::from_secs(delay_secs),
            },
            tmdb: TmdbConfig {
                api_key: lookup("TMDB_API_KEY").unwrap_or_default(),
                image_base_url: lookup("TMDB_IMAGE_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_TMDB_IMAGE_BASE_URL.to_string()),
            },
        })
    }

    /// Findings an operator should see at startup. None of these stop the
    /// service; a relay without Telegram credentials still accepts
    /// webhooks, it just cannot deliver.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.telegram.bot_token.is_empty() {
            warnings.push(ConfigWarning {
                message: "TELEGRAM_BOT_TOKEN is not set".to_string(),
                hint: Some("notifications cannot be delivered without it".to_string()),
            });
        }
        if self.telegram.chat_id.is_empty() {
            warnings.push(ConfigWarning {
                message: "TELEGRAM_CHAT_ID is not set".to_string(),
                hint: Some("notifications cannot be delivered without it".to_string()),
            });
        }
        if self.tmdb.api_key.is_empty() {
            warnings.push(ConfigWarning {
                message: "TMDB_API_KEY is not set".to_string(),
                hint: Some("posters and localized synopses will be skipped".to_string()),
            });
        }
        if self.aggregation.delay.is_zero() {
            warnings.push(ConfigWarning {
                message: "AGGREGATION_DELAY is 0, episode aggregation is disabled".to_string(),
                hint: None,
            });
        }

        warnings
    }
}

fn parse_env<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigLoadError>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map_err(|err: T::Err| ConfigLoadError::InvalidValue {
                    key,
                    value: raw,
                    reason: err.to_string(),
                })
        }
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.aggregation.delay, Duration::from_secs(10));
        assert_eq!(config.tmdb.image_base_url, DEFAULT_TMDB_IMAGE_BASE_URL);
        assert!(!config.telegram.is_configured());
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("WEBHOOK_HOST", "127.0.0.1"),
            ("WEBHOOK_PORT", "8080"),
            ("AGGREGATION_DELAY", "30"),
            ("TELEGRAM_BOT_TOKEN", "token"),
            ("TELEGRAM_CHAT_ID", "chat"),
        ]))
        .unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.aggregation.delay, Duration::from_secs(30));
        assert!(config.telegram.is_configured());
    }

    #[test]
    fn invalid_port_is_rejected() {
        let result = Config::from_lookup(lookup_from(&[("WEBHOOK_PORT", "not-a-port")]));
        assert!(matches!(
            result,
            Err(ConfigLoadError::InvalidValue { key: "WEBHOOK_PORT", .. })
        ));
    }

    #[test]
    fn missing_credentials_warn_but_load() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        let warnings = config.validate();
        assert!(
            warnings
                .iter()
                .any(|warning| warning.message.contains("TELEGRAM_BOT_TOKEN"))
        );
    }

    #[test]
    fn zero_delay_warns_about_disabled_aggregation() {
        let config =
            Config::from_lookup(lookup_from(&[("AGGREGATION_DELAY", "0")])).unwrap();
        assert!(config.aggregation.delay.is_zero());
        let warnings = config.validate();
        assert!(
            warnings
                .iter()
                .any(|warning| warning.message.contains("AGGREGATION_DELAY"))
        );
    }
}
