use std::{net::SocketAddr, time::Duration};

use thiserror::Error;

use crate::advisor::{DEFAULT_DEBOUNCE, DEFAULT_MODEL};

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_GEMINI_MODEL: &str = DEFAULT_MODEL;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid BUDGET_LISTEN_ADDR '{0}'")]
    ListenAddr(String),
    #[error("Invalid BUDGET_LOG_FORMAT '{0}', expected 'text' or 'json'")]
    LogFormat(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub advice_debounce: Duration,
    pub log_format: LogFormat,
}

impl Config {
    /// Reads the process environment after loading a `.env` file if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_addr =
            lookup("BUDGET_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr: SocketAddr = raw_addr
            .trim()
            .parse()
            .map_err(|_| ConfigError::ListenAddr(raw_addr.clone()))?;

        let gemini_api_key = lookup("GEMINI_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        let gemini_model = lookup("GEMINI_MODEL")
            .map(|model| model.trim().to_string())
            .filter(|model| !model.is_empty())
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

        let advice_debounce = lookup("BUDGET_ADVICE_DEBOUNCE_MS")
            .and_then(|ms| ms.trim().parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_DEBOUNCE);

        let log_format = match lookup("BUDGET_LOG_FORMAT") {
            None => LogFormat::Text,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "" | "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => return Err(ConfigError::LogFormat(raw)),
            },
        };

        Ok(Self {
            listen_addr,
            gemini_api_key,
            gemini_model,
            advice_debounce,
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = config_from(&[]).expect("defaults are valid");
        assert_eq!(config.listen_addr, "0.0.0.0:8080".parse().expect("addr"));
        assert_eq!(config.gemini_api_key, None);
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.advice_debounce, Duration::from_millis(1_500));
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn environment_values_override_defaults() {
        let config = config_from(&[
            ("BUDGET_LISTEN_ADDR", "127.0.0.1:3000"),
            ("GEMINI_API_KEY", " secret "),
            ("GEMINI_MODEL", "gemini-test"),
            ("BUDGET_ADVICE_DEBOUNCE_MS", "250"),
            ("BUDGET_LOG_FORMAT", "JSON"),
        ])
        .expect("valid config");
        assert_eq!(config.listen_addr.port(), 3000);
        assert_eq!(config.gemini_api_key.as_deref(), Some("secret"));
        assert_eq!(config.gemini_model, "gemini-test");
        assert_eq!(config.advice_debounce, Duration::from_millis(250));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn blank_key_and_bad_debounce_fall_back() {
        let config = config_from(&[
            ("GEMINI_API_KEY", "   "),
            ("BUDGET_ADVICE_DEBOUNCE_MS", "soon"),
        ])
        .expect("valid config");
        assert_eq!(config.gemini_api_key, None);
        assert_eq!(config.advice_debounce, DEFAULT_DEBOUNCE);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert_eq!(
            config_from(&[("BUDGET_LISTEN_ADDR", "nowhere")]),
            Err(ConfigError::ListenAddr("nowhere".to_string()))
        );
        assert_eq!(
            config_from(&[("BUDGET_LOG_FORMAT", "xml")]),
            Err(ConfigError::LogFormat("xml".to_string()))
        );
    }
}
