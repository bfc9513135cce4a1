use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

const DEFAULT_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BOT_NAME: &str = "Llama 2 ChatBot";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("QUIZ_API_BASE_URL {value:?} is not a usable URL: {reason}")]
    InvalidBaseUrl { value: String, reason: String },
    #[error("QUIZ_API_TIMEOUT_SECS {value:?} must be a positive number of seconds")]
    InvalidTimeout { value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub quiz_api_base_url: Url,
    pub request_timeout: Duration,
    pub bot_name: String,
}

impl Config {
    /// Reads the process environment; call after `.env` has been loaded.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = get("QUIZ_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let quiz_api_base_url = parse_base_url(base_url.trim())?;

        let request_timeout = match get("QUIZ_API_TIMEOUT_SECS") {
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => return Err(ConfigError::InvalidTimeout { value }),
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let bot_name = get("QUIZ_BOT_NAME")
            .map(|name| name.trim().to_string())
            .unwrap_or_else(|| DEFAULT_BOT_NAME.to_string());

        Ok(Self {
            quiz_api_base_url,
            request_timeout,
            bot_name,
        })
    }
}

fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        value: value.to_string(),
        reason,
    };

    let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme {:?}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[]).unwrap();
        assert_eq!(config.quiz_api_base_url.as_str(), "http://localhost:5000/");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.bot_name, "Llama 2 ChatBot");
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("QUIZ_API_BASE_URL", "https://quiz.example.com/v1"),
            ("QUIZ_API_TIMEOUT_SECS", "5"),
            ("QUIZ_BOT_NAME", "Tutor"),
        ])
        .unwrap();
        assert_eq!(config.quiz_api_base_url.as_str(), "https://quiz.example.com/v1");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.bot_name, "Tutor");
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = config(&[("QUIZ_API_BASE_URL", "  "), ("QUIZ_BOT_NAME", "")]).unwrap();
        assert_eq!(config.quiz_api_base_url.as_str(), "http://localhost:5000/");
        assert_eq!(config.bot_name, "Llama 2 ChatBot");
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(matches!(
            config(&[("QUIZ_API_BASE_URL", "not a url")]),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            config(&[("QUIZ_API_BASE_URL", "ftp://quiz.example.com")]),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn rejects_bad_timeout() {
        for value in ["0", "-3", "soon"] {
            assert_eq!(
                config(&[("QUIZ_API_TIMEOUT_SECS", value)]),
                Err(ConfigError::InvalidTimeout {
                    value: value.to_string()
                })
            );
        }
    }
}
