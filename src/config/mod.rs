//! Application configuration

pub mod client;

use std::env;
use std::path::PathBuf;

pub use client::{ApiConfig, ClientConfig, ConfigError, SessionConfig, UiConfig};

#[derive(Debug, Clone)]
pub struct Config {
    pub client: ClientConfig,
    pub log_file: PathBuf,
}

impl Config {
    /// Build the configuration from an optional `CHAT_CONFIG` TOML file,
    /// then apply environment overrides on top.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut client = match lookup("CHAT_CONFIG") {
            Some(path) => ClientConfig::from_file(&PathBuf::from(path))?,
            None => ClientConfig::default(),
        };

        if let Some(url) = lookup("CHAT_API_URL") {
            client.api.base_url = url;
        }
        if let Some(path) = lookup("CHAT_API_PATH") {
            client.api.chat_path = path;
        }
        if let Some(path) = lookup("CHAT_HEALTH_PATH") {
            client.api.health_path = path;
        }
        if let Some(secs) = lookup("CHAT_TIMEOUT_SECS") {
            client.api.timeout_secs = secs.parse().map_err(|_| {
                ConfigError::Validation(format!("CHAT_TIMEOUT_SECS is not a number: {}", secs))
            })?;
        }
        if let Some(greeting) = lookup("CHAT_GREETING") {
            // An empty greeting turns the seeded message off
            client.session.show_greeting = !greeting.is_empty();
            if !greeting.is_empty() {
                client.session.greeting = greeting;
            }
        }

        client.validate()?;

        Ok(Self {
            client,
            log_file: lookup("CHAT_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("codebase-chat.log")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.client, ClientConfig::default());
        assert_eq!(config.log_file, PathBuf::from("codebase-chat.log"));
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("CHAT_API_URL", "http://10.0.0.2:5001"),
            ("CHAT_TIMEOUT_SECS", "5"),
            ("CHAT_GREETING", "Ask me about LangChain."),
            ("CHAT_LOG_FILE", "/tmp/chat.log"),
        ]))
        .unwrap();

        assert_eq!(config.client.api.base_url, "http://10.0.0.2:5001");
        assert_eq!(config.client.api.timeout_secs, 5);
        assert_eq!(
            config.client.session.greeting().as_deref(),
            Some("Ask me about LangChain.")
        );
        assert_eq!(config.log_file, PathBuf::from("/tmp/chat.log"));
    }

    #[test]
    fn test_empty_greeting_disables_seed() {
        let config = Config::from_lookup(lookup(&[("CHAT_GREETING", "")])).unwrap();
        assert_eq!(config.client.session.greeting(), None);
    }

    #[test]
    fn test_bad_timeout_is_rejected() {
        let err = Config::from_lookup(lookup(&[("CHAT_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_missing_config_file() {
        let err = Config::from_lookup(lookup(&[("CHAT_CONFIG", "/nonexistent/chat.toml")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
