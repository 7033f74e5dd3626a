//! Client configuration loaded from TOML files
//!
//! Every section is optional; a missing file section falls back to the
//! defaults below:
//!
//! ```toml
//! [api]
//! base_url = "http://127.0.0.1:5000"
//! chat_path = "/api/chat"
//! health_path = "/api/test"
//! timeout_secs = 60
//!
//! [session]
//! show_greeting = true
//! greeting = "Hello! I am ready to answer questions about the codebase."
//!
//! [ui]
//! title = "Chat With Your Codebase"
//! placeholder = "Ask a question about the repository..."
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_GREETING: &str = "Hello! I am ready to answer questions about the codebase.";

/// Root client configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Answering service location
    #[serde(default)]
    pub api: ApiConfig,

    /// Conversation session behaviour
    #[serde(default)]
    pub session: SessionConfig,

    /// Terminal labels
    #[serde(default)]
    pub ui: UiConfig,
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Reject values the client cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Validation("api.base_url must not be empty".into()));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Validation("api.timeout_secs must be positive".into()));
        }
        for (name, path) in [
            ("api.chat_path", &self.api.chat_path),
            ("api.health_path", &self.api.health_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "{} must start with '/': {}",
                    name, path
                )));
            }
        }
        Ok(())
    }
}

/// Answering service endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base location of the service, e.g. `http://127.0.0.1:5000`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the question/answer endpoint
    #[serde(default = "default_chat_path")]
    pub chat_path: String,

    /// Path of the connectivity probe
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_chat_path() -> String {
    "/api/chat".to_string()
}

fn default_health_path() -> String {
    "/api/test".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            chat_path: default_chat_path(),
            health_path: default_health_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seed the transcript with a greeting from the bot
    #[serde(default = "default_true")]
    pub show_greeting: bool,

    #[serde(default = "default_greeting")]
    pub greeting: String,
}

fn default_true() -> bool {
    true
}

fn default_greeting() -> String {
    DEFAULT_GREETING.to_string()
}

impl SessionConfig {
    /// The greeting to seed, if any
    pub fn greeting(&self) -> Option<String> {
        self.show_greeting.then(|| self.greeting.clone())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            show_greeting: true,
            greeting: default_greeting(),
        }
    }
}

/// Terminal UI labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

fn default_title() -> String {
    "Chat With Your Codebase".to_string()
}

fn default_placeholder() -> String {
    "Ask a question about the repository...".to_string()
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            placeholder: default_placeholder(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}
