// Connection settings for the chat backend

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::error::{ClientError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the backend, e.g. "http://localhost:8000"
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Connect timeout in seconds. Streaming bodies are never timed out.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Validated base URL without a trailing slash
    pub fn normalized_base_url(&self) -> Result<String> {
        let parsed = Url::parse(&self.base_url)
            .map_err(|e| ClientError::Config(format!("Invalid base URL '{}': {}", self.base_url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "Unsupported URL scheme: {}",
                parsed.scheme()
            )));
        }

        Ok(self.base_url.trim_end_matches('/').to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = ClientConfig::new("http://example.com:8000/");
        assert_eq!(config.normalized_base_url().unwrap(), "http://example.com:8000");
    }

    #[test]
    fn test_invalid_urls() {
        assert!(ClientConfig::new("not a url").normalized_base_url().is_err());
        assert!(ClientConfig::new("ftp://example.com").normalized_base_url().is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: ClientConfig = serde_json::from_str(r#"{"base_url": "http://api:9000"}"#).unwrap();
        assert_eq!(config.base_url, "http://api:9000");
        assert_eq!(config.connect_timeout_secs, 10);
    }
}
