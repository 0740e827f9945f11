//! Client configuration.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Default API endpoint when none is configured.
pub const DEFAULT_API_ENDPOINT: &str = "http://localhost:5080";

/// Name of the directory that holds persistent storage under the user's data dir.
pub const APP_DIR_NAME: &str = "session-http";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base address that relative request paths are resolved against.
    pub api_endpoint: String,
    pub user_agent: String,
    /// Transport timeout. `None` leaves the transport's default (no timeout).
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new(api_endpoint: impl Into<String>) -> Self {
        Self {
            api_endpoint: api_endpoint.into(),
            ..Self::default()
        }
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Default storage directory: `<data_dir>/session-http`.
pub fn default_storage_dir() -> Result<PathBuf> {
    let base = dirs::data_dir().context("Could not determine the user data directory")?;
    Ok(base.join(APP_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api_endpoint, DEFAULT_API_ENDPOINT);
        assert!(config.user_agent.starts_with("session-http/"));
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_builder_setters() {
        let config = ClientConfig::new("https://api.example.com")
            .user_agent("tests")
            .timeout(Duration::from_secs(10));
        assert_eq!(config.api_endpoint, "https://api.example.com");
        assert_eq!(config.user_agent, "tests");
        assert_eq!(config.timeout, Some(Duration::from_secs(10)));
    }
}
