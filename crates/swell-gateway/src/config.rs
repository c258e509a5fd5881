//! Client configuration.

use std::path::Path;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Reconnect backoff window.
///
/// After a transport fault the supervisor sleeps a uniformly random delay
/// inside this window before the next attempt, spreading reconnection load
/// when many clients lose the same gateway at once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Minimum delay in seconds.
    pub min_secs: u64,
    /// Maximum delay in seconds.
    pub max_secs: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_secs: 3,
            max_secs: 20,
        }
    }
}

impl BackoffConfig {
    /// Pick a random delay within the window.
    #[must_use]
    pub fn delay(&self) -> Duration {
        let min_ms = self.min_secs * 1000;
        let max_ms = self.max_secs.max(self.min_secs) * 1000;
        let mut rng = rand::thread_rng();
        Duration::from_millis(rng.gen_range(min_ms..=max_ms))
    }
}

/// Main gateway client configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Gateway websocket URL.
    pub url: String,
    /// Account token presented in identify and resume frames.
    pub token: String,
    /// Event-class subscription bitmask.
    #[serde(default)]
    pub intents: u64,
    /// Reconnect backoff window.
    #[serde(default)]
    pub backoff: BackoffConfig,
}

impl GatewayConfig {
    /// Create a configuration with default backoff and no intents.
    #[must_use]
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            intents: 0,
            backoff: BackoffConfig::default(),
        }
    }

    /// Set the subscription intents.
    #[must_use]
    pub const fn with_intents(mut self, intents: u64) -> Self {
        self.intents = intents;
        self
    }

    /// Set the backoff window.
    #[must_use]
    pub const fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ClientError::Config(format!(
                "failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid.
    pub fn from_json(content: &str) -> Result<Self, ClientError> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| ClientError::Config(format!("invalid JSON: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.url.is_empty() {
            return Err(ClientError::Config("url cannot be empty".to_string()));
        }

        if !self.url.starts_with("ws://") && !self.url.starts_with("wss://") {
            return Err(ClientError::Config(
                "url must start with ws:// or wss://".to_string(),
            ));
        }

        if self.token.is_empty() {
            return Err(ClientError::Config("token cannot be empty".to_string()));
        }

        if self.backoff.min_secs == 0 {
            return Err(ClientError::Config(
                "backoff.min_secs must be greater than 0".to_string(),
            ));
        }

        if self.backoff.max_secs < self.backoff.min_secs {
            return Err(ClientError::Config(
                "backoff.max_secs cannot be less than backoff.min_secs".to_string(),
            ));
        }

        Ok(())
    }
}
