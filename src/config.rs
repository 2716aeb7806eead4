//! Configuration for the AI exchange client

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use crate::error::AiError;

/// AI exchange client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Chat completion endpoint URL (read from env AI_API_URL if not set)
    #[serde(default)]
    pub api_endpoint: String,

    /// API key (read from env AI_API_KEY if not set)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Attempts per request, first try included
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Base backoff in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Double the backoff after every retry
    #[serde(default = "default_retry_exponential")]
    pub retry_exponential: bool,

    /// Give up immediately on 404 responses
    #[serde(default)]
    pub skip_retry_on_not_found: bool,

    /// When set, only these status codes are retried
    #[serde(default)]
    pub retry_only_on_status_codes: Option<HashSet<u16>>,
}

// Default value functions
fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_timeout_ms() -> u64 {
    30_000
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    1_000
}
fn default_retry_exponential() -> bool {
    true
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_endpoint: String::new(),
            api_key: None,
            model: default_model(),
            timeout_ms: default_timeout_ms(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            retry_exponential: default_retry_exponential(),
            skip_retry_on_not_found: false,
            retry_only_on_status_codes: None,
        }
    }
}

impl AiConfig {
    /// Load configuration from environment variables
    pub fn from_env(mut self) -> Self {
        if let Ok(val) = std::env::var("AI_API_URL") {
            self.api_endpoint = val;
        }

        if let Ok(val) = std::env::var("AI_API_KEY") {
            self.api_key = Some(val);
        }

        if let Ok(val) = std::env::var("MODEL_NAME") {
            self.model = val;
        }

        if let Ok(val) = std::env::var("AI_TIMEOUT_MS") {
            if let Ok(ms) = val.parse() {
                self.timeout_ms = ms;
            }
        }

        if let Ok(val) = std::env::var("AI_RETRY_ATTEMPTS") {
            if let Ok(attempts) = val.parse() {
                self.retry_attempts = attempts;
            }
        }

        if let Ok(val) = std::env::var("AI_RETRY_DELAY_MS") {
            if let Ok(ms) = val.parse() {
                self.retry_delay_ms = ms;
            }
        }

        if let Ok(val) = std::env::var("AI_RETRY_EXPONENTIAL") {
            self.retry_exponential = val.to_lowercase() == "true" || val == "1";
        }

        self
    }

    /// Check that everything an exchange needs is present.
    pub fn validate(&self) -> Result<(), AiError> {
        if self.api_endpoint.is_empty() {
            return Err(AiError::Configuration("api_endpoint is not set".to_string()));
        }

        match &self.api_key {
            Some(key) if !key.is_empty() => {}
            _ => return Err(AiError::Configuration("api_key is not set".to_string())),
        }

        if self.model.is_empty() {
            return Err(AiError::Configuration("model is not set".to_string()));
        }

        if self.retry_attempts == 0 {
            return Err(AiError::Configuration(
                "retry_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get base retry backoff as Duration
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
