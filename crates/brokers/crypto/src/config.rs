use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sigbridge_core::Category;
use std::time::Duration;

use crate::retry::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "https://api-testnet.bybit.com";
pub const DEFAULT_RECV_WINDOW_MS: u64 = 5000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing exchange API key")]
    MissingApiKey,
    #[error("Missing exchange API secret")]
    MissingApiSecret,
    #[error("Invalid base URL `{0}`: expected http:// or https://")]
    InvalidBaseUrl(String),
    #[error("recv_window_ms must be greater than zero")]
    ZeroRecvWindow,
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Connection and credential settings for the exchange.
///
/// Injected into [`crate::OrderSubmitter`] at construction; the library never
/// reads the process environment itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Exchange REST root, without a trailing path.
    pub base_url: String,
    pub api_key: String,
    pub api_secret: SecretString,
    /// Receive window in milliseconds.
    pub recv_window_ms: u64,
    /// Category sent when an order doesn't specify one.
    pub category: Option<Category>,
    /// Per-attempt HTTP timeout in milliseconds.
    pub request_timeout_ms: u64,
    pub retry: RetryPolicy,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            api_secret: SecretString::from(String::new()),
            recv_window_ms: DEFAULT_RECV_WINDOW_MS,
            category: Some(Category::Linear),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            retry: RetryPolicy::default(),
        }
    }
}

impl ExchangeConfig {
    pub fn new(base_url: &str, api_key: &str, api_secret: SecretString) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            api_secret,
            ..Default::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.api_secret.expose_secret().is_empty() {
            return Err(ConfigError::MissingApiSecret);
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }
        if self.recv_window_ms == 0 {
            return Err(ConfigError::ZeroRecvWindow);
        }
        Ok(())
    }

    /// Full URL for an API path such as `/v5/order/create`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
