use anyhow::{Context, Result};
use clap::Args;
use secrecy::SecretString;
use serde::Deserialize;
use sigbridge_brokers_crypto::ExchangeConfig;
use sigbridge_core::Category;
use std::path::Path;

pub const DEFAULT_BIND: &str = "0.0.0.0:3001";

/// Top-level config file layout.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub exchange: ExchangeConfig,
    pub webhook: WebhookConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub bind: Option<String>,
    /// Shared secret expected in `X-Webhook-Secret`.
    pub secret: Option<SecretString>,
}

/// Flags (and their environment variables) that take precedence over the
/// config file.
#[derive(Debug, Args)]
pub struct Overrides {
    /// Exchange REST base URL
    #[arg(long, env = "BYBIT_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Exchange API key
    #[arg(long, env = "BYBIT_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Exchange API secret
    #[arg(long, env = "BYBIT_API_SECRET", hide_env_values = true, global = true)]
    pub api_secret: Option<String>,

    /// Receive window in milliseconds
    #[arg(long, env = "BYBIT_RECV_WINDOW", global = true)]
    pub recv_window: Option<u64>,

    /// Default product category (spot, linear, inverse, option)
    #[arg(long, env = "BYBIT_CATEGORY", global = true)]
    pub category: Option<Category>,

    /// Shared secret required on incoming webhooks
    #[arg(long, env = "WEBHOOK_SECRET", hide_env_values = true, global = true)]
    pub webhook_secret: Option<String>,
}

impl AppConfig {
    /// Read a TOML config file, or start from defaults when none is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(url) = &overrides.base_url {
            self.exchange.base_url = url.clone();
        }
        if let Some(key) = &overrides.api_key {
            self.exchange.api_key = key.clone();
        }
        if let Some(secret) = &overrides.api_secret {
            self.exchange.api_secret = SecretString::from(secret.clone());
        }
        if let Some(window) = overrides.recv_window {
            self.exchange.recv_window_ms = window;
        }
        if let Some(category) = overrides.category {
            self.exchange.category = Some(category);
        }
        if let Some(secret) = &overrides.webhook_secret {
            self.webhook.secret = Some(SecretString::from(secret.clone()));
        }
    }
}
