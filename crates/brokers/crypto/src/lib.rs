//! Crypto exchange broker adapter.
//!
//! Signed REST order placement against Bybit's v5 API: canonical-parameter
//! HMAC signing, bounded retry on rate limits, and normalization of every
//! outcome into an [`sigbridge_core::OrderResult`].

pub mod client;
pub mod config;
pub mod protocol;
pub mod retry;
pub mod signing;

pub use client::OrderSubmitter;
pub use config::{ConfigError, ExchangeConfig};
pub use retry::{Backoff, RetryPolicy};
pub use signing::{canonical_query, sign, Signer};
