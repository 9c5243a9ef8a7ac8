use secrecy::SecretString;
use sigbridge_core::OrderGateway;
use std::sync::Arc;

/// Shared application state accessible by all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn OrderGateway>,
    /// Expected `X-Webhook-Secret` value; `None` disables the check.
    pub webhook_secret: Option<SecretString>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn OrderGateway>, webhook_secret: Option<SecretString>) -> Self {
        Self {
            gateway,
            webhook_secret,
        }
    }
}
