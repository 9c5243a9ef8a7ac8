use crate::models::*;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Coarse classification of a failed submission, used by callers to pick a
/// response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Authentication,
    RateLimited,
    Rejected,
    Transport,
}

/// Errors that can occur while submitting an order.
///
/// `Display` is the caller-visible message; exchange messages pass through
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// Missing or contradictory input, caught before any network call.
    #[error("{0}")]
    Validation(String),
    /// The exchange refused the credentials or the signature.
    #[error("{message}")]
    Authentication { code: Option<i64>, message: String },
    /// A single attempt was answered with HTTP 429.
    #[error("Rate limited by exchange")]
    Throttled,
    /// Every attempt allowed by the retry policy was rate limited.
    #[error("Max retries exceeded")]
    RetriesExhausted { attempts: u32 },
    /// The exchange accepted the call but rejected the order.
    #[error("{message}")]
    Rejected { code: i64, message: String },
    /// Timeout, connection failure or an unreadable response.
    #[error("{0}")]
    Transport(String),
}

impl SubmitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SubmitError::Validation(_) => ErrorKind::Validation,
            SubmitError::Authentication { .. } => ErrorKind::Authentication,
            SubmitError::Throttled | SubmitError::RetriesExhausted { .. } => ErrorKind::RateLimited,
            SubmitError::Rejected { .. } => ErrorKind::Rejected,
            SubmitError::Transport(_) => ErrorKind::Transport,
        }
    }

    /// Only a rate-limited attempt is worth repeating.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SubmitError::Throttled)
    }
}

// ---------------------------------------------------------------------------
// Order Gateway Trait
// ---------------------------------------------------------------------------

/// Something that can place an order on an exchange.
///
/// Implementations never return an error: every failure is folded into the
/// returned [`OrderResult`].
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Place a single order.
    async fn place_order(&self, request: &OrderRequest) -> OrderResult;

    /// Validate a webhook ticket and place it. Invalid tickets never reach
    /// `place_order`.
    async fn place_ticket(&self, ticket: OrderTicket) -> OrderResult {
        match OrderRequest::try_from(ticket) {
            Ok(request) => self.place_order(&request).await,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected invalid order ticket");
                OrderResult::failed(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGateway {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl OrderGateway for CountingGateway {
        async fn place_order(&self, request: &OrderRequest) -> OrderResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            OrderResult::ok(serde_json::json!({ "symbol": request.symbol }))
        }
    }

    fn ticket(order_type: &str, price: Option<rust_decimal::Decimal>) -> OrderTicket {
        OrderTicket {
            symbol: "BTCUSDT".to_string(),
            side: "Buy".to_string(),
            quantity: dec!(1),
            order_type: Some(order_type.to_string()),
            price,
            category: None,
        }
    }

    #[tokio::test]
    async fn test_invalid_ticket_never_reaches_gateway() {
        let gateway = CountingGateway { calls: AtomicUsize::new(0) };
        let result = gateway.place_ticket(ticket("Limit", None)).await;

        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::Validation));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_valid_ticket_is_forwarded() {
        let gateway = CountingGateway { calls: AtomicUsize::new(0) };
        let result = gateway.place_ticket(ticket("Limit", Some(dec!(30000)))).await;

        assert!(result.success);
        assert_eq!(result.result.unwrap()["symbol"], "BTCUSDT");
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_error_kinds_and_retryability() {
        assert!(SubmitError::Throttled.is_retryable());
        assert!(!SubmitError::Transport("reset".into()).is_retryable());
        assert_eq!(
            SubmitError::RetriesExhausted { attempts: 3 }.kind(),
            ErrorKind::RateLimited
        );
        let rejected = SubmitError::Rejected {
            code: 110007,
            message: "ab not enough for new order".to_string(),
        };
        assert_eq!(rejected.to_string(), "ab not enough for new order");
        assert_eq!(rejected.kind(), ErrorKind::Rejected);
    }
}
