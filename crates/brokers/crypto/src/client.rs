use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use sigbridge_core::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, ExchangeConfig};
use crate::protocol::*;
use crate::signing::Signer;

/// Places signed orders on the exchange's order-creation endpoint.
///
/// Holds only immutable configuration and a pooled HTTP client, so one
/// instance can serve any number of concurrent `place_order` calls.
#[derive(Debug, Clone)]
pub struct OrderSubmitter {
    config: ExchangeConfig,
    signer: Signer,
    client: Client,
}

impl OrderSubmitter {
    pub fn new(config: ExchangeConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Self::with_client(config, client)
    }

    /// Use a caller-supplied HTTP client (its own timeout settings apply).
    pub fn with_client(config: ExchangeConfig, client: Client) -> Result<Self, ConfigError> {
        config.validate()?;
        let signer = Signer::new(config.api_secret.clone());
        Ok(Self {
            config,
            signer,
            client,
        })
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Reject orders the exchange could never accept.
    pub fn validate(request: &OrderRequest) -> Result<(), SubmitError> {
        if request.symbol.trim().is_empty() {
            return Err(SubmitError::Validation("symbol must not be empty".to_string()));
        }
        if request.quantity <= Decimal::ZERO {
            return Err(SubmitError::Validation(format!(
                "quantity must be positive, got {}",
                request.quantity
            )));
        }
        if let Some(price) = request.price() {
            if price <= Decimal::ZERO {
                return Err(SubmitError::Validation(format!(
                    "price must be positive, got {price}"
                )));
            }
        }
        Ok(())
    }

    /// Build the parameter set for `request` at `timestamp` (epoch ms) and
    /// sign it.
    pub fn signed_request(
        &self,
        request: &OrderRequest,
        timestamp: i64,
    ) -> Result<SignedRequest, SubmitError> {
        Self::validate(request)?;

        let mut params: BTreeMap<&'static str, String> = BTreeMap::new();
        params.insert(param::API_KEY, self.config.api_key.clone());
        params.insert(param::SYMBOL, request.symbol.trim().to_string());
        params.insert(param::SIDE, request.side.to_string());
        params.insert(param::QTY, format_decimal(request.quantity));
        params.insert(param::ORDER_TYPE, request.order_type().to_string());
        params.insert(param::TIME_IN_FORCE, TIME_IN_FORCE.to_string());
        params.insert(param::RECV_WINDOW, self.config.recv_window_ms.to_string());
        params.insert(param::TIMESTAMP, timestamp.to_string());

        if let Some(price) = request.price() {
            params.insert(param::PRICE, format_decimal(price));
        }
        if let Some(category) = request.category.or(self.config.category) {
            params.insert(param::CATEGORY, category.to_string());
        }

        let signature = self.signer.sign(params.iter());
        Ok(SignedRequest {
            params,
            timestamp,
            signature,
        })
    }

    /// Build, sign and send one order, retrying on rate limits.
    pub async fn submit(&self, request: &OrderRequest) -> Result<serde_json::Value, SubmitError> {
        // Fail validation before the first network call.
        Self::validate(request)?;

        self.config
            .retry
            .run(|attempt| async move {
                // Fresh timestamp per attempt so retries stay inside the recv window.
                let signed = self.signed_request(request, Utc::now().timestamp_millis())?;
                debug!(
                    attempt,
                    symbol = %request.symbol,
                    timestamp = signed.timestamp,
                    "Sending order"
                );
                self.send(&signed).await
            })
            .await
    }

    async fn send(&self, signed: &SignedRequest) -> Result<serde_json::Value, SubmitError> {
        let url = self.config.endpoint(CREATE_ORDER_PATH);
        let resp = self
            .client
            .post(&url)
            .header(HEADER_API_KEY, signed.api_key())
            .header(HEADER_TIMESTAMP, signed.timestamp.to_string())
            .header(HEADER_RECV_WINDOW, signed.recv_window())
            .header(HEADER_SIGN, &signed.signature)
            .json(&signed.body())
            .send()
            .await
            .map_err(|e| SubmitError::Transport(format!("POST {CREATE_ORDER_PATH} failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SubmitError::Transport(format!("Failed to read response body: {e}")))?;

        classify_response(status, &body)
    }
}

/// Map an HTTP status and raw body onto the order record or an error.
pub fn classify_response(status: StatusCode, body: &str) -> Result<serde_json::Value, SubmitError> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(SubmitError::Throttled);
    }

    let envelope = serde_json::from_str::<ExchangeResponse>(body);

    if status.is_success() {
        return envelope
            .map_err(|e| SubmitError::Transport(format!("Malformed exchange response: {e}")))?
            .into_result();
    }

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        let message = match envelope {
            Ok(env) if !env.ret_msg.is_empty() => env.ret_msg,
            _ => format!("HTTP {status}: authentication failed"),
        };
        return Err(SubmitError::Authentication {
            code: None,
            message,
        });
    }

    match envelope {
        Ok(env) if !env.is_success() => Err(env.into_error()),
        _ => Err(SubmitError::Transport(format!("HTTP {status}: {body}"))),
    }
}

#[async_trait]
impl OrderGateway for OrderSubmitter {
    async fn place_order(&self, request: &OrderRequest) -> OrderResult {
        match self.submit(request).await {
            Ok(record) => {
                info!(
                    symbol = %request.symbol,
                    side = %request.side,
                    qty = %request.quantity,
                    order_type = %request.order_type(),
                    "Order placed"
                );
                OrderResult::ok(record)
            }
            Err(e) => {
                warn!(
                    symbol = %request.symbol,
                    side = %request.side,
                    kind = ?e.kind(),
                    error = %e,
                    "Order failed"
                );
                OrderResult::failed(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::sign;
    use rust_decimal_macros::dec;
    use secrecy::SecretString;

    fn submitter() -> OrderSubmitter {
        OrderSubmitter::new(ExchangeConfig::new(
            "https://api-testnet.bybit.com",
            "test_key",
            SecretString::from("test_secret".to_string()),
        ))
        .unwrap()
    }

    #[test]
    fn test_market_params() {
        let signed = submitter()
            .signed_request(&OrderRequest::market("BTCUSDT", Side::Buy, dec!(1)), 1_700_000_000_000)
            .unwrap();

        let keys: Vec<_> = signed.params.keys().copied().collect();
        assert_eq!(
            keys,
            vec![
                "api_key",
                "category",
                "order_type",
                "qty",
                "recv_window",
                "side",
                "symbol",
                "time_in_force",
                "timestamp"
            ]
        );
        assert_eq!(signed.params["side"], "Buy");
        assert_eq!(signed.params["order_type"], "Market");
        assert_eq!(signed.params["qty"], "1");
        assert_eq!(signed.params["time_in_force"], "GoodTillCancel");
        assert_eq!(signed.params["recv_window"], "5000");
        assert_eq!(signed.params["timestamp"], "1700000000000");
        assert_eq!(signed.params["category"], "linear");
        assert!(!signed.params.contains_key("price"));
    }

    #[test]
    fn test_signature_covers_exact_params() {
        let signed = submitter()
            .signed_request(
                &OrderRequest::limit("ETHUSDT", Side::Sell, dec!(0.50), dec!(2500.10))
                    .with_category(Category::Spot),
                42,
            )
            .unwrap();

        assert_eq!(signed.params["price"], "2500.1");
        assert_eq!(signed.params["qty"], "0.5");
        assert_eq!(signed.params["category"], "spot");
        let expected = sign(
            vec![
                ("api_key", "test_key"),
                ("category", "spot"),
                ("order_type", "Limit"),
                ("price", "2500.1"),
                ("qty", "0.5"),
                ("recv_window", "5000"),
                ("side", "Sell"),
                ("symbol", "ETHUSDT"),
                ("time_in_force", "GoodTillCancel"),
                ("timestamp", "42"),
            ],
            "test_secret",
        );
        assert_eq!(signed.signature, expected);
    }

    #[test]
    fn test_no_category_when_unset_everywhere() {
        let mut cfg = submitter().config().clone();
        cfg.category = None;
        let signed = OrderSubmitter::new(cfg)
            .unwrap()
            .signed_request(&OrderRequest::market("BTCUSDT", Side::Buy, dec!(1)), 1)
            .unwrap();
        assert!(!signed.params.contains_key("category"));
    }

    #[test]
    fn test_invalid_amounts_fail_validation() {
        let s = submitter();
        let err = s
            .signed_request(&OrderRequest::market("BTCUSDT", Side::Buy, dec!(0)), 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = s
            .signed_request(&OrderRequest::limit("BTCUSDT", Side::Buy, dec!(1), dec!(-5)), 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = s
            .signed_request(&OrderRequest::market("  ", Side::Buy, dec!(1)), 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_validate_checks_amounts() {
        assert!(OrderSubmitter::validate(&OrderRequest::market("BTCUSDT", Side::Buy, dec!(1))).is_ok());
        assert!(OrderSubmitter::validate(&OrderRequest::limit("BTCUSDT", Side::Buy, dec!(1), dec!(10))).is_ok());

        let err = OrderSubmitter::validate(&OrderRequest::market("", Side::Buy, dec!(1))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = OrderSubmitter::validate(&OrderRequest::market("BTCUSDT", Side::Sell, dec!(-1))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = OrderSubmitter::validate(&OrderRequest::limit("BTCUSDT", Side::Sell, dec!(1), dec!(0)))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_submit_rejects_invalid_order_before_sending() {
        // Unroutable base URL: reaching the network would surface as Transport.
        let cfg = ExchangeConfig::new("http://127.0.0.1:1", "k", SecretString::from("s".to_string()));
        let err = OrderSubmitter::new(cfg)
            .unwrap()
            .submit(&OrderRequest::market("BTCUSDT", Side::Buy, dec!(0)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_constructor_rejects_bad_config() {
        let cfg = ExchangeConfig::new("https://api.bybit.com", "", SecretString::from("s".to_string()));
        assert!(matches!(OrderSubmitter::new(cfg), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_classify_responses() {
        assert_eq!(
            classify_response(StatusCode::TOO_MANY_REQUESTS, ""),
            Err(SubmitError::Throttled)
        );

        let ok = classify_response(StatusCode::OK, r#"{"retCode":0,"retMsg":"OK","result":{"orderId":"1"}}"#);
        assert_eq!(ok.unwrap()["orderId"], "1");

        let rejected = classify_response(
            StatusCode::OK,
            r#"{"retCode":170131,"retMsg":"Insufficient balance.","result":{}}"#,
        );
        assert_eq!(rejected.unwrap_err().to_string(), "Insufficient balance.");

        let bad_request = classify_response(
            StatusCode::BAD_REQUEST,
            r#"{"retCode":10001,"retMsg":"params error: symbol invalid","result":{}}"#,
        )
        .unwrap_err();
        assert_eq!(bad_request.kind(), ErrorKind::Rejected);
        assert_eq!(bad_request.to_string(), "params error: symbol invalid");

        let unauthorized = classify_response(StatusCode::UNAUTHORIZED, "").unwrap_err();
        assert_eq!(unauthorized.kind(), ErrorKind::Authentication);

        let gateway = classify_response(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").unwrap_err();
        assert_eq!(gateway.kind(), ErrorKind::Transport);
        assert!(gateway.to_string().starts_with("HTTP 502"));

        let garbled = classify_response(StatusCode::OK, "not json").unwrap_err();
        assert_eq!(garbled.kind(), ErrorKind::Transport);
    }
}
