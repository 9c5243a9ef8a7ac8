use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sigbridge_core::SubmitError;
use std::collections::BTreeMap;

/// Order creation endpoint (Bybit v5).
pub const CREATE_ORDER_PATH: &str = "/v5/order/create";

pub const HEADER_API_KEY: &str = "X-BAPI-API-KEY";
pub const HEADER_TIMESTAMP: &str = "X-BAPI-TIMESTAMP";
pub const HEADER_RECV_WINDOW: &str = "X-BAPI-RECV-WINDOW";
pub const HEADER_SIGN: &str = "X-BAPI-SIGN";

/// Signed parameter names.
pub mod param {
    pub const API_KEY: &str = "api_key";
    pub const SYMBOL: &str = "symbol";
    pub const SIDE: &str = "side";
    pub const QTY: &str = "qty";
    pub const ORDER_TYPE: &str = "order_type";
    pub const TIME_IN_FORCE: &str = "time_in_force";
    pub const RECV_WINDOW: &str = "recv_window";
    pub const TIMESTAMP: &str = "timestamp";
    pub const PRICE: &str = "price";
    pub const CATEGORY: &str = "category";
    pub const SIGN: &str = "sign";
}

/// `retCode` values that mean the credentials or signature were refused.
const AUTH_RET_CODES: [i64; 4] = [10003, 10004, 10005, 33004];

/// Canonical text form of a decimal: no trailing zeros, no exponent.
///
/// `1.50` becomes `1.5`, `2.0` becomes `2`.
pub fn format_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

/// A fully built and signed order-creation request. Lives for one attempt.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// Every signed parameter, in canonical order.
    pub params: BTreeMap<&'static str, String>,
    pub timestamp: i64,
    pub signature: String,
}

impl SignedRequest {
    pub fn api_key(&self) -> &str {
        self.params.get(param::API_KEY).map(String::as_str).unwrap_or_default()
    }

    pub fn recv_window(&self) -> &str {
        self.params.get(param::RECV_WINDOW).map(String::as_str).unwrap_or_default()
    }

    /// JSON body: the signed parameters plus `sign`.
    pub fn body(&self) -> BTreeMap<&'static str, &str> {
        let mut body: BTreeMap<&'static str, &str> =
            self.params.iter().map(|(k, v)| (*k, v.as_str())).collect();
        body.insert(param::SIGN, &self.signature);
        body
    }
}

/// Response envelope returned by every v5 endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeResponse {
    /// 0 means success.
    #[serde(rename = "retCode")]
    pub ret_code: i64,
    #[serde(rename = "retMsg", default)]
    pub ret_msg: String,
    /// Order record on success.
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(rename = "retExtInfo", default, skip_serializing_if = "Option::is_none")]
    pub ret_ext_info: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
}

impl ExchangeResponse {
    pub fn is_success(&self) -> bool {
        self.ret_code == 0
    }

    /// Turn the envelope into the order record or a classified error.
    pub fn into_result(self) -> Result<serde_json::Value, SubmitError> {
        if self.is_success() {
            return Ok(self.result.unwrap_or(serde_json::Value::Null));
        }
        Err(self.into_error())
    }

    pub fn into_error(self) -> SubmitError {
        if AUTH_RET_CODES.contains(&self.ret_code) {
            SubmitError::Authentication {
                code: Some(self.ret_code),
                message: self.ret_msg,
            }
        } else {
            SubmitError::Rejected {
                code: self.ret_code,
                message: self.ret_msg,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(dec!(1)), "1");
        assert_eq!(format_decimal(dec!(1.0)), "1");
        assert_eq!(format_decimal(dec!(1.50)), "1.5");
        assert_eq!(format_decimal(dec!(0.001)), "0.001");
        assert_eq!(format_decimal(dec!(50000.00)), "50000");
    }

    #[test]
    fn test_success_envelope() {
        let json = r#"{
            "retCode": 0,
            "retMsg": "OK",
            "result": {"orderId": "1321003749386327552", "orderLinkId": ""},
            "retExtInfo": {},
            "time": 1672211918471
        }"#;
        let resp: ExchangeResponse = serde_json::from_str(json).unwrap();
        let record = resp.into_result().unwrap();
        assert_eq!(record["orderId"], "1321003749386327552");
    }

    #[test]
    fn test_success_without_result_is_null() {
        let resp: ExchangeResponse = serde_json::from_str(r#"{"retCode":0,"retMsg":"OK"}"#).unwrap();
        assert_eq!(resp.into_result().unwrap(), serde_json::Value::Null);
    }

    #[test]
    fn test_business_rejection() {
        let json = r#"{"retCode":110007,"retMsg":"ab not enough for new order","result":{}}"#;
        let resp: ExchangeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            resp.into_result().unwrap_err(),
            SubmitError::Rejected {
                code: 110007,
                message: "ab not enough for new order".to_string()
            }
        );
    }

    #[test]
    fn test_signature_rejection_is_authentication() {
        let json = r#"{"retCode":10004,"retMsg":"error sign!","result":null}"#;
        let resp: ExchangeResponse = serde_json::from_str(json).unwrap();
        let err = resp.into_result().unwrap_err();
        assert_eq!(err.kind(), sigbridge_core::ErrorKind::Authentication);
        assert_eq!(err.to_string(), "error sign!");
    }

    #[test]
    fn test_body_includes_sign() {
        let mut params = BTreeMap::new();
        params.insert(param::API_KEY, "key".to_string());
        params.insert(param::RECV_WINDOW, "5000".to_string());
        let signed = SignedRequest {
            params,
            timestamp: 1,
            signature: "abc".to_string(),
        };
        let body = serde_json::to_value(signed.body()).unwrap();
        assert_eq!(body, serde_json::json!({"api_key": "key", "recv_window": "5000", "sign": "abc"}));
        assert_eq!(signed.api_key(), "key");
        assert_eq!(signed.recv_window(), "5000");
    }
}
