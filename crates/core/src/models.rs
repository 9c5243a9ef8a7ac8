use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::traits::{ErrorKind, SubmitError};

/// Time-in-force sent with every order.
pub const TIME_IN_FORCE: &str = "GoodTillCancel";

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = SubmitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(SubmitError::Validation(format!(
                "invalid side `{other}`; expected buy or sell"
            ))),
        }
    }
}

/// The type of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "Market",
            OrderType::Limit => "Limit",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = SubmitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "market" => Ok(OrderType::Market),
            "limit" => Ok(OrderType::Limit),
            other => Err(SubmitError::Validation(format!(
                "invalid order_type `{other}`; expected market or limit"
            ))),
        }
    }
}

/// Exchange product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Spot,
    Linear,
    Inverse,
    Option,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Spot => "spot",
            Category::Linear => "linear",
            Category::Inverse => "inverse",
            Category::Option => "option",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = SubmitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spot" => Ok(Category::Spot),
            "linear" => Ok(Category::Linear),
            "inverse" => Ok(Category::Inverse),
            "option" => Ok(Category::Option),
            other => Err(SubmitError::Validation(format!(
                "invalid category `{other}`; expected spot, linear, inverse or option"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Market or limit. A limit order always carries its price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "order_type", rename_all = "snake_case")]
pub enum OrderKind {
    Market,
    Limit { price: Decimal },
}

impl OrderKind {
    pub fn order_type(&self) -> OrderType {
        match self {
            OrderKind::Market => OrderType::Market,
            OrderKind::Limit { .. } => OrderType::Limit,
        }
    }

    pub fn price(&self) -> Option<Decimal> {
        match self {
            OrderKind::Market => None,
            OrderKind::Limit { price } => Some(*price),
        }
    }
}

/// An order to be relayed to the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Exchange instrument id (e.g. BTCUSDT).
    pub symbol: String,
    pub side: Side,
    pub quantity: Decimal,
    #[serde(flatten)]
    pub kind: OrderKind,
    /// Falls back to the exchange config default when unset.
    pub category: Option<Category>,
}

impl OrderRequest {
    /// Create a new market order.
    pub fn market(symbol: &str, side: Side, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            side,
            quantity,
            kind: OrderKind::Market,
            category: None,
        }
    }

    /// Create a new limit order.
    pub fn limit(symbol: &str, side: Side, quantity: Decimal, price: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            side,
            quantity,
            kind: OrderKind::Limit { price },
            category: None,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn order_type(&self) -> OrderType {
        self.kind.order_type()
    }

    pub fn price(&self) -> Option<Decimal> {
        self.kind.price()
    }
}

/// A loosely-typed order as received from an alerting webhook.
///
/// Converted into an [`OrderRequest`] with `try_from`, which is where every
/// structural check happens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderTicket {
    pub symbol: String,
    pub side: String,
    pub quantity: Decimal,
    #[serde(default)]
    pub order_type: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub category: Option<String>,
}

impl TryFrom<OrderTicket> for OrderRequest {
    type Error = SubmitError;

    fn try_from(ticket: OrderTicket) -> Result<Self, Self::Error> {
        let symbol = ticket.symbol.trim();
        if symbol.is_empty() {
            return Err(SubmitError::Validation("symbol must not be empty".to_string()));
        }
        let side: Side = ticket.side.parse()?;
        if ticket.quantity <= Decimal::ZERO {
            return Err(SubmitError::Validation(format!(
                "quantity must be positive, got {}",
                ticket.quantity
            )));
        }

        let order_type = match ticket.order_type.as_deref() {
            Some(raw) => raw.parse()?,
            None => OrderType::Market,
        };

        let kind = match (order_type, ticket.price) {
            (OrderType::Market, None) => OrderKind::Market,
            (OrderType::Market, Some(_)) => {
                return Err(SubmitError::Validation(
                    "price is only allowed on limit orders".to_string(),
                ))
            }
            (OrderType::Limit, None) => {
                return Err(SubmitError::Validation(
                    "limit order requires a price".to_string(),
                ))
            }
            (OrderType::Limit, Some(price)) if price <= Decimal::ZERO => {
                return Err(SubmitError::Validation(format!(
                    "price must be positive, got {price}"
                )))
            }
            (OrderType::Limit, Some(price)) => OrderKind::Limit { price },
        };

        let category = ticket
            .category
            .as_deref()
            .map(Category::from_str)
            .transpose()?;

        Ok(Self {
            symbol: symbol.to_string(),
            side,
            quantity: ticket.quantity,
            kind,
            category,
        })
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Uniform outcome handed back to callers of an [`crate::OrderGateway`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    pub success: bool,
    /// Exchange order record on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl OrderResult {
    pub fn ok(result: serde_json::Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            message: None,
            error_kind: None,
        }
    }

    pub fn failed(error: &SubmitError) -> Self {
        Self {
            success: false,
            result: None,
            message: Some(error.to_string()),
            error_kind: Some(error.kind()),
        }
    }
}

impl From<Result<serde_json::Value, SubmitError>> for OrderResult {
    fn from(outcome: Result<serde_json::Value, SubmitError>) -> Self {
        match outcome {
            Ok(value) => OrderResult::ok(value),
            Err(e) => OrderResult::failed(&e),
        }
    }
}
