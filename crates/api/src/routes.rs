use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use secrecy::ExposeSecret;
use sigbridge_core::{ErrorKind, OrderResult, OrderTicket};
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Header carrying the shared secret configured in the alerting service.
pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Health
        .route("/health", get(health_check))
        // Alerts
        .route("/webhook", post(webhook))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ---------------------------------------------------------------------------
// Webhook
// ---------------------------------------------------------------------------

/// Response status for a failed order.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Authentication
        | ErrorKind::RateLimited
        | ErrorKind::Rejected
        | ErrorKind::Transport => StatusCode::BAD_GATEWAY,
    }
}

fn secrets_match(expected: &[u8], provided: &[u8]) -> bool {
    if expected.len() != provided.len() {
        return false;
    }
    expected
        .iter()
        .zip(provided)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

fn failure(status: StatusCode, message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        status,
        Json(serde_json::json!({
            "success": false,
            "message": message,
        })),
    )
}

async fn webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<OrderTicket>, JsonRejection>,
) -> impl IntoResponse {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("webhook", %request_id);

    async move {
        if let Some(expected) = &state.webhook_secret {
            let provided = headers
                .get(WEBHOOK_SECRET_HEADER)
                .map(|v| v.as_bytes())
                .unwrap_or_default();
            if !secrets_match(expected.expose_secret().as_bytes(), provided) {
                tracing::warn!("Webhook rejected: bad or missing secret");
                return failure(StatusCode::UNAUTHORIZED, "Unauthorized.");
            }
        }

        let Json(ticket) = match payload {
            Ok(json) => json,
            Err(rejection) => {
                tracing::warn!(error = %rejection.body_text(), "Malformed webhook payload");
                return failure(
                    StatusCode::BAD_REQUEST,
                    &format!(
                        "Missing or invalid parameters (symbol, side, quantity): {}",
                        rejection.body_text()
                    ),
                );
            }
        };

        tracing::info!(
            symbol = %ticket.symbol,
            side = %ticket.side,
            quantity = %ticket.quantity,
            "Webhook received"
        );

        let result: OrderResult = state.gateway.place_ticket(ticket).await;
        if result.success {
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "success": true,
                    "message": "Trade executed successfully.",
                    "result": result.result,
                })),
            )
        } else {
            let status = result
                .error_kind
                .map(status_for)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            tracing::error!(
                status = status.as_u16(),
                message = result.message.as_deref().unwrap_or_default(),
                "Trade execution failed"
            );
            (status, Json(serde_json::to_value(&result).unwrap_or_default()))
        }
    }
    .instrument(span)
    .await
}
