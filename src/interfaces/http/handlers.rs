use super::AppState;
use super::error::ApiError;
use crate::domain::method::PaymentMethod;
use crate::domain::payment::{CreatePaymentResponse, PaymentRequest};
use crate::domain::status::{PaymentStatus, StatusCategory};
use crate::error::CheckoutError;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::info;

pub const IDEMPOTENCY_KEY_HEADER: &str = "x-idempotency-key";

/// `POST /api/payments/create`
pub async fn create_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<PaymentRequest>, JsonRejection>,
) -> Result<Json<CreatePaymentResponse>, ApiError> {
    let Json(request) = body.map_err(|e| CheckoutError::InvalidRequest(e.body_text()))?;
    let header_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    info!(method = ?request.method, "create payment requested");
    let response = state.orchestrator.create_payment(&request, header_key).await?;
    Ok(Json(response))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub order_id: Option<String>,
}

/// `GET /api/payments/status/:charge_id`
pub async fn payment_status(
    State(state): State<AppState>,
    Path(charge_id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<PaymentStatus>, ApiError> {
    let status = state
        .status_poller
        .status(&charge_id, query.order_id.as_deref())
        .await?;
    Ok(Json(status))
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnQuery {
    pub order_id: Option<String>,
    pub status: Option<String>,
    pub charge_id: Option<String>,
    pub method: Option<String>,
}

/// `GET /payment-return`: where the gateway sends the shopper back to.
pub async fn payment_return(Query(query): Query<ReturnQuery>) -> Json<Value> {
    info!(
        order_id = ?query.order_id,
        status = ?query.status,
        charge_id = ?query.charge_id,
        method = ?query.method,
        "payment return"
    );
    let category = query.status.as_deref().map(StatusCategory::classify);
    Json(json!({
        "orderId": query.order_id,
        "status": query.status,
        "chargeId": query.charge_id,
        "method": query.method,
        "category": category,
    }))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "ppro": {
            "merchantId": &*state.merchant_id,
            "baseUrl": &*state.gateway_base_url,
        },
    }))
}

/// `GET /api`
pub async fn api_index() -> Json<Value> {
    let methods: Vec<&str> = PaymentMethod::ALL.iter().map(PaymentMethod::code).collect();
    Json(json!({
        "name": "PPRO Payment Gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /api/payments/create": "Create payment charge",
            "GET /api/payments/status/:chargeId": "Get payment status",
            "GET /health": "Health check",
        },
        "supportedMethods": methods,
        "features": [
            "Multiple authentication flows",
            "Idempotency support",
            "Recurring agreements",
        ],
    }))
}
