use crate::domain::method::PaymentMethod;
use crate::error::{CheckoutError, Result};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Body of a create-payment call, as sent by the checkout page.
///
/// Fields are optional on the wire; `require_fields` decides what a usable
/// request is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    /// Amount in minor units.
    #[serde(default)]
    pub amount: Option<u64>,
    #[serde(default)]
    pub recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl PaymentRequest {
    /// Fails with `MissingFields` unless method, currency and a non-zero
    /// amount are all present.
    pub fn require_fields(&self) -> Result<()> {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        if present(&self.method) && present(&self.currency) && self.amount.unwrap_or(0) > 0 {
            Ok(())
        } else {
            Err(CheckoutError::MissingFields)
        }
    }
}

/// Locally generated correlation id for one checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    /// `ORDER-<unix millis>-<8 uppercase hex chars>`.
    pub fn generate() -> Self {
        let suffix: u32 = rand::thread_rng().r#gen();
        Self(format!(
            "ORDER-{}-{:08X}",
            Utc::now().timestamp_millis(),
            suffix
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for OrderId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated input of the payment data builder.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentInput {
    pub method: PaymentMethod,
    pub currency: String,
    pub amount: u64,
    pub order_id: OrderId,
    pub recurring: bool,
}

impl PaymentInput {
    /// Validates a request and binds it to an order.
    pub fn from_request(request: &PaymentRequest, order_id: OrderId) -> Result<Self> {
        request.require_fields()?;
        let code = request.method.as_deref().unwrap_or_default();
        let method = PaymentMethod::from_code(code)
            .ok_or_else(|| CheckoutError::UnsupportedMethod(code.to_string()))?;

        Ok(Self {
            method,
            currency: request.currency.clone().unwrap_or_default(),
            amount: request.amount.unwrap_or_default(),
            order_id,
            recurring: request.recurring,
        })
    }
}

/// Result of a create-payment call. Cached verbatim under its idempotency key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentResponse {
    pub success: bool,
    pub charge_id: String,
    pub order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    pub status: String,
    #[serde(default)]
    pub method: Option<String>,
    pub amount: u64,
    pub currency: String,
}

/// Reference to a recurring agreement, keyed by the upstream instrument id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringToken {
    pub token: String,
    pub method: PaymentMethod,
    pub currency: String,
}
