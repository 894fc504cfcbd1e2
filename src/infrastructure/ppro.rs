use crate::config::GatewayConfig;
use crate::domain::charge::{Agreement, Charge};
use crate::domain::payload::PaymentPayload;
use crate::domain::ports::PaymentGateway;
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

pub const CHARGES_PATH: &str = "/v1/payment-charges";
pub const AGREEMENTS_PATH: &str = "/v1/payment-agreements";
pub const MERCHANT_ID_HEADER: &str = "Merchant-Id";
pub const IDEMPOTENCY_HEADER: &str = "Request-Idempotency-Key";

const FALLBACK_ERROR: &str = "PPRO API request failed";

/// HTTP client for the PPRO payments API.
///
/// Every call carries the bearer token and the `Merchant-Id` header; POSTs
/// also forward the idempotency key when one is given. Failures are returned
/// as-is: there is no retry and no circuit breaking.
pub struct PproClient {
    client: Client,
    base_url: Url,
    api_key: SecretString,
    merchant_id: String,
}

impl PproClient {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            merchant_id: config.merchant_id.clone(),
        }
    }

    /// `path` under the base URL, with `id` appended as a single
    /// percent-encoded segment.
    fn url(&self, path: &str, id: Option<&str>) -> Result<Url> {
        if let Some(id) = id
            && matches!(id, "" | "." | "..")
        {
            return Err(CheckoutError::InvalidRequest(format!("invalid resource id {id:?}")));
        }
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                CheckoutError::Config(format!("gateway URL {} cannot take a path", self.base_url))
            })?;
            segments
                .pop_if_empty()
                .extend(path.split('/').filter(|s| !s.is_empty()));
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        payload: &PaymentPayload,
        idempotency_key: Option<&str>,
    ) -> Result<T> {
        let url = self.url(path, None)?;
        info!(%url, "PPRO request: POST");
        if let Ok(body) = serde_json::to_string(payload) {
            debug!(%body, "PPRO request body");
        }

        let mut request = self.client.post(url).json(payload);
        if let Some(key) = idempotency_key {
            request = request.header(IDEMPOTENCY_HEADER, key);
        }
        self.send(request).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .bearer_auth(self.api_key.expose_secret())
            .header(MERCHANT_ID_HEADER, &self.merchant_id)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), %body, "PPRO response");

        if !status.is_success() {
            let message = error_message(&body);
            warn!(status = status.as_u16(), %message, "PPRO request failed");
            return Err(CheckoutError::Gateway {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| CheckoutError::MalformedResponse(e.to_string()))
    }
}

/// Picks the gateway's own description of a failure out of an error body.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return FALLBACK_ERROR.to_string();
    };
    let text = |v: &Value| v.as_str().filter(|s| !s.is_empty()).map(str::to_string);

    value
        .get("error")
        .and_then(|e| text(e).or_else(|| e.get("message").and_then(text)))
        .or_else(|| value.get("message").and_then(text))
        .or_else(|| value.get("detail").and_then(text))
        .unwrap_or_else(|| FALLBACK_ERROR.to_string())
}

#[async_trait]
impl PaymentGateway for PproClient {
    async fn create_charge(
        &self,
        payload: &PaymentPayload,
        idempotency_key: Option<&str>,
    ) -> Result<Charge> {
        self.post(CHARGES_PATH, payload, idempotency_key).await
    }

    async fn create_agreement(
        &self,
        payload: &PaymentPayload,
        idempotency_key: Option<&str>,
    ) -> Result<Agreement> {
        self.post(AGREEMENTS_PATH, payload, idempotency_key).await
    }

    async fn get_charge(&self, charge_id: &str) -> Result<Charge> {
        let url = self.url(CHARGES_PATH, Some(charge_id))?;
        info!(%url, "PPRO request: GET");
        self.send(self.client.get(url)).await
    }
}
