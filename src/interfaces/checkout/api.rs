use crate::domain::payment::{CreatePaymentResponse, PaymentRequest};
use crate::domain::status::PaymentStatus;
use crate::error::{CheckoutError, Result};
use crate::interfaces::http::error::ErrorBody;
use crate::interfaces::http::handlers::IDEMPOTENCY_KEY_HEADER;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

/// The checkout backend as seen by the shopper's pages.
#[async_trait]
pub trait CheckoutApi: Send + Sync {
    async fn create_payment(&self, request: &PaymentRequest) -> Result<CreatePaymentResponse>;
    async fn payment_status(&self, charge_id: &str) -> Result<PaymentStatus>;
}

/// `CheckoutApi` over HTTP, e.g. against `http://localhost:3000/api`.
pub struct HttpCheckoutApi {
    client: Client,
    base_url: String,
}

impl HttpCheckoutApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// The backend URL for `segments`, each one percent-encoded on its own.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        if segments.iter().any(|s| matches!(*s, "" | "." | "..")) {
            return Err(CheckoutError::InvalidRequest(format!("invalid path {segments:?}")));
        }
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| CheckoutError::Config(format!("checkout API URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| {
                CheckoutError::Config(format!("checkout API URL {} cannot take a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read<T: DeserializeOwned>(
        response: reqwest::Response,
        fallback_error: &str,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), %body, "checkout API response");

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| fallback_error.to_string());
            return Err(CheckoutError::Api(message));
        }
        serde_json::from_str(&body).map_err(|e| CheckoutError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl CheckoutApi for HttpCheckoutApi {
    async fn create_payment(&self, request: &PaymentRequest) -> Result<CreatePaymentResponse> {
        let mut builder = self
            .client
            .post(self.endpoint(&["payments", "create"])?)
            .json(request);
        if let Some(key) = &request.idempotency_key {
            builder = builder.header(IDEMPOTENCY_KEY_HEADER, key);
        }
        Self::read(builder.send().await?, "Failed to create payment").await
    }

    async fn payment_status(&self, charge_id: &str) -> Result<PaymentStatus> {
        let response = self
            .client
            .get(self.endpoint(&["payments", "status", charge_id])?)
            .send()
            .await?;
        Self::read(response, "Failed to get payment status").await
    }
}
