use crate::application::payment_data::PaymentDataBuilder;
use crate::config::{AgreementPolicy, DEFAULT_IDEMPOTENCY_TTL_SECS};
use crate::domain::charge::{AuthenticationDetails, AuthenticationType};
use crate::domain::payload::PaymentPayload;
use crate::domain::payment::{
    CreatePaymentResponse, OrderId, PaymentInput, PaymentRequest, RecurringToken,
};
use crate::domain::ports::{IdempotencyStoreBox, PaymentGatewayRef, RecurringTokenStoreBox};
use crate::error::{CheckoutError, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Handles create-payment requests.
///
/// `PaymentOrchestrator` validates the request, replays cached responses for
/// known idempotency keys, shapes the gateway payload, calls the charge or
/// agreement endpoint and turns the gateway's answer into the response the
/// checkout page acts on: a redirect URL or a QR payload.
///
/// Requests sharing an idempotency key are handled one at a time, so only
/// the first of them reaches the gateway and the rest replay its response.
pub struct PaymentOrchestrator {
    gateway: PaymentGatewayRef,
    idempotency_store: IdempotencyStoreBox,
    token_store: RecurringTokenStoreBox,
    builder: PaymentDataBuilder,
    agreement_policy: AgreementPolicy,
    idempotency_ttl: Duration,
    key_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PaymentOrchestrator {
    /// Creates a new `PaymentOrchestrator`.
    ///
    /// # Arguments
    ///
    /// * `gateway` - The upstream payment gateway.
    /// * `idempotency_store` - Where responses are cached by idempotency key.
    /// * `token_store` - Where recurring tokens are kept by instrument id.
    /// * `builder` - Shapes the per-method gateway payloads.
    pub fn new(
        gateway: PaymentGatewayRef,
        idempotency_store: IdempotencyStoreBox,
        token_store: RecurringTokenStoreBox,
        builder: PaymentDataBuilder,
    ) -> Self {
        Self {
            gateway,
            idempotency_store,
            token_store,
            builder,
            agreement_policy: AgreementPolicy::default(),
            idempotency_ttl: Duration::from_secs(DEFAULT_IDEMPOTENCY_TTL_SECS),
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_agreement_policy(mut self, policy: AgreementPolicy) -> Self {
        self.agreement_policy = policy;
        self
    }

    pub fn with_idempotency_ttl(mut self, ttl: Duration) -> Self {
        self.idempotency_ttl = ttl;
        self
    }

    /// Creates a payment, or replays the response already produced for the
    /// same idempotency key.
    ///
    /// A blank body key falls through to `header_key`. Failed attempts are
    /// not cached.
    pub async fn create_payment(
        &self,
        request: &PaymentRequest,
        header_key: Option<&str>,
    ) -> Result<CreatePaymentResponse> {
        request.require_fields()?;

        let key = non_blank(request.idempotency_key.as_deref()).or(non_blank(header_key));
        let Some(key) = key else {
            return self.resolve(request, None).await;
        };

        let lock = self.key_lock(key).await;
        let result = {
            let _guard = lock.lock().await;
            self.resolve(request, Some(key)).await
        };
        self.release_key_lock(key, lock).await;
        result
    }

    /// Replays the cached response for `key` or creates the payment and
    /// caches it. Callers hold the key's lock.
    async fn resolve(
        &self,
        request: &PaymentRequest,
        key: Option<&str>,
    ) -> Result<CreatePaymentResponse> {
        if let Some(key) = key
            && let Some(cached) = self.idempotency_store.get(key).await?
        {
            info!(idempotency_key = key, "returning cached response");
            return Ok(cached);
        }

        let input = PaymentInput::from_request(request, OrderId::generate())?;
        let payload = self.builder.build(&input, Utc::now());
        info!(
            method = input.method.code(),
            order_id = %input.order_id,
            recurring = input.recurring,
            "creating payment"
        );

        let response = if self
            .agreement_policy
            .uses_agreement(input.method, input.recurring)
        {
            self.create_agreement(&input, &payload, key).await?
        } else {
            self.create_charge(&input, &payload, key).await?
        };

        if let Some(key) = key {
            self.idempotency_store
                .put(key.to_string(), response.clone(), Some(self.idempotency_ttl))
                .await?;
        }

        Ok(response)
    }

    async fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.key_locks.lock().await;
        Arc::clone(locks.entry(key.to_string()).or_default())
    }

    /// Drops the key's lock entry once no other request is waiting on it.
    async fn release_key_lock(&self, key: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.key_locks.lock().await;
        // One reference is the map's, one is ours.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
            debug!(idempotency_key = key, "released key lock");
        }
    }

    /// The recurring token stored for an upstream instrument, if any.
    pub async fn recurring_token(&self, instrument_id: &str) -> Result<Option<RecurringToken>> {
        self.token_store.get(instrument_id).await
    }

    async fn create_charge(
        &self,
        input: &PaymentInput,
        payload: &PaymentPayload,
        key: Option<&str>,
    ) -> Result<CreatePaymentResponse> {
        let charge = self.gateway.create_charge(payload, key).await?;

        let (redirect_url, qr_code) = if input.method.is_scan_code() {
            let details = required(charge.authentication(AuthenticationType::ScanCode), "SCAN_CODE")?;
            let payload = field(&details.code_payload, "codePayload")?;
            info!(charge_id = %charge.id, "QR payload received");
            (None, Some(payload))
        } else {
            let details = required(charge.authentication(AuthenticationType::Redirect), "REDIRECT")?;
            let url = field(&details.request_url, "requestUrl")?;
            info!(charge_id = %charge.id, %url, "redirect URL received");
            (Some(url), None)
        };

        Ok(CreatePaymentResponse {
            success: true,
            charge_id: charge.id.clone(),
            order_id: charge
                .order_reference()
                .map(str::to_string)
                .unwrap_or_else(|| input.order_id.to_string()),
            redirect_url,
            qr_code,
            status: charge.status.clone(),
            method: charge.payment_method.clone(),
            amount: input.amount,
            currency: input.currency.clone(),
        })
    }

    async fn create_agreement(
        &self,
        input: &PaymentInput,
        payload: &PaymentPayload,
        key: Option<&str>,
    ) -> Result<CreatePaymentResponse> {
        let agreement = self.gateway.create_agreement(payload, key).await?;

        let details = required(agreement.authentication(AuthenticationType::Redirect), "REDIRECT")?;
        let redirect_url = field(&details.request_url, "requestUrl")?;
        let charge_id = agreement.initial_payment_charge_id.clone().ok_or_else(|| {
            CheckoutError::MalformedResponse("agreement has no initialPaymentChargeId".into())
        })?;
        info!(agreement_id = %agreement.id, %redirect_url, "recurring redirect URL received");

        match &agreement.instrument_id {
            Some(instrument_id) => {
                let token = RecurringToken {
                    token: agreement.id.clone(),
                    method: input.method,
                    currency: input.currency.clone(),
                };
                self.token_store.put(instrument_id.clone(), token, None).await?;
            }
            None => warn!(agreement_id = %agreement.id, "agreement has no instrumentId; token not stored"),
        }

        Ok(CreatePaymentResponse {
            success: true,
            charge_id,
            order_id: input.order_id.to_string(),
            redirect_url: Some(redirect_url),
            qr_code: None,
            status: agreement.status.clone(),
            method: agreement.payment_method.clone(),
            amount: input.amount,
            currency: input.currency.clone(),
        })
    }
}

fn non_blank(key: Option<&str>) -> Option<&str> {
    key.filter(|k| !k.trim().is_empty())
}

fn required<'a>(
    details: Option<&'a AuthenticationDetails>,
    kind: &str,
) -> Result<&'a AuthenticationDetails> {
    details.ok_or_else(|| {
        CheckoutError::MalformedResponse(format!("no {kind} authentication method in response"))
    })
}

fn field(value: &Option<String>, name: &str) -> Result<String> {
    value
        .clone()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CheckoutError::MalformedResponse(format!("authentication method has no {name}")))
}
