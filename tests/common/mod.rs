#![allow(dead_code)]

use async_trait::async_trait;
use ppro_checkout::config::{AgreementPolicy, GatewayConfig, ServerConfig};
use ppro_checkout::domain::charge::{Agreement, Charge};
use ppro_checkout::domain::payload::PaymentPayload;
use ppro_checkout::domain::payment::{CreatePaymentResponse, PaymentRequest};
use ppro_checkout::domain::ports::PaymentGateway;
use ppro_checkout::domain::status::{PaymentStatus, StatusCategory};
use ppro_checkout::error::{CheckoutError, Result};
use ppro_checkout::interfaces::checkout::api::CheckoutApi;
use secrecy::SecretString;
use serde_json::{Value, json};
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

pub const RETURN_URL: &str = "https://shop.example/payment-return";

pub fn gateway_config(base_url: &str) -> GatewayConfig {
    GatewayConfig {
        merchant_id: "merchant-test".into(),
        api_key: SecretString::from("sk_test"),
        base_url: Url::parse(base_url).unwrap(),
        return_url: Url::parse(RETURN_URL).unwrap(),
    }
}

pub fn server_config() -> ServerConfig {
    ServerConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        gateway: gateway_config("https://gateway.example"),
        agreement_policy: AgreementPolicy::Recurring,
        idempotency_ttl_secs: 60,
    }
}

pub fn redirect_charge(id: &str, url: &str) -> Charge {
    serde_json::from_value(json!({
        "id": id,
        "status": "AUTHENTICATION_PENDING",
        "paymentMethod": "IDEAL",
        "authenticationMethods": [
            { "type": "REDIRECT", "details": { "requestUrl": url } }
        ]
    }))
    .unwrap()
}

pub fn scan_code_charge(id: &str, code: &str) -> Charge {
    serde_json::from_value(json!({
        "id": id,
        "status": "AUTHENTICATION_PENDING",
        "paymentMethod": "BANCONTACT",
        "authenticationMethods": [
            { "type": "SCAN_CODE", "details": { "codePayload": code } },
            { "type": "REDIRECT", "details": { "requestUrl": "https://bank.example/fallback" } }
        ]
    }))
    .unwrap()
}

pub fn agreement(id: &str, instrument_id: Option<&str>, charge_id: Option<&str>) -> Agreement {
    serde_json::from_value(json!({
        "id": id,
        "status": "AUTHENTICATION_PENDING",
        "paymentMethod": "IDEAL",
        "instrumentId": instrument_id,
        "initialPaymentChargeId": charge_id,
        "authenticationMethods": [
            { "type": "REDIRECT", "details": { "requestUrl": "https://bank.example/mandate" } }
        ]
    }))
    .unwrap()
}

pub fn charge_with_status(id: &str, status: &str) -> Charge {
    serde_json::from_value(json!({
        "id": id,
        "status": status,
        "paymentMethod": "BANCONTACT",
        "amount": { "value": 11979, "currency": "EUR" }
    }))
    .unwrap()
}

/// A `PaymentGateway` that answers with canned entities and counts calls.
#[derive(Default)]
pub struct FakeGateway {
    pub charge: Mutex<Option<Charge>>,
    pub agreement: Mutex<Option<Agreement>>,
    pub failure: Mutex<Option<(u16, String)>>,
    pub payloads: Mutex<Vec<Value>>,
    pub idempotency_keys: Mutex<Vec<Option<String>>>,
    /// How long each create call takes to answer.
    pub latency: Mutex<Option<Duration>>,
    pub charge_calls: AtomicUsize,
    pub agreement_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
}

impl FakeGateway {
    pub fn with_charge(charge: Charge) -> Self {
        let gateway = Self::default();
        *gateway.charge.lock().unwrap() = Some(charge);
        gateway
    }

    pub fn with_agreement(agreement: Agreement) -> Self {
        let gateway = Self::default();
        *gateway.agreement.lock().unwrap() = Some(agreement);
        gateway
    }

    pub fn failing(status: u16, message: &str) -> Self {
        let gateway = Self::default();
        *gateway.failure.lock().unwrap() = Some((status, message.into()));
        gateway
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        *self.latency.lock().unwrap() = Some(latency);
        self
    }

    pub fn charge_calls(&self) -> usize {
        self.charge_calls.load(Ordering::SeqCst)
    }

    pub fn agreement_calls(&self) -> usize {
        self.agreement_calls.load(Ordering::SeqCst)
    }

    pub fn last_payload(&self) -> Option<Value> {
        self.payloads.lock().unwrap().last().cloned()
    }

    fn record(&self, payload: &PaymentPayload, key: Option<&str>) {
        self.payloads
            .lock()
            .unwrap()
            .push(serde_json::to_value(payload).unwrap());
        self.idempotency_keys
            .lock()
            .unwrap()
            .push(key.map(str::to_string));
    }

    async fn wait(&self) {
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn fail(&self) -> Result<()> {
        match self.failure.lock().unwrap().clone() {
            Some((status, message)) => Err(CheckoutError::Gateway { status, message }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_charge(
        &self,
        payload: &PaymentPayload,
        idempotency_key: Option<&str>,
    ) -> Result<Charge> {
        self.charge_calls.fetch_add(1, Ordering::SeqCst);
        self.record(payload, idempotency_key);
        self.wait().await;
        self.fail()?;
        self.charge
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| CheckoutError::MalformedResponse("no canned charge".into()))
    }

    async fn create_agreement(
        &self,
        payload: &PaymentPayload,
        idempotency_key: Option<&str>,
    ) -> Result<Agreement> {
        self.agreement_calls.fetch_add(1, Ordering::SeqCst);
        self.record(payload, idempotency_key);
        self.wait().await;
        self.fail()?;
        self.agreement
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| CheckoutError::MalformedResponse("no canned agreement".into()))
    }

    async fn get_charge(&self, _charge_id: &str) -> Result<Charge> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.fail()?;
        self.charge
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| CheckoutError::MalformedResponse("no canned charge".into()))
    }
}

/// A `CheckoutApi` that answers status polls from a script and repeats the
/// last entry once the script runs out.
pub struct ScriptedApi {
    pub statuses: Mutex<std::collections::VecDeque<std::result::Result<String, String>>>,
    pub last: Mutex<std::result::Result<String, String>>,
    pub status_calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn new(script: Vec<std::result::Result<&str, &str>>) -> Self {
        let script: std::collections::VecDeque<_> = script
            .into_iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();
        Self {
            last: Mutex::new(Ok("AUTHENTICATION_PENDING".into())),
            statuses: Mutex::new(script),
            status_calls: AtomicUsize::new(0),
        }
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CheckoutApi for ScriptedApi {
    async fn create_payment(&self, _request: &PaymentRequest) -> Result<CreatePaymentResponse> {
        Err(CheckoutError::Api("not scripted".into()))
    }

    async fn payment_status(&self, charge_id: &str) -> Result<PaymentStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let next = {
            let mut statuses = self.statuses.lock().unwrap();
            let mut last = self.last.lock().unwrap();
            if let Some(next) = statuses.pop_front() {
                *last = next;
            }
            last.clone()
        };
        let status = next.map_err(CheckoutError::Api)?;
        Ok(PaymentStatus {
            success: true,
            charge_id: charge_id.to_string(),
            category: StatusCategory::classify(&status),
            status,
            order_id: None,
            amount: Some(11979),
            currency: Some("EUR".into()),
            redirect_url: RETURN_URL.into(),
            method: Some("BANCONTACT".into()),
        })
    }
}
