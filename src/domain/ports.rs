use super::charge::{Agreement, Charge};
use super::payload::PaymentPayload;
use super::payment::{CreatePaymentResponse, RecurringToken};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// A keyed value store with per-entry expiry.
///
/// Entries put with a TTL must never be returned once it has elapsed.
#[async_trait]
pub trait KeyedStore<V>: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<V>>;
    /// Inserts or replaces `key`. `None` keeps the entry until it is expired
    /// explicitly.
    async fn put(&self, key: String, value: V, ttl: Option<Duration>) -> Result<()>;
    async fn expire(&self, key: &str) -> Result<()>;
}

/// The upstream payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_charge(
        &self,
        payload: &PaymentPayload,
        idempotency_key: Option<&str>,
    ) -> Result<Charge>;

    async fn create_agreement(
        &self,
        payload: &PaymentPayload,
        idempotency_key: Option<&str>,
    ) -> Result<Agreement>;

    async fn get_charge(&self, charge_id: &str) -> Result<Charge>;
}

pub type IdempotencyStoreBox = Box<dyn KeyedStore<CreatePaymentResponse>>;
pub type RecurringTokenStoreBox = Box<dyn KeyedStore<RecurringToken>>;
pub type PaymentGatewayRef = Arc<dyn PaymentGateway>;
