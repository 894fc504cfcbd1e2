//! Scan-to-pay page: shows a code, counts down its validity and polls the
//! backend until the payment settles.

use super::api::CheckoutApi;
use super::schedule::{Countdown, ScheduledTask};
use crate::domain::method::format_amount;
use crate::domain::status::StatusCategory;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};
use url::form_urlencoded;

pub const QR_EXPIRY: Duration = Duration::from_secs(300);
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

pub const QR_PAGE_PATH: &str = "/qr-payment";
pub const RETURN_PAGE_PATH: &str = "/payment-return";

/// Query parameters of the QR page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPageParams {
    pub order_id: Option<String>,
    pub charge_id: Option<String>,
    pub qr_data: Option<String>,
    pub payment_method: Option<String>,
    pub amount: Option<u64>,
    pub currency: Option<String>,
}

impl QrPageParams {
    /// Page URL relative to the site root.
    pub fn to_url(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        let amount = self.amount.map(|a| a.to_string());
        let pairs = [
            ("orderId", self.order_id.as_deref()),
            ("chargeId", self.charge_id.as_deref()),
            ("qrData", self.qr_data.as_deref()),
            ("paymentMethod", self.payment_method.as_deref()),
            ("amount", amount.as_deref()),
            ("currency", self.currency.as_deref()),
        ];
        for (name, value) in pairs {
            if let Some(value) = value {
                query.append_pair(name, value);
            }
        }
        format!("{QR_PAGE_PATH}?{}", query.finish())
    }

    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (name, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let value = value.into_owned();
            match name.as_ref() {
                "orderId" => params.order_id = Some(value),
                "chargeId" => params.charge_id = Some(value),
                "qrData" => params.qr_data = Some(value),
                "paymentMethod" => params.payment_method = Some(value),
                "amount" => params.amount = value.parse().ok(),
                "currency" => params.currency = Some(value),
                _ => {}
            }
        }
        params
    }

    fn has_qr_data(&self) -> bool {
        self.qr_data.as_deref().is_some_and(|d| !d.is_empty())
    }
}

/// How a QR session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrOutcome {
    /// Payment confirmed; navigate to `return_url`.
    Succeeded { return_url: String },
    Failed { status: String },
    Expired,
    /// The page was opened without a code to show.
    Invalid,
}

pub struct QrPaymentController<A: ?Sized> {
    api: Arc<A>,
    params: QrPageParams,
    poll_interval: Duration,
    expiry: Duration,
}

impl<A> QrPaymentController<A>
where
    A: CheckoutApi + ?Sized + 'static,
{
    pub fn new(api: Arc<A>, params: QrPageParams) -> Self {
        Self {
            api,
            params,
            poll_interval: POLL_INTERVAL,
            expiry: QR_EXPIRY,
        }
    }

    pub fn with_timing(mut self, poll_interval: Duration, expiry: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.expiry = expiry;
        self
    }

    pub fn params(&self) -> &QrPageParams {
        &self.params
    }

    /// Page heading, e.g. `BANCONTACTQR Payment`.
    pub fn title(&self) -> String {
        let method = self.params.payment_method.as_deref().unwrap_or("QR");
        format!("{} Payment", method.to_ascii_uppercase())
    }

    pub fn amount_label(&self) -> Option<String> {
        let amount = self.params.amount?;
        let currency = self.params.currency.as_deref().unwrap_or("EUR");
        Some(format_amount(amount, currency))
    }

    /// Return-page URL for a shopper who gave up on the code.
    pub fn cancel_url(&self) -> String {
        self.return_url(&[("status", Some("cancelled"))])
    }

    fn success_url(&self) -> String {
        self.return_url(&[
            ("chargeId", self.params.charge_id.as_deref()),
            ("status", Some("success")),
        ])
    }

    fn return_url(&self, extra: &[(&str, Option<&str>)]) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(order_id) = &self.params.order_id {
            query.append_pair("orderId", order_id);
        }
        for (name, value) in extra {
            if let Some(value) = value {
                query.append_pair(name, value);
            }
        }
        if let Some(method) = &self.params.payment_method {
            query.append_pair("method", method);
        }
        format!("{RETURN_PAGE_PATH}?{}", query.finish())
    }

    /// Asks the backend once. `None` while the payment is undecided or the
    /// call failed.
    pub async fn check_status(&self) -> Option<QrOutcome> {
        let charge_id = self.params.charge_id.as_deref().filter(|c| !c.is_empty())?;

        let status = match self.api.payment_status(charge_id).await {
            Ok(status) => status,
            Err(e) => {
                warn!(charge_id, error = %e, "status poll failed");
                return None;
            }
        };

        match StatusCategory::classify(&status.status) {
            StatusCategory::Success => {
                info!(charge_id, status = %status.status, "QR payment succeeded");
                Some(QrOutcome::Succeeded {
                    return_url: self.success_url(),
                })
            }
            StatusCategory::Failed => {
                info!(charge_id, status = %status.status, "QR payment failed");
                Some(QrOutcome::Failed {
                    status: status.status,
                })
            }
            StatusCategory::Pending | StatusCategory::Unknown => None,
        }
    }

    /// Polls until the payment settles or the countdown runs out.
    ///
    /// Once the deadline passes no further status call is made.
    pub async fn run(&self, countdown: Countdown) -> QrOutcome {
        if !self.params.has_qr_data() {
            return QrOutcome::Invalid;
        }

        let mut ticker =
            tokio::time::interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let expired = tokio::time::sleep_until(countdown.deadline());
        tokio::pin!(expired);

        loop {
            tokio::select! {
                biased;
                _ = &mut expired => {
                    info!(charge_id = ?self.params.charge_id, "QR code expired");
                    return QrOutcome::Expired;
                }
                _ = ticker.tick() => {
                    match tokio::time::timeout_at(countdown.deadline(), self.check_status()).await {
                        Ok(Some(outcome)) => return outcome,
                        Ok(None) => {}
                        Err(_) => return QrOutcome::Expired,
                    }
                }
            }
        }
    }

    /// Starts the countdown and the polling loop in the background.
    pub fn start(self) -> QrSession<A> {
        let expiry = self.expiry;
        let controller = Arc::new(self);
        let runner = Arc::clone(&controller);
        let task = ScheduledTask::start(expiry, move |countdown| async move {
            runner.run(countdown).await
        });
        QrSession { task, controller }
    }
}

/// A running QR page.
pub struct QrSession<A: ?Sized> {
    task: ScheduledTask<QrOutcome>,
    controller: Arc<QrPaymentController<A>>,
}

impl<A> QrSession<A>
where
    A: CheckoutApi + ?Sized + 'static,
{
    pub fn remaining(&self) -> Duration {
        self.task.remaining()
    }

    /// `MM:SS` or `EXPIRED`.
    pub fn timer_label(&self) -> String {
        self.task.countdown().label()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops polling and the countdown.
    pub fn stop(&self) {
        self.task.stop();
    }

    /// Manual re-check while the session runs.
    pub async fn check_again(&self) -> Option<QrOutcome> {
        self.controller.check_status().await
    }

    /// Stops the session and returns where to send the shopper.
    pub fn cancel(self) -> String {
        self.task.stop();
        self.controller.cancel_url()
    }

    /// The page's controller, kept alive past the session for re-checks.
    pub fn controller(&self) -> Arc<QrPaymentController<A>> {
        Arc::clone(&self.controller)
    }

    /// Waits for the session to end. `None` if it was stopped.
    pub async fn outcome(self) -> Option<QrOutcome> {
        self.task.join().await
    }
}
