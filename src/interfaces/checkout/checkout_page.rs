//! The checkout form: currency and method selection, and what happens on
//! "Pay".

use super::api::CheckoutApi;
use super::qr_page::QrPageParams;
use crate::domain::method::{Currency, PaymentMethod, format_amount};
use crate::domain::payment::PaymentRequest;
use crate::error::{CheckoutError, Result};
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use tracing::info;

/// Order total of the demo basket, in minor units.
pub const DEMO_AMOUNT: u64 = 11979;

/// Placeholder the gateway may leave in redirect URLs.
pub const CHARGE_ID_PLACEHOLDER: &str = "{{chargeId}}";

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// `<unix millis>-<7 base36 chars>`, fresh for every submit.
pub fn generate_idempotency_key() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..7)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayButton {
    Disabled { label: String },
    Enabled { label: String },
}

impl PayButton {
    pub fn label(&self) -> &str {
        match self {
            Self::Disabled { label } | Self::Enabled { label } => label,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled { .. })
    }
}

/// State of the checkout form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutForm {
    currency: Currency,
    method: Option<PaymentMethod>,
    recurring: bool,
    amount: u64,
}

impl Default for CheckoutForm {
    fn default() -> Self {
        Self::new(DEMO_AMOUNT)
    }
}

impl CheckoutForm {
    pub fn new(amount: u64) -> Self {
        Self {
            currency: Currency::default(),
            method: None,
            recurring: false,
            amount,
        }
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn method(&self) -> Option<PaymentMethod> {
        self.method
    }

    pub fn recurring(&self) -> bool {
        self.recurring
    }

    pub fn is_available(&self, method: PaymentMethod) -> bool {
        method.currency() == self.currency
    }

    pub fn available_methods(&self) -> Vec<PaymentMethod> {
        PaymentMethod::ALL
            .into_iter()
            .filter(|m| self.is_available(*m))
            .collect()
    }

    /// Switching currency drops a method that is not offered in it.
    pub fn select_currency(&mut self, currency: Currency) {
        self.currency = currency;
        if let Some(method) = self.method
            && !self.is_available(method)
        {
            self.method = None;
            self.recurring = false;
        }
    }

    pub fn select_method(&mut self, method: PaymentMethod) -> Result<()> {
        if !self.is_available(method) {
            return Err(CheckoutError::InvalidRequest(format!(
                "{} is not available in {}",
                method.code(),
                self.currency
            )));
        }
        self.method = Some(method);
        if !method.supports_recurring() {
            self.recurring = false;
        }
        Ok(())
    }

    pub fn recurring_available(&self) -> bool {
        self.method.is_some_and(|m| m.supports_recurring())
    }

    /// Returns whether recurring ended up on; it stays off for methods
    /// without agreements.
    pub fn set_recurring(&mut self, recurring: bool) -> bool {
        self.recurring = recurring && self.recurring_available();
        self.recurring
    }

    pub fn pay_button(&self) -> PayButton {
        match self.method {
            None => PayButton::Disabled {
                label: "Select a payment method".into(),
            },
            Some(_) => PayButton::Enabled {
                label: format!("Pay {}", format_amount(self.amount, self.currency.code())),
            },
        }
    }

    pub fn payment_request(&self, idempotency_key: String) -> Result<PaymentRequest> {
        let method = self
            .method
            .ok_or_else(|| CheckoutError::InvalidRequest("Please select a payment method".into()))?;
        Ok(PaymentRequest {
            method: Some(method.client_code().to_string()),
            currency: Some(self.currency.code().to_string()),
            amount: Some(self.amount),
            recurring: self.recurring,
            idempotency_key: Some(idempotency_key),
        })
    }
}

/// Where the shopper goes after a successful submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutNext {
    /// Off-site authentication at the gateway or bank.
    Redirect { url: String },
    /// The on-site QR page.
    QrPage { url: String, params: QrPageParams },
}

impl CheckoutNext {
    pub fn url(&self) -> &str {
        match self {
            Self::Redirect { url } | Self::QrPage { url, .. } => url,
        }
    }
}

pub struct CheckoutController<A: ?Sized> {
    api: Arc<A>,
    pub form: CheckoutForm,
}

impl<A> CheckoutController<A>
where
    A: CheckoutApi + ?Sized,
{
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            form: CheckoutForm::default(),
        }
    }

    pub fn with_form(mut self, form: CheckoutForm) -> Self {
        self.form = form;
        self
    }

    /// Creates the payment under a fresh idempotency key and works out the
    /// next page.
    pub async fn submit(&self) -> Result<CheckoutNext> {
        let request = self.form.payment_request(generate_idempotency_key())?;
        info!(method = ?request.method, key = ?request.idempotency_key, "submitting payment");

        let response = self.api.create_payment(&request).await?;
        if !response.success {
            return Err(CheckoutError::Api("Failed to create payment".into()));
        }

        if let Some(qr_data) = response.qr_code.filter(|q| !q.is_empty()) {
            let params = QrPageParams {
                order_id: Some(response.order_id),
                charge_id: Some(response.charge_id),
                qr_data: Some(qr_data),
                payment_method: request.method,
                amount: Some(response.amount),
                currency: Some(response.currency),
            };
            return Ok(CheckoutNext::QrPage {
                url: params.to_url(),
                params,
            });
        }

        match response.redirect_url.filter(|u| !u.is_empty()) {
            Some(url) => Ok(CheckoutNext::Redirect {
                url: url.replace(CHARGE_ID_PLACEHOLDER, &response.charge_id),
            }),
            None => Err(CheckoutError::Api("No redirect URL received".into())),
        }
    }
}
