//! Page the shopper lands on after authenticating.

use super::api::CheckoutApi;
use crate::domain::status::StatusCategory;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Delay before the single re-check of a pending payment.
pub const PENDING_RETRY_DELAY: Duration = Duration::from_secs(5);

const NO_CHARGE_ID: &str = "Unable to verify payment status - no charge ID available";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnParams {
    pub status: Option<String>,
    pub charge_id: Option<String>,
    pub method: Option<String>,
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnState {
    Success,
    Pending,
    Failed,
    Cancelled,
    Expired,
    Unknown,
}

impl ReturnState {
    /// Refines the coarse status category into what the page shows.
    pub fn from_status(status: &str) -> Self {
        match StatusCategory::classify(status) {
            StatusCategory::Success => Self::Success,
            StatusCategory::Pending => Self::Pending,
            StatusCategory::Unknown => Self::Unknown,
            StatusCategory::Failed => {
                let status = status.to_ascii_lowercase();
                if status.contains("fail") || status.contains("error") {
                    Self::Failed
                } else if status.contains("cancel") {
                    Self::Cancelled
                } else if status.contains("expired") {
                    Self::Expired
                } else {
                    Self::Failed
                }
            }
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Success => "Payment Successful!",
            Self::Pending => "Payment Pending",
            Self::Failed => "Payment Failed",
            Self::Cancelled => "Payment Cancelled",
            Self::Expired => "Payment Expired",
            Self::Unknown => "Payment Status Unknown",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "Your payment has been processed successfully.",
            Self::Pending => "Your payment is being processed. This may take a few moments.",
            Self::Failed => "Your payment could not be processed. Please try again.",
            Self::Cancelled => "You cancelled the payment.",
            Self::Expired => "The payment session has expired. Please try again.",
            Self::Unknown => "We could not determine the status of your payment.",
        }
    }

    /// Whether the page offers a manual re-check.
    pub fn can_check_again(&self) -> bool {
        matches!(self, Self::Pending | Self::Unknown)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnView {
    pub state: ReturnState,
    pub status: String,
    pub charge_id: Option<String>,
    pub method: Option<String>,
    pub order_id: Option<String>,
    pub error: Option<String>,
}

pub struct ReturnPageController<A: ?Sized> {
    api: Arc<A>,
    params: ReturnParams,
    retry_delay: Duration,
}

impl<A> ReturnPageController<A>
where
    A: CheckoutApi + ?Sized,
{
    pub fn new(api: Arc<A>, params: ReturnParams) -> Self {
        Self {
            api,
            params,
            retry_delay: PENDING_RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Decides what the page shows.
    ///
    /// A non-pending status in the query is shown as is. Otherwise the
    /// backend is asked, and asked once more after the retry delay if the
    /// payment is still pending.
    pub async fn resolve(&self) -> ReturnView {
        if let Some(status) = self.params.status.as_deref().filter(|s| !s.is_empty())
            && ReturnState::from_status(status) != ReturnState::Pending
        {
            return self.view(ReturnState::from_status(status), status.to_string(), None);
        }

        let view = self.check().await;
        if view.state != ReturnState::Pending {
            return view;
        }

        debug!(delay = ?self.retry_delay, "payment still pending, checking again");
        tokio::time::sleep(self.retry_delay).await;
        self.check().await
    }

    /// One status check against the backend.
    pub async fn check(&self) -> ReturnView {
        let Some(charge_id) = self.params.charge_id.as_deref().filter(|c| !c.is_empty()) else {
            let status = self.params.status.clone().unwrap_or_else(|| "Unknown".into());
            return self.view(
                ReturnState::from_status(&status),
                status,
                Some(NO_CHARGE_ID.to_string()),
            );
        };

        match self.api.payment_status(charge_id).await {
            Ok(status) => ReturnView {
                state: ReturnState::from_status(&status.status),
                status: status.status,
                charge_id: Some(status.charge_id),
                method: status.method.or_else(|| self.params.method.clone()),
                order_id: status.order_id.or_else(|| self.params.order_id.clone()),
                error: None,
            },
            Err(e) => {
                warn!(charge_id, error = %e, "status check failed");
                self.view(ReturnState::Failed, "Error".into(), Some(e.to_string()))
            }
        }
    }

    fn view(&self, state: ReturnState, status: String, error: Option<String>) -> ReturnView {
        ReturnView {
            state,
            status,
            charge_id: self.params.charge_id.clone(),
            method: self.params.method.clone(),
            order_id: self.params.order_id.clone(),
            error,
        }
    }
}
