use crate::domain::ports::PaymentGatewayRef;
use crate::domain::status::{PaymentStatus, StatusCategory};
use crate::error::{CheckoutError, Result};
use tracing::info;
use url::Url;

/// Read-through lookup of a charge's current state.
pub struct StatusPoller {
    gateway: PaymentGatewayRef,
    return_url: Url,
}

impl StatusPoller {
    pub fn new(gateway: PaymentGatewayRef, return_url: Url) -> Self {
        Self {
            gateway,
            return_url,
        }
    }

    /// Fetches the charge and classifies its status.
    ///
    /// `order_id` is only echoed back; the gateway lookup is by charge id.
    pub async fn status(&self, charge_id: &str, order_id: Option<&str>) -> Result<PaymentStatus> {
        if charge_id.trim().is_empty() {
            return Err(CheckoutError::InvalidRequest("charge id is required".into()));
        }

        info!(charge_id, "fetching charge status");
        let charge = self.gateway.get_charge(charge_id).await?;
        let category = StatusCategory::classify(&charge.status);

        let mut redirect_url = self.return_url.clone();
        {
            let mut query = redirect_url.query_pairs_mut();
            if let Some(order_id) = order_id {
                query.append_pair("orderId", order_id);
            }
            query
                .append_pair("status", &charge.status)
                .append_pair("chargeId", &charge.id);
        }

        Ok(PaymentStatus {
            success: true,
            charge_id: charge_id.to_string(),
            category,
            order_id: order_id.map(str::to_string),
            amount: charge.minor_amount(),
            currency: charge.currency_code().map(str::to_string),
            redirect_url: redirect_url.into(),
            method: charge.payment_method.clone(),
            status: charge.status,
        })
    }
}
