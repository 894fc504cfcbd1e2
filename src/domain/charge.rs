//! Upstream gateway entities.
//!
//! These types only mirror the parts of the gateway's JSON this service reads.
//! Every field the checkout flow does not strictly need is optional so that
//! schema additions upstream never break deserialization.

use serde::{Deserialize, Serialize};

/// Kind of shopper authentication offered by the gateway for a charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthenticationType {
    Redirect,
    ScanCode,
    AppIntent,
    MultiFactor,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_payload: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticationMethod {
    #[serde(rename = "type")]
    pub kind: AuthenticationType,
    #[serde(default)]
    pub details: AuthenticationDetails,
}

/// An amount as reported by the gateway: either bare minor units or a
/// `{value, currency}` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GatewayAmount {
    Minor(u64),
    Money {
        value: u64,
        #[serde(default)]
        currency: Option<String>,
    },
}

impl GatewayAmount {
    pub fn value(&self) -> u64 {
        match self {
            Self::Minor(value) | Self::Money { value, .. } => *value,
        }
    }

    pub fn currency(&self) -> Option<&str> {
        match self {
            Self::Minor(_) => None,
            Self::Money { currency, .. } => currency.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeOrder {
    #[serde(default)]
    pub order_reference_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authorization {
    #[serde(default)]
    pub amount: Option<GatewayAmount>,
}

/// An upstream payment attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Charge {
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub amount: Option<GatewayAmount>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub order: Option<ChargeOrder>,
    #[serde(default)]
    pub instrument_id: Option<String>,
    #[serde(default)]
    pub authentication_methods: Vec<AuthenticationMethod>,
    #[serde(default)]
    pub authorizations: Vec<Authorization>,
}

/// An upstream recurring-payment agreement with its initial charge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agreement {
    pub id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub instrument_id: Option<String>,
    #[serde(default)]
    pub initial_payment_charge_id: Option<String>,
    #[serde(default)]
    pub authentication_methods: Vec<AuthenticationMethod>,
}

/// Looks up the first authentication method of the given kind.
pub fn find_authentication(
    methods: &[AuthenticationMethod],
    kind: AuthenticationType,
) -> Option<&AuthenticationDetails> {
    methods.iter().find(|m| m.kind == kind).map(|m| &m.details)
}

impl Charge {
    pub fn authentication(&self, kind: AuthenticationType) -> Option<&AuthenticationDetails> {
        find_authentication(&self.authentication_methods, kind)
    }

    pub fn order_reference(&self) -> Option<&str> {
        self.order
            .as_ref()
            .and_then(|o| o.order_reference_number.as_deref())
    }

    /// Charged amount in minor units, falling back to the first authorization
    /// that reports one.
    pub fn minor_amount(&self) -> Option<u64> {
        self.amount
            .as_ref()
            .or_else(|| self.authorizations.iter().find_map(|a| a.amount.as_ref()))
            .map(GatewayAmount::value)
    }

    /// Currency of the charge, taken from the amount object when the charge
    /// has no top-level currency.
    pub fn currency_code(&self) -> Option<&str> {
        self.currency
            .as_deref()
            .or_else(|| self.amount.as_ref().and_then(GatewayAmount::currency))
    }
}

impl Agreement {
    pub fn authentication(&self, kind: AuthenticationType) -> Option<&AuthenticationDetails> {
        find_authentication(&self.authentication_methods, kind)
    }
}
