//! Request bodies sent to the gateway's charge and agreement endpoints.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub payment_method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderReference>,
    pub consumer: Consumer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument: Option<Instrument>,
    pub authentication_settings: Vec<AuthenticationSetting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_payment_charge: Option<InitialPaymentCharge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Money {
    pub value: u64,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReference {
    pub order_reference_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Consumer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<ConsumerClient>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerClient {
    pub ip: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Instrument {
    BankAccount { details: BankAccountDetails },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccountDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debit_mandate_id: Option<String>,
}

/// One way the shopper may authenticate, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthenticationSetting {
    Redirect { settings: RedirectSettings },
    MultiFactor,
    ScanCode { settings: ScanCodeSettings },
    AppIntent { settings: AppIntentSettings },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectSettings {
    pub return_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanCodeSettings {
    /// RFC 3339 deadline for scanning the code.
    pub scan_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppIntentSettings {
    pub mobile_intent_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InitialPaymentCharge {
    pub amount: Money,
}
