use crate::domain::method::PaymentMethod;
use crate::domain::payload::{
    AppIntentSettings, AuthenticationSetting, BankAccountDetails, Consumer, ConsumerClient,
    InitialPaymentCharge, Instrument, Money, OrderReference, PaymentPayload, RedirectSettings,
    ScanCodeSettings,
};
use crate::domain::payment::PaymentInput;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use url::Url;

/// How long a Bancontact QR code stays scannable.
pub const QR_LIFETIME_SECS: i64 = 300;

const DEMO_CONSUMER_NAME: &str = "John Smith";
const DEMO_CLIENT_IP: &str = "11.22.22.33";
const DEMO_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36";
const IDEAL_TEST_BANK_CODE: &str = "TESTNL2A";
const APP_INTENT_URI: &str = "webshop://paymentresponse?123";

/// Shapes gateway request bodies for each supported payment method.
///
/// Building is pure: the only inputs are the builder's settings, the
/// validated payment input and the issue timestamp.
#[derive(Debug, Clone)]
pub struct PaymentDataBuilder {
    return_url: Url,
    scan_window: TimeDelta,
}

impl PaymentDataBuilder {
    pub fn new(return_url: Url) -> Self {
        Self {
            return_url,
            scan_window: TimeDelta::seconds(QR_LIFETIME_SECS),
        }
    }

    pub fn with_scan_window(mut self, scan_window: TimeDelta) -> Self {
        self.scan_window = scan_window;
        self
    }

    /// Where the gateway sends the shopper back to after authentication.
    pub fn return_url_for(&self, input: &PaymentInput) -> String {
        let mut url = self.return_url.clone();
        url.query_pairs_mut()
            .append_pair("orderId", input.order_id.as_str())
            .append_pair("method", input.method.code());
        url.into()
    }

    pub fn build(&self, input: &PaymentInput, issued_at: DateTime<Utc>) -> PaymentPayload {
        let redirect = AuthenticationSetting::Redirect {
            settings: RedirectSettings {
                return_url: self.return_url_for(input),
            },
        };
        let money = Money {
            value: input.amount,
            currency: input.currency.clone(),
        };

        match input.method {
            PaymentMethod::Ideal if input.recurring => PaymentPayload {
                payment_method: input.method.code().to_string(),
                amount: None,
                order: None,
                consumer: Consumer {
                    name: Some(DEMO_CONSUMER_NAME.to_string()),
                    country: "NL".to_string(),
                    client: None,
                },
                instrument: Some(Instrument::BankAccount {
                    details: BankAccountDetails {
                        bank_code: None,
                        debit_mandate_id: Some(format!("MANDATE-{}", input.order_id)),
                    },
                }),
                authentication_settings: vec![redirect],
                initial_payment_charge: Some(InitialPaymentCharge { amount: money }),
            },
            PaymentMethod::Ideal => PaymentPayload {
                consumer: Consumer {
                    name: None,
                    country: "NL".to_string(),
                    client: None,
                },
                instrument: Some(Instrument::BankAccount {
                    details: BankAccountDetails {
                        bank_code: Some(IDEAL_TEST_BANK_CODE.to_string()),
                        debit_mandate_id: None,
                    },
                }),
                ..self.base(input, money, vec![redirect])
            },
            PaymentMethod::Blik => PaymentPayload {
                consumer: Consumer {
                    name: Some(DEMO_CONSUMER_NAME.to_string()),
                    country: "PL".to_string(),
                    client: Some(ConsumerClient {
                        ip: DEMO_CLIENT_IP.to_string(),
                        user_agent: DEMO_USER_AGENT.to_string(),
                    }),
                },
                ..self.base(input, money, vec![redirect, AuthenticationSetting::MultiFactor])
            },
            PaymentMethod::Bancontact | PaymentMethod::BancontactQr => {
                let scan_by = (issued_at + self.scan_window)
                    .to_rfc3339_opts(SecondsFormat::Millis, true);
                let settings = vec![
                    redirect,
                    AuthenticationSetting::ScanCode {
                        settings: ScanCodeSettings { scan_by },
                    },
                    AuthenticationSetting::AppIntent {
                        settings: AppIntentSettings {
                            mobile_intent_uri: APP_INTENT_URI.to_string(),
                        },
                    },
                ];
                PaymentPayload {
                    // Both flows are the same gateway method.
                    payment_method: PaymentMethod::Bancontact.code().to_string(),
                    consumer: Consumer {
                        name: None,
                        country: "BE".to_string(),
                        client: None,
                    },
                    ..self.base(input, money, settings)
                }
            }
        }
    }

    fn base(
        &self,
        input: &PaymentInput,
        money: Money,
        authentication_settings: Vec<AuthenticationSetting>,
    ) -> PaymentPayload {
        PaymentPayload {
            payment_method: input.method.code().to_string(),
            amount: Some(money),
            order: Some(OrderReference {
                order_reference_number: input.order_id.to_string(),
            }),
            consumer: Consumer {
                name: None,
                country: String::new(),
                client: None,
            },
            instrument: None,
            authentication_settings,
            initial_payment_charge: None,
        }
    }
}
