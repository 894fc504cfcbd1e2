use crate::error::CheckoutError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A local payment method offered at checkout.
///
/// Shoppers pick methods by their lowercase client code (`ideal`,
/// `bancontactqr`, ...); the gateway knows them by their uppercase code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Ideal,
    Blik,
    Bancontact,
    BancontactQr,
}

impl PaymentMethod {
    pub const ALL: [Self; 4] = [Self::Ideal, Self::Blik, Self::Bancontact, Self::BancontactQr];

    /// Resolves a client code, ignoring case. Unknown codes yield `None`.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "ideal" => Some(Self::Ideal),
            "blik" => Some(Self::Blik),
            "bancontact" => Some(Self::Bancontact),
            "bancontactqr" => Some(Self::BancontactQr),
            _ => None,
        }
    }

    pub fn client_code(&self) -> &'static str {
        match self {
            Self::Ideal => "ideal",
            Self::Blik => "blik",
            Self::Bancontact => "bancontact",
            Self::BancontactQr => "bancontactqr",
        }
    }

    /// Normalized gateway code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ideal => "IDEAL",
            Self::Blik => "BLIK",
            Self::Bancontact => "BANCONTACT",
            Self::BancontactQr => "BANCONTACTQR",
        }
    }

    /// The only currency the method is offered in.
    pub fn currency(&self) -> Currency {
        match self {
            Self::Blik => Currency::Pln,
            Self::Ideal | Self::Bancontact | Self::BancontactQr => Currency::Eur,
        }
    }

    pub fn supports_recurring(&self) -> bool {
        matches!(self, Self::Ideal)
    }

    /// Whether the shopper authenticates by scanning a code instead of
    /// being redirected.
    pub fn is_scan_code(&self) -> bool {
        matches!(self, Self::BancontactQr)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.client_code())
    }
}

impl FromStr for PaymentMethod {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| CheckoutError::UnsupportedMethod(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Eur,
    Pln,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Eur => "EUR",
            Self::Pln => "PLN",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eur => "€",
            Self::Pln => "zł",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EUR" => Ok(Self::Eur),
            "PLN" => Ok(Self::Pln),
            other => Err(CheckoutError::InvalidRequest(format!(
                "Unsupported currency: {other}"
            ))),
        }
    }
}

/// Formats a minor-unit amount for display, e.g. `11979` EUR as `€119.79`.
///
/// Unknown currency codes are used verbatim in place of a symbol.
pub fn format_amount(minor_units: u64, currency: &str) -> String {
    let symbol = currency
        .parse::<Currency>()
        .map(|c| c.symbol().to_string())
        .unwrap_or_else(|_| currency.to_string());
    let value = Decimal::from(minor_units) / Decimal::ONE_HUNDRED;
    format!("{symbol}{value:.2}")
}
