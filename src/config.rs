//! Runtime configuration, read from command-line flags or the environment.

use crate::domain::method::PaymentMethod;
use clap::{Args, ValueEnum};
use secrecy::SecretString;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use url::Url;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_IDEMPOTENCY_TTL_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api";

/// Credentials and endpoints of the upstream gateway.
#[derive(Debug, Clone, Args)]
pub struct GatewayConfig {
    /// Merchant id sent with every gateway call.
    #[arg(long, env = "PPRO_MERCHANT_ID")]
    pub merchant_id: String,

    /// Bearer token for the gateway API.
    #[arg(long, env = "PPRO_API_KEY", hide_env_values = true)]
    pub api_key: SecretString,

    /// Gateway base URL, e.g. https://api.sandbox.eu.ppro.com
    #[arg(long, env = "PPRO_BASE_URL")]
    pub base_url: Url,

    /// Page the shopper returns to after authenticating.
    #[arg(long, env = "RETURN_URL")]
    pub return_url: Url,
}

/// When a recurring request creates an agreement instead of a plain charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AgreementPolicy {
    /// Any request flagged `recurring`.
    #[default]
    Recurring,
    /// Only recurring iDEAL requests.
    RecurringIdeal,
}

impl AgreementPolicy {
    pub fn uses_agreement(&self, method: PaymentMethod, recurring: bool) -> bool {
        match self {
            Self::Recurring => recurring,
            Self::RecurringIdeal => recurring && method == PaymentMethod::Ideal,
        }
    }
}

/// Settings of the `serve` command.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Interface to listen on.
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(long, short, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[command(flatten)]
    pub gateway: GatewayConfig,

    /// Endpoint selection for recurring requests.
    #[arg(long, value_enum, env = "AGREEMENT_POLICY", default_value_t = AgreementPolicy::Recurring)]
    pub agreement_policy: AgreementPolicy,

    /// How long an idempotency key replays its first response.
    #[arg(long, env = "IDEMPOTENCY_TTL_SECS", default_value_t = DEFAULT_IDEMPOTENCY_TTL_SECS)]
    pub idempotency_ttl_secs: u64,
}

impl ServerConfig {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn idempotency_ttl(&self) -> Duration {
        Duration::from_secs(self.idempotency_ttl_secs)
    }
}
