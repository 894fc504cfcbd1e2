use thiserror::Error;

pub type Result<T> = std::result::Result<T, CheckoutError>;

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Missing required fields")]
    MissingFields,
    #[error("Invalid payment method")]
    UnsupportedMethod(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// Non-2xx answer from the gateway, carrying its own message.
    #[error("{message}")]
    Gateway { status: u16, message: String },
    #[error("Malformed gateway response: {0}")]
    MalformedResponse(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Error reported by the checkout backend to one of its clients.
    #[error("{0}")]
    Api(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CheckoutError {
    /// Whether the failure was caused by the caller's input rather than by
    /// the gateway or the process itself.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MissingFields | Self::UnsupportedMethod(_) | Self::InvalidRequest(_)
        )
    }

    /// HTTP status code the backend answers with for this error.
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() { 400 } else { 500 }
    }
}
