use crate::error::CheckoutError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::error::Error as _;
use tracing::{error, warn};

/// JSON error body: `{"error": "..."}`, plus `details` on server errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// A `CheckoutError` on its way out of a handler.
#[derive(Debug)]
pub struct ApiError(pub CheckoutError);

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let details = if err.is_client_error() {
            warn!(error = %err, "rejected request");
            None
        } else {
            error!(error = %err, "request failed");
            Some(source_chain(&err))
        };

        let body = ErrorBody {
            error: err.to_string(),
            details,
        };
        (status, Json(body)).into_response()
    }
}

fn source_chain(err: &CheckoutError) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}
