//! HTTP surface of the checkout backend.
//!
//! Routes:
//! - `POST /api/payments/create`
//! - `GET  /api/payments/status/:charge_id`
//! - `GET  /api`
//! - `GET  /health`
//! - `GET  /payment-return`

pub mod error;
pub mod handlers;

use crate::application::orchestrator::PaymentOrchestrator;
use crate::application::payment_data::PaymentDataBuilder;
use crate::application::status_poller::StatusPoller;
use crate::config::ServerConfig;
use crate::domain::payment::{CreatePaymentResponse, RecurringToken};
use crate::domain::ports::PaymentGatewayRef;
use crate::error::Result;
use crate::infrastructure::in_memory::InMemoryStore;
use crate::infrastructure::ppro::PproClient;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<PaymentOrchestrator>,
    pub status_poller: Arc<StatusPoller>,
    pub merchant_id: Arc<str>,
    pub gateway_base_url: Arc<str>,
}

impl AppState {
    /// Wires the PPRO client and the in-memory stores from configuration.
    pub fn from_config(config: &ServerConfig) -> Self {
        let gateway: PaymentGatewayRef = Arc::new(PproClient::new(&config.gateway));
        Self::with_gateway(config, gateway)
    }

    /// Same as `from_config` with the gateway supplied by the caller.
    pub fn with_gateway(config: &ServerConfig, gateway: PaymentGatewayRef) -> Self {
        let return_url = config.gateway.return_url.clone();
        let orchestrator = PaymentOrchestrator::new(
            Arc::clone(&gateway),
            Box::new(InMemoryStore::<CreatePaymentResponse>::new()),
            Box::new(InMemoryStore::<RecurringToken>::new()),
            PaymentDataBuilder::new(return_url.clone()),
        )
        .with_agreement_policy(config.agreement_policy)
        .with_idempotency_ttl(config.idempotency_ttl());

        Self {
            orchestrator: Arc::new(orchestrator),
            status_poller: Arc::new(StatusPoller::new(gateway, return_url)),
            merchant_id: config.gateway.merchant_id.as_str().into(),
            gateway_base_url: config.gateway.base_url.as_str().into(),
        }
    }
}

/// Builds the full router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api", get(handlers::api_index))
        .route("/api/payments/create", post(handlers::create_payment))
        .route("/api/payments/status/:charge_id", get(handlers::payment_status))
        .route("/payment-return", get(handlers::payment_return))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the backend until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let addr = config.listen_addr();
    let app = router(AppState::from_config(&config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        %addr,
        merchant_id = %config.gateway.merchant_id,
        base_url = %config.gateway.base_url,
        "checkout server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("checkout server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // Without a signal handler the server runs until killed.
        std::future::pending::<()>().await;
    }
}
