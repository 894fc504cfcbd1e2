//! Application layer containing the checkout flow's orchestration.
//!
//! `PaymentOrchestrator` is the entry point for creating payments and
//! `StatusPoller` for reading them back. Both depend only on the domain ports,
//! so the gateway and the stores can be swapped in tests.

pub mod orchestrator;
pub mod payment_data;
pub mod status_poller;
