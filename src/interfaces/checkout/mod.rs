//! Controllers behind the shopper-facing pages.
//!
//! They talk to the backend through [`api::CheckoutApi`] and return what the
//! page should show or where it should navigate; rendering is left to the
//! caller. Timers run on tokio and can be stopped at any point.

pub mod api;
pub mod checkout_page;
pub mod qr_page;
pub mod return_page;
pub mod schedule;
