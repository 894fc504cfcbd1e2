//! Checkout domain: payment methods, the gateway's entities and the ports the
//! application layer depends on.

pub mod charge;
pub mod method;
pub mod payload;
pub mod payment;
pub mod ports;
pub mod status;
