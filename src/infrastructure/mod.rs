//! Adapters behind the domain ports: the in-memory keyed store and the PPRO
//! HTTP client.

pub mod in_memory;
pub mod ppro;
