pub mod checkout;
pub mod http;
