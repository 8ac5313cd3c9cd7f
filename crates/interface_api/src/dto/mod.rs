//! Request and response bodies
//!
//! Creation requests reuse the service input types directly. Responses are
//! flattened views with plain decimal amounts and a currency code.

pub mod audit;
pub mod bill;
pub mod multi_farmer;
pub mod settings;
