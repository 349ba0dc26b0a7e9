//! Checkout

pub mod errors;
pub mod form;
pub mod service;

pub use errors::CheckoutError;
pub use form::{AddressChoice, CheckoutForm};
pub use service::*;
