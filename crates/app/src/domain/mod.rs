//! Estante Domain Concerns

pub mod addresses;
pub mod checkout;
pub mod orders;
pub mod session;
