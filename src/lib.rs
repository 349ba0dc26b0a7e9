//! Estante
//!
//! Estante is the cart, pricing and checkout core of a bookstore storefront: an in-memory cart
//! store, money-safe pricing and discount calculation, shipping address validation and the pure
//! half of checkout reconciliation that turns a cart snapshot into an order draft.

pub mod address;
pub mod books;
pub mod cart;
pub mod catalog;
pub mod contact;
pub mod discounts;
pub mod legacy;
pub mod order;
pub mod payment;
pub mod prelude;
pub mod pricing;
pub mod receipt;
pub mod upsell;
pub mod validation;
