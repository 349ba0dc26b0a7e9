//! Checkout errors.

use estante::{order::OrderDraftError, validation::ValidationErrors};
use thiserror::Error;

use crate::domain::{addresses::AddressesServiceError, orders::OrdersServiceError};

#[derive(Debug, Error)]
pub enum CheckoutError {
    /// One or more form fields failed validation. Nothing was sent to the collaborator.
    #[error("checkout form is invalid: {0}")]
    Validation(ValidationErrors),

    #[error("cart is empty")]
    EmptyCart,

    #[error("order is already being submitted")]
    AlreadySubmitting,

    #[error("order was already placed")]
    AlreadySucceeded,

    /// Nothing to retry: the attempt has not failed.
    #[error("checkout has not failed")]
    NotFailed,

    #[error("failed to persist shipping address")]
    Address(#[source] AddressesServiceError),

    #[error("failed to record order")]
    Order(#[source] OrdersServiceError),

    #[error("failed to build order")]
    Draft(#[source] OrderDraftError),
}

impl From<ValidationErrors> for CheckoutError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<AddressesServiceError> for CheckoutError {
    fn from(error: AddressesServiceError) -> Self {
        Self::Address(error)
    }
}

impl From<OrdersServiceError> for CheckoutError {
    fn from(error: OrdersServiceError) -> Self {
        Self::Order(error)
    }
}

impl From<OrderDraftError> for CheckoutError {
    fn from(error: OrderDraftError) -> Self {
        match error {
            OrderDraftError::EmptyCart => Self::EmptyCart,
            OrderDraftError::TotalPrice(_) | OrderDraftError::Discount(_) => Self::Draft(error),
        }
    }
}
