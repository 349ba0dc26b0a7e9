//! Orders service errors.

use thiserror::Error;

use crate::backend::{BackendError, OrderUuid};

/// Errors returned by the orders service.
#[derive(Debug, Error)]
pub enum OrdersServiceError {
    /// No order with that UUID and email.
    #[error("order not found")]
    NotFound,

    /// An access policy rejected the request.
    #[error("not allowed to record this order")]
    PermissionDenied(#[source] BackendError),

    /// The order header was written but its items were not.
    #[error("order {order} was recorded without its items")]
    Items {
        order: OrderUuid,
        source: BackendError,
    },

    /// Any other collaborator failure.
    #[error("order storage error")]
    Backend(#[source] BackendError),
}

impl OrdersServiceError {
    /// Whether the header write was rejected by an access policy.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }
}

impl From<BackendError> for OrdersServiceError {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::NotFound => Self::NotFound,
            BackendError::PermissionDenied(_) => Self::PermissionDenied(error),
            BackendError::Http(_)
            | BackendError::UnexpectedResponse(_)
            | BackendError::Unavailable(_)
            | BackendError::Decode(_) => Self::Backend(error),
        }
    }
}
