//! Addresses service errors.

use thiserror::Error;

use crate::backend::BackendError;

#[derive(Debug, Error)]
pub enum AddressesServiceError {
    #[error("address not found")]
    NotFound,

    #[error("not allowed to change this address")]
    PermissionDenied(#[source] BackendError),

    #[error("address storage error")]
    Backend(#[source] BackendError),
}

impl From<BackendError> for AddressesServiceError {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_rejections_are_permission_denied() {
        let error = AddressesServiceError::from(BackendError::PermissionDenied("rls".to_string()));

        assert!(
            matches!(error, AddressesServiceError::PermissionDenied(_)),
            "expected PermissionDenied, got {error:?}"
        );
    }

    #[test]
    fn missing_rows_are_not_found() {
        let error = AddressesServiceError::from(BackendError::NotFound);

        assert!(
            matches!(error, AddressesServiceError::NotFound),
            "expected NotFound, got {error:?}"
        );
    }
}
