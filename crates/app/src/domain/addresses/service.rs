//! Addresses service.

use std::sync::Arc;

use async_trait::async_trait;
use estante::address::ShippingAddress;
use mockall::automock;
use tracing::{debug, instrument};

use crate::{
    backend::{AddressRecord, AddressStore, AddressUuid, CustomerUuid, NewAddress},
    domain::addresses::errors::AddressesServiceError,
};

#[derive(Clone)]
pub struct BackendAddressesService {
    store: Arc<dyn AddressStore>,
}

impl BackendAddressesService {
    #[must_use]
    pub fn new(store: Arc<dyn AddressStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl AddressesService for BackendAddressesService {
    async fn list_addresses(
        &self,
        customer: CustomerUuid,
    ) -> Result<Vec<AddressRecord>, AddressesServiceError> {
        Ok(self.store.list_addresses(customer).await?)
    }

    async fn get_address(
        &self,
        customer: CustomerUuid,
        address: AddressUuid,
    ) -> Result<AddressRecord, AddressesServiceError> {
        Ok(self.store.get_address(customer, address).await?)
    }

    #[instrument(skip(self, address), fields(customer = %customer))]
    async fn save_address(
        &self,
        customer: CustomerUuid,
        address: ShippingAddress,
        make_default: bool,
    ) -> Result<AddressRecord, AddressesServiceError> {
        let mut saved = self
            .store
            .insert_address(NewAddress {
                uuid: AddressUuid::new(),
                customer_uuid: customer,
                address,
            })
            .await?;

        debug!(address = %saved.uuid, "address saved");

        if make_default {
            self.store.set_default_address(customer, saved.uuid).await?;
            saved.is_default = true;
        }

        Ok(saved)
    }

    #[instrument(skip(self, address), fields(customer = %customer, address = %uuid))]
    async fn update_address(
        &self,
        customer: CustomerUuid,
        uuid: AddressUuid,
        address: ShippingAddress,
    ) -> Result<AddressRecord, AddressesServiceError> {
        Ok(self.store.update_address(customer, uuid, address).await?)
    }

    #[instrument(skip(self), fields(customer = %customer, address = %uuid))]
    async fn set_default(
        &self,
        customer: CustomerUuid,
        uuid: AddressUuid,
    ) -> Result<(), AddressesServiceError> {
        Ok(self.store.set_default_address(customer, uuid).await?)
    }
}

#[automock]
#[async_trait]
pub trait AddressesService: Send + Sync {
    /// Saved addresses of a customer, default first, then newest first.
    async fn list_addresses(
        &self,
        customer: CustomerUuid,
    ) -> Result<Vec<AddressRecord>, AddressesServiceError>;

    /// A single saved address. Addresses owned by other customers are not found.
    async fn get_address(
        &self,
        customer: CustomerUuid,
        address: AddressUuid,
    ) -> Result<AddressRecord, AddressesServiceError>;

    /// Saves a new address, optionally making it the customer's only default.
    async fn save_address(
        &self,
        customer: CustomerUuid,
        address: ShippingAddress,
        make_default: bool,
    ) -> Result<AddressRecord, AddressesServiceError>;

    /// Replaces the fields of a saved address.
    async fn update_address(
        &self,
        customer: CustomerUuid,
        uuid: AddressUuid,
        address: ShippingAddress,
    ) -> Result<AddressRecord, AddressesServiceError>;

    /// Makes `uuid` the customer's only default address.
    async fn set_default(
        &self,
        customer: CustomerUuid,
        uuid: AddressUuid,
    ) -> Result<(), AddressesServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::{
        backend::{Fault, MemoryBackend, Operation},
        test::helpers::{address, customer},
    };

    fn service(backend: &MemoryBackend) -> BackendAddressesService {
        BackendAddressesService::new(Arc::new(backend.clone()))
    }

    #[tokio::test]
    async fn save_address_without_default_is_not_default() -> TestResult {
        let backend = MemoryBackend::new();
        let customer = customer().uuid;

        let saved = service(&backend)
            .save_address(customer, address("Rua A"), false)
            .await?;

        assert!(!saved.is_default, "address should not be default");
        assert_eq!(backend.calls(Operation::SetDefaultAddress), 0);

        Ok(())
    }

    #[tokio::test]
    async fn new_default_replaces_previous_default() -> TestResult {
        let backend = MemoryBackend::new();
        let service = service(&backend);
        let customer = customer().uuid;

        let first = service
            .save_address(customer, address("Rua A"), true)
            .await?;
        let second = service
            .save_address(customer, address("Rua B"), true)
            .await?;

        let addresses = service.list_addresses(customer).await?;

        let defaults: Vec<AddressUuid> = addresses
            .iter()
            .filter(|record| record.is_default)
            .map(|record| record.uuid)
            .collect();

        assert_eq!(defaults, [second.uuid]);
        assert_eq!(
            addresses.iter().map(|record| record.uuid).collect::<Vec<_>>(),
            [second.uuid, first.uuid]
        );

        Ok(())
    }

    #[tokio::test]
    async fn setting_a_default_among_one_default_leaves_exactly_one() -> TestResult {
        let backend = MemoryBackend::new();
        let service = service(&backend);
        let customer = customer().uuid;

        let a = service
            .save_address(customer, address("Rua A"), false)
            .await?;
        let b = service
            .save_address(customer, address("Rua B"), true)
            .await?;

        service.set_default(customer, a.uuid).await?;

        let a = service.get_address(customer, a.uuid).await?;
        let b = service.get_address(customer, b.uuid).await?;

        assert!(a.is_default, "A should be the default");
        assert!(!b.is_default, "B should no longer be the default");

        Ok(())
    }

    #[tokio::test]
    async fn update_address_replaces_fields() -> TestResult {
        let backend = MemoryBackend::new();
        let service = service(&backend);
        let customer = customer().uuid;

        let saved = service
            .save_address(customer, address("Rua A"), false)
            .await?;

        let updated = service
            .update_address(customer, saved.uuid, address("Avenida Atlântica"))
            .await?;

        assert_eq!(updated.uuid, saved.uuid);
        assert_eq!(updated.address.street, "Avenida Atlântica");

        Ok(())
    }

    #[tokio::test]
    async fn unknown_address_is_not_found() {
        let backend = MemoryBackend::new();

        let result = service(&backend)
            .get_address(customer().uuid, AddressUuid::new())
            .await;

        assert!(
            matches!(result, Err(AddressesServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn policy_rejection_on_set_default_is_surfaced() {
        let backend = MemoryBackend::new();
        let service = service(&backend);
        let customer = customer().uuid;

        backend.fail(Operation::SetDefaultAddress, Fault::PermissionDenied);

        let result = service
            .save_address(customer, address("Rua A"), true)
            .await;

        assert!(
            matches!(result, Err(AddressesServiceError::PermissionDenied(_))),
            "expected PermissionDenied, got {result:?}"
        );
    }
}
