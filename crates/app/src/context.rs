//! App Context

use std::sync::Arc;

use estante::discounts::PaymentDiscounts;
use rusty_money::iso;
use thiserror::Error;
use tracing::info;

use crate::{
    backend::{MemoryBackend, RestBackend, RestConfig, SessionStore},
    config::{BackendConfig, CheckoutConfig},
    domain::{
        addresses::{AddressesService, BackendAddressesService},
        checkout::Checkout,
        orders::{BackendOrdersService, OrdersService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("a backend key is required when a backend URL is set")]
    MissingBackendKey,
}

#[derive(Clone)]
pub struct AppContext {
    pub addresses: Arc<dyn AddressesService>,
    pub orders: Arc<dyn OrdersService>,
    pub sessions: Arc<dyn SessionStore>,
    pub discounts: PaymentDiscounts,
}

impl AppContext {
    /// Build application context from configuration.
    ///
    /// Talks to the hosted collaborator when a backend URL is configured, otherwise keeps
    /// everything in process memory.
    ///
    /// # Errors
    ///
    /// Returns an error when a backend URL is set without a key.
    pub fn from_config(
        backend: &BackendConfig,
        checkout: &CheckoutConfig,
    ) -> Result<Self, AppInitError> {
        let Some(url) = backend.backend_url.clone() else {
            info!("no backend URL configured, using in-memory backend");

            return Ok(Self::in_memory(&MemoryBackend::new(), checkout));
        };

        let api_key = backend
            .backend_key
            .clone()
            .ok_or(AppInitError::MissingBackendKey)?;

        let rest = Arc::new(RestBackend::new(RestConfig {
            url,
            api_key,
            access_token: backend.access_token.clone(),
            currency: iso::BRL,
        }));

        Ok(Self {
            addresses: Arc::new(BackendAddressesService::new(rest.clone())),
            orders: Arc::new(BackendOrdersService::new(
                rest.clone(),
                checkout.item_failure,
            )),
            sessions: rest,
            discounts: checkout.payment_discounts(),
        })
    }

    /// Build application context over an in-memory backend.
    #[must_use]
    pub fn in_memory(backend: &MemoryBackend, checkout: &CheckoutConfig) -> Self {
        let backend = Arc::new(backend.clone());

        Self {
            addresses: Arc::new(BackendAddressesService::new(backend.clone())),
            orders: Arc::new(BackendOrdersService::new(
                backend.clone(),
                checkout.item_failure,
            )),
            sessions: backend,
            discounts: checkout.payment_discounts(),
        }
    }

    /// Start a new checkout attempt.
    #[must_use]
    pub fn checkout(&self) -> Checkout {
        Checkout::new(
            self.addresses.clone(),
            self.orders.clone(),
            self.discounts.clone(),
        )
    }
}
