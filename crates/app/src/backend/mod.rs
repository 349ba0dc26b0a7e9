//! External collaborator: the hosted service that owns addresses, orders and sessions.

use async_trait::async_trait;
use estante::address::ShippingAddress;
use mockall::automock;
use thiserror::Error;

mod memory;
pub mod records;
mod rest;

pub use memory::{Fault, MemoryBackend, Operation};
pub use records::*;
pub use rest::{RestBackend, RestConfig};

/// Errors returned by collaborator calls.
#[derive(Debug, Error)]
pub enum BackendError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The caller is not allowed to perform the operation (row-level policy or missing grant).
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The requested record does not exist or is not visible to the caller.
    #[error("record not found")]
    NotFound,

    /// The collaborator returned a non-2xx response or an unexpected body.
    #[error("unexpected response from backend: {0}")]
    UnexpectedResponse(String),

    /// The collaborator could not be reached or refused to serve the request.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// A payload could not be decoded.
    #[error("failed to decode backend payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl BackendError {
    /// Whether the failure is a permission or policy rejection.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }
}

#[automock]
#[async_trait]
pub trait AddressStore: Send + Sync {
    /// Saved addresses of `customer`, default first, then newest first.
    async fn list_addresses(
        &self,
        customer: CustomerUuid,
    ) -> Result<Vec<AddressRecord>, BackendError>;

    /// A single saved address owned by `customer`.
    async fn get_address(
        &self,
        customer: CustomerUuid,
        uuid: AddressUuid,
    ) -> Result<AddressRecord, BackendError>;

    /// Save a new, non-default address.
    async fn insert_address(&self, address: NewAddress) -> Result<AddressRecord, BackendError>;

    /// Replace the fields of a saved address.
    async fn update_address(
        &self,
        customer: CustomerUuid,
        uuid: AddressUuid,
        address: ShippingAddress,
    ) -> Result<AddressRecord, BackendError>;

    /// Make `uuid` the only default address of `customer`, atomically.
    async fn set_default_address(
        &self,
        customer: CustomerUuid,
        uuid: AddressUuid,
    ) -> Result<(), BackendError>;
}

#[automock]
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Write an order header and return it with its generated UUID.
    async fn insert_order(&self, order: NewOrder) -> Result<OrderRecord, BackendError>;

    /// Write the lines of an existing order header.
    async fn insert_order_items(&self, items: Vec<NewOrderItem>) -> Result<(), BackendError>;

    /// Read an order and its lines, visible only to the contact email it was placed with.
    async fn get_order(&self, uuid: OrderUuid, email: String)
    -> Result<OrderRecord, BackendError>;
}

#[automock]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The signed-in session, or `None` for anonymous visitors.
    async fn current_session(&self) -> Result<Option<Session>, BackendError>;
}
