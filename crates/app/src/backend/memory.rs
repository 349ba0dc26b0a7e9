//! In-memory collaborator, used by tests and offline runs.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use estante::address::ShippingAddress;
use jiff::Timestamp;
use rustc_hash::FxHashMap;

use super::{
    AddressRecord, AddressStore, AddressUuid, BackendError, CustomerRecord, CustomerUuid,
    NewAddress, NewOrder, NewOrderItem, OrderItemRecord, OrderRecord, OrderStore, OrderUuid,
    Session, SessionStore,
};

/// Collaborator operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListAddresses,
    GetAddress,
    InsertAddress,
    UpdateAddress,
    SetDefaultAddress,
    InsertOrder,
    InsertOrderItems,
    GetOrder,
    CurrentSession,
}

/// A failure to inject into the next call of an [`Operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Reject the call as a policy violation
    PermissionDenied,

    /// Fail as if the collaborator were unreachable
    Unavailable,
}

impl Fault {
    fn into_error(self, operation: Operation) -> BackendError {
        match self {
            Self::PermissionDenied => {
                BackendError::PermissionDenied(format!("{operation:?} rejected by policy"))
            }
            Self::Unavailable => BackendError::Unavailable(format!("{operation:?} unavailable")),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    addresses: Vec<AddressRecord>,
    orders: Vec<OrderRecord>,
    items: Vec<OrderItemRecord>,
    session: Option<Session>,
    faults: FxHashMap<Operation, VecDeque<Fault>>,
    calls: FxHashMap<Operation, usize>,
}

impl State {
    fn enter(&mut self, operation: Operation) -> Result<(), BackendError> {
        *self.calls.entry(operation).or_default() += 1;

        match self
            .faults
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
        {
            Some(fault) => Err(fault.into_error(operation)),
            None => Ok(()),
        }
    }

    fn address_mut(
        &mut self,
        customer: CustomerUuid,
        uuid: AddressUuid,
    ) -> Result<&mut AddressRecord, BackendError> {
        self.addresses
            .iter_mut()
            .find(|record| record.uuid == uuid && record.customer_uuid == customer)
            .ok_or(BackendError::NotFound)
    }
}

/// Collaborator backed by process memory. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a session for `customer`.
    pub fn sign_in(&self, customer: CustomerRecord) -> Session {
        let session = Session {
            customer,
            access_token: String::from("memory-session").into(),
        };

        self.lock().session = Some(session.clone());

        session
    }

    /// End the current session.
    pub fn sign_out(&self) {
        self.lock().session = None;
    }

    /// Fail the next call of `operation` with `fault`.
    pub fn fail(&self, operation: Operation, fault: Fault) {
        self.fail_times(operation, fault, 1);
    }

    /// Fail the next `times` calls of `operation` with `fault`.
    pub fn fail_times(&self, operation: Operation, fault: Fault, times: usize) {
        self.lock()
            .faults
            .entry(operation)
            .or_default()
            .extend(std::iter::repeat_n(fault, times));
    }

    /// Number of calls made to `operation`, failed ones included.
    pub fn calls(&self, operation: Operation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or_default()
    }

    /// Total calls made across every operation.
    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    /// Every stored order header, oldest first, without items.
    pub fn orders(&self) -> Vec<OrderRecord> {
        self.lock().orders.clone()
    }

    /// Every stored order line.
    pub fn order_items(&self) -> Vec<OrderItemRecord> {
        self.lock().items.clone()
    }
}

#[async_trait]
impl AddressStore for MemoryBackend {
    async fn list_addresses(
        &self,
        customer: CustomerUuid,
    ) -> Result<Vec<AddressRecord>, BackendError> {
        let mut state = self.lock();

        state.enter(Operation::ListAddresses)?;

        let mut addresses: Vec<AddressRecord> = state
            .addresses
            .iter()
            .rev()
            .filter(|record| record.customer_uuid == customer)
            .cloned()
            .collect();

        addresses.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        Ok(addresses)
    }

    async fn get_address(
        &self,
        customer: CustomerUuid,
        uuid: AddressUuid,
    ) -> Result<AddressRecord, BackendError> {
        let mut state = self.lock();

        state.enter(Operation::GetAddress)?;

        state.address_mut(customer, uuid).map(|record| record.clone())
    }

    async fn insert_address(&self, address: NewAddress) -> Result<AddressRecord, BackendError> {
        let mut state = self.lock();

        state.enter(Operation::InsertAddress)?;

        if state.addresses.iter().any(|record| record.uuid == address.uuid) {
            return Err(BackendError::UnexpectedResponse(format!(
                "address {} already exists",
                address.uuid
            )));
        }

        let now = Timestamp::now();

        let record = AddressRecord {
            uuid: address.uuid,
            customer_uuid: address.customer_uuid,
            address: address.address,
            is_default: false,
            created_at: now,
            updated_at: now,
        };

        state.addresses.push(record.clone());

        Ok(record)
    }

    async fn update_address(
        &self,
        customer: CustomerUuid,
        uuid: AddressUuid,
        address: ShippingAddress,
    ) -> Result<AddressRecord, BackendError> {
        let mut state = self.lock();

        state.enter(Operation::UpdateAddress)?;

        let record = state.address_mut(customer, uuid)?;

        record.address = address;
        record.updated_at = Timestamp::now();

        Ok(record.clone())
    }

    async fn set_default_address(
        &self,
        customer: CustomerUuid,
        uuid: AddressUuid,
    ) -> Result<(), BackendError> {
        let mut state = self.lock();

        state.enter(Operation::SetDefaultAddress)?;
        state.address_mut(customer, uuid)?;

        let now = Timestamp::now();

        for record in state
            .addresses
            .iter_mut()
            .filter(|record| record.customer_uuid == customer)
        {
            let is_default = record.uuid == uuid;

            if record.is_default != is_default {
                record.is_default = is_default;
                record.updated_at = now;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryBackend {
    async fn insert_order(&self, order: NewOrder) -> Result<OrderRecord, BackendError> {
        let mut state = self.lock();

        state.enter(Operation::InsertOrder)?;

        let record = OrderRecord {
            uuid: OrderUuid::new(),
            customer_uuid: order.customer_uuid,
            contact: order.contact,
            address: order.address,
            address_line: order.address_line,
            payment_method: order.payment_method,
            subtotal: order.subtotal,
            total: order.total,
            status: order.status,
            items: Vec::new(),
            created_at: Timestamp::now(),
        };

        state.orders.push(record.clone());

        Ok(record)
    }

    async fn insert_order_items(&self, items: Vec<NewOrderItem>) -> Result<(), BackendError> {
        let mut state = self.lock();

        state.enter(Operation::InsertOrderItems)?;

        let orphan = items.iter().find(|item| {
            !state
                .orders
                .iter()
                .any(|order| order.uuid == item.order_uuid)
        });

        if orphan.is_some() {
            return Err(BackendError::NotFound);
        }

        state.items.extend(items);

        Ok(())
    }

    async fn get_order(
        &self,
        uuid: OrderUuid,
        email: String,
    ) -> Result<OrderRecord, BackendError> {
        let mut state = self.lock();

        state.enter(Operation::GetOrder)?;

        let mut order = state
            .orders
            .iter()
            .find(|order| {
                order.uuid == uuid && order.contact.email.eq_ignore_ascii_case(email.trim())
            })
            .cloned()
            .ok_or(BackendError::NotFound)?;

        order.items = state
            .items
            .iter()
            .filter(|item| item.order_uuid == uuid)
            .cloned()
            .collect();

        Ok(order)
    }
}

#[async_trait]
impl SessionStore for MemoryBackend {
    async fn current_session(&self) -> Result<Option<Session>, BackendError> {
        let mut state = self.lock();

        state.enter(Operation::CurrentSession)?;

        Ok(state.session.clone())
    }
}
