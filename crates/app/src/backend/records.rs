//! Collaborator Records

use estante::{
    address::ShippingAddress,
    books::BookId,
    contact::Contact,
    order::{OrderDraft, OrderReference, OrderStatus},
    payment::PaymentMethod,
};
use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use zeroize::Zeroizing;

use crate::uuids::TypedUuid;

/// Customer UUID
pub type CustomerUuid = TypedUuid<CustomerRecord>;

/// Signed-in customer profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerRecord {
    pub uuid: CustomerUuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

/// Authenticated session
#[derive(Debug, Clone)]
pub struct Session {
    pub customer: CustomerRecord,
    pub access_token: Zeroizing<String>,
}

/// Address UUID
pub type AddressUuid = TypedUuid<AddressRecord>;

/// Saved shipping address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    pub uuid: AddressUuid,
    pub customer_uuid: CustomerUuid,
    pub address: ShippingAddress,
    pub is_default: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// New saved address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAddress {
    pub uuid: AddressUuid,
    pub customer_uuid: CustomerUuid,
    pub address: ShippingAddress,
}

/// Order UUID
pub type OrderUuid = TypedUuid<OrderRecord>;

/// Order header as stored by the collaborator, with its items when read back
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub uuid: OrderUuid,
    pub customer_uuid: Option<CustomerUuid>,
    pub contact: Contact,
    pub address: ShippingAddress,
    pub address_line: String,
    pub payment_method: PaymentMethod,
    pub subtotal: Money<'static, Currency>,
    pub total: Money<'static, Currency>,
    pub status: OrderStatus,
    pub items: Vec<OrderItemRecord>,
    pub created_at: Timestamp,
}

impl OrderRecord {
    /// Short human-readable reference.
    pub fn reference(&self) -> OrderReference {
        Self::reference_of(self.uuid)
    }

    /// Reference an order with this UUID is shown under.
    pub fn reference_of(uuid: OrderUuid) -> OrderReference {
        OrderReference::from(uuid.into_uuid())
    }
}

/// New order header. The collaborator generates the order UUID.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub customer_uuid: Option<CustomerUuid>,
    pub contact: Contact,
    pub address: ShippingAddress,
    pub address_line: String,
    pub payment_method: PaymentMethod,
    pub subtotal: Money<'static, Currency>,
    pub total: Money<'static, Currency>,
    pub status: OrderStatus,
}

impl From<&OrderDraft> for NewOrder {
    fn from(draft: &OrderDraft) -> Self {
        Self {
            customer_uuid: draft.customer.map(CustomerUuid::from_uuid),
            contact: draft.contact.clone(),
            address: draft.address.clone(),
            address_line: draft.address_line(),
            payment_method: draft.payment_method,
            subtotal: draft.subtotal,
            total: draft.total,
            status: draft.status,
        }
    }
}

/// Order line as stored by the collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItemRecord {
    pub order_uuid: OrderUuid,
    pub book_id: BookId,
    pub title: String,
    pub quantity: u32,
    pub unit_price: Money<'static, Currency>,
    pub subtotal: Money<'static, Currency>,
}

/// New order line
pub type NewOrderItem = OrderItemRecord;

impl OrderItemRecord {
    /// Lines of `draft`, keyed by the header's UUID.
    pub fn from_draft(order_uuid: OrderUuid, draft: &OrderDraft) -> Vec<Self> {
        draft
            .lines
            .iter()
            .map(|line| Self {
                order_uuid,
                book_id: line.book_id,
                title: line.title.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal,
            })
            .collect()
    }
}
