//! Orders
//!
//! An [`OrderDraft`] is the snapshot of a cart, contact, address and payment choice that is
//! submitted at checkout. Totals are computed here from current prices; the draft never reads the
//! cart's cached total.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    address::ShippingAddress,
    books::BookId,
    cart::{Cart, CartItem},
    contact::Contact,
    discounts::{DiscountError, PaymentDiscounts},
    payment::PaymentMethod,
    pricing::{TotalPriceError, cart_subtotal, line_subtotal},
};

/// Errors that can occur while drafting an order.
#[derive(Debug, Error)]
pub enum OrderDraftError {
    /// Nothing to order.
    #[error("cannot draft an order from an empty cart")]
    EmptyCart,

    /// Line or order totals could not be calculated.
    #[error(transparent)]
    TotalPrice(#[from] TotalPriceError),

    /// Payment discount could not be applied.
    #[error(transparent)]
    Discount(#[from] DiscountError),
}

/// Error parsing an order status.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown order status: {0:?}")]
pub struct OrderStatusError(pub String);

/// Fulfilment status of a submitted order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Awaiting payment
    #[default]
    Pending,
    /// Payment confirmed
    Paid,
    /// Handed to the carrier
    Shipped,
    /// Received by the customer
    Delivered,
    /// Cancelled
    Cancelled,
}

impl OrderStatus {
    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(OrderStatusError(s.to_string())),
        }
    }
}

/// Short human-readable order reference, e.g. `#5E1B09C4`.
///
/// Taken from the last eight hex digits of the order UUID. The leading digits of a v7 UUID are
/// its timestamp and repeat across orders placed within the same minute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderReference(String);

impl OrderReference {
    /// Reference as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Uuid> for OrderReference {
    fn from(uuid: Uuid) -> Self {
        let hex: String = uuid
            .simple()
            .to_string()
            .chars()
            .skip(24)
            .map(|digit| digit.to_ascii_uppercase())
            .collect();

        Self(format!("#{hex}"))
    }
}

impl Display for OrderReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// One line of an order, frozen at submission time.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    /// Book ordered
    pub book_id: BookId,

    /// Title at submission time
    pub title: String,

    /// Copies ordered
    pub quantity: u32,

    /// Unit price at submission time
    pub unit_price: Money<'static, Currency>,

    /// `unit_price × quantity`
    pub subtotal: Money<'static, Currency>,
}

impl OrderLine {
    /// Freeze a cart line.
    ///
    /// # Errors
    ///
    /// Returns [`TotalPriceError`] if the line subtotal overflows.
    pub fn from_cart_item(item: &CartItem) -> Result<Self, TotalPriceError> {
        Ok(Self {
            book_id: item.book_id(),
            title: item.book().title.clone(),
            quantity: item.quantity(),
            unit_price: item.book().price,
            subtotal: line_subtotal(item)?,
        })
    }
}

/// Order ready to be submitted.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    /// Who placed the order
    pub contact: Contact,

    /// Where to ship
    pub address: ShippingAddress,

    /// How the customer pays
    pub payment_method: PaymentMethod,

    /// Ordered lines, in cart order
    pub lines: SmallVec<[OrderLine; 8]>,

    /// Sum of line subtotals
    pub subtotal: Money<'static, Currency>,

    /// Payment-method discount taken off the subtotal
    pub discount: Money<'static, Currency>,

    /// Amount due
    pub total: Money<'static, Currency>,

    /// Initial status
    pub status: OrderStatus,

    /// Signed-in customer, `None` for anonymous orders
    pub customer: Option<Uuid>,
}

impl OrderDraft {
    /// Snapshot `cart` into an order draft, applying the discount for `payment_method`.
    ///
    /// # Errors
    ///
    /// - [`OrderDraftError::EmptyCart`]: the cart has no lines.
    /// - [`OrderDraftError::TotalPrice`]: a subtotal overflowed.
    /// - [`OrderDraftError::Discount`]: the payment discount could not be applied.
    pub fn from_cart(
        cart: &Cart,
        contact: Contact,
        address: ShippingAddress,
        payment_method: PaymentMethod,
        discounts: &PaymentDiscounts,
    ) -> Result<Self, OrderDraftError> {
        if cart.is_empty() {
            return Err(OrderDraftError::EmptyCart);
        }

        let lines = cart
            .items()
            .iter()
            .map(OrderLine::from_cart_item)
            .collect::<Result<SmallVec<_>, _>>()?;

        let subtotal = cart_subtotal(cart.items(), cart.currency())?;
        let discount = discounts.discount_for(&subtotal, payment_method)?;
        let total = discounts.adjusted_total(&subtotal, payment_method)?;

        Ok(Self {
            contact,
            address,
            payment_method,
            lines,
            subtotal,
            discount,
            total,
            status: OrderStatus::Pending,
            customer: None,
        })
    }

    /// Attach the signed-in customer.
    #[must_use]
    pub fn with_customer(mut self, customer: Uuid) -> Self {
        self.customer = Some(customer);
        self
    }

    /// The same order with the customer reference stripped.
    #[must_use]
    pub fn anonymous(&self) -> Self {
        Self {
            customer: None,
            ..self.clone()
        }
    }

    /// Single-line shipping address stored alongside the structured fields.
    pub fn address_line(&self) -> String {
        self.address.formatted()
    }

    /// Total copies across all lines.
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Currency of every amount on the order.
    pub fn currency(&self) -> &'static Currency {
        self.subtotal.currency()
    }
}
