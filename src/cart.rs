//! Cart
//!
//! The session-scoped cart store. All mutations go through [`Cart::add_item`],
//! [`Cart::remove_item`], [`Cart::update_quantity`] and [`Cart::clear`]; each one recomputes the
//! total from scratch and notifies subscribers.

use std::fmt::{self, Debug, Formatter};

use rusty_money::{
    Money,
    iso::{self, Currency},
};
use slotmap::{SlotMap, new_key_type};
use thiserror::Error;

use crate::{
    books::{Book, BookId},
    pricing::{TotalPriceError, cart_subtotal},
};

new_key_type! {
    /// Cart subscription key
    pub struct SubscriptionKey;
}

/// Errors raised by cart mutations. A failed mutation leaves the cart unchanged.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// A book's currency differs from the cart currency (book, book currency, cart currency).
    #[error("Book {0} has currency {1}, but cart has currency {2}")]
    CurrencyMismatch(BookId, &'static str, &'static str),

    /// The recomputed total could not be represented.
    #[error(transparent)]
    TotalPrice(#[from] TotalPriceError),
}

/// One book and the quantity requested.
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    book: Book,
    quantity: u32,
}

impl CartItem {
    pub(crate) fn new(book: Book, quantity: u32) -> Self {
        Self { book, quantity }
    }

    /// The book on this line.
    pub fn book(&self) -> &Book {
        &self.book
    }

    /// Id of the book on this line.
    pub fn book_id(&self) -> BookId {
        self.book.id
    }

    /// Requested quantity, always at least 1.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// Emitted to subscribers after every successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// A book was added or its quantity incremented.
    ItemAdded {
        /// Book added
        book_id: BookId,

        /// Resulting quantity on the line
        quantity: u32,
    },

    /// A line was removed.
    ItemRemoved {
        /// Book removed
        book_id: BookId,
    },

    /// A line's quantity was replaced.
    QuantityUpdated {
        /// Book updated
        book_id: BookId,

        /// New quantity
        quantity: u32,
    },

    /// Every line was removed.
    Cleared,
}

/// Transient "item added" notice, consumed by a toast view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartNotification {
    /// Book added
    pub book_id: BookId,

    /// Title to show
    pub title: String,

    /// Resulting quantity on the line
    pub quantity: u32,
}

type Listener = Box<dyn Fn(&CartEvent) + Send + Sync>;

/// Cart
pub struct Cart {
    items: Vec<CartItem>,
    total: Money<'static, Currency>,
    currency: &'static Currency,
    notification: Option<CartNotification>,
    listeners: SlotMap<SubscriptionKey, Listener>,
}

impl Cart {
    /// Create an empty cart in the given currency.
    pub fn new(currency: &'static Currency) -> Self {
        Cart {
            items: Vec::new(),
            total: Money::from_minor(0, currency),
            currency,
            notification: None,
            listeners: SlotMap::with_key(),
        }
    }

    /// Create a cart from existing lines, merging lines that share a book id.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] on a currency mismatch or if the total cannot be represented.
    pub fn with_items(
        items: impl IntoIterator<Item = CartItem>,
        currency: &'static Currency,
    ) -> Result<Self, CartError> {
        let mut merged: Vec<CartItem> = Vec::new();

        for item in items {
            ensure_currency(&item.book, currency)?;

            if item.quantity == 0 {
                continue;
            }

            match merged.iter_mut().find(|line| line.book.id == item.book.id) {
                Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
                None => merged.push(item),
            }
        }

        let total = cart_subtotal(&merged, currency)?;

        Ok(Cart {
            items: merged,
            total,
            currency,
            notification: None,
            listeners: SlotMap::with_key(),
        })
    }

    /// Add one copy of `book`, incrementing the existing line if the book is already present.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] on a currency mismatch or if the total cannot be represented.
    pub fn add_item(&mut self, book: &Book) -> Result<(), CartError> {
        ensure_currency(book, self.currency)?;

        let mut items = self.items.clone();

        let quantity = match items.iter_mut().find(|line| line.book.id == book.id) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(1);
                line.quantity
            }
            None => {
                items.push(CartItem::new(book.clone(), 1));
                1
            }
        };

        self.commit(
            items,
            CartEvent::ItemAdded {
                book_id: book.id,
                quantity,
            },
        )?;

        self.notification = Some(CartNotification {
            book_id: book.id,
            title: book.title.clone(),
            quantity,
        });

        Ok(())
    }

    /// Remove the line for `book_id`. Removing an absent book is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the total cannot be represented.
    pub fn remove_item(&mut self, book_id: BookId) -> Result<(), CartError> {
        if !self.contains(book_id) {
            return Ok(());
        }

        let items = self
            .items
            .iter()
            .filter(|line| line.book.id != book_id)
            .cloned()
            .collect();

        self.commit(items, CartEvent::ItemRemoved { book_id })
    }

    /// Replace the quantity on the line for `book_id`.
    ///
    /// Quantities below 1 and unknown books are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the total cannot be represented.
    pub fn update_quantity(&mut self, book_id: BookId, quantity: i64) -> Result<(), CartError> {
        let Ok(quantity) = u32::try_from(quantity) else {
            return Ok(());
        };

        if quantity < 1 || !self.contains(book_id) {
            return Ok(());
        }

        let mut items = self.items.clone();

        for line in items.iter_mut().filter(|line| line.book.id == book_id) {
            line.quantity = quantity;
        }

        self.commit(items, CartEvent::QuantityUpdated { book_id, quantity })
    }

    /// Remove every line and reset the total to zero.
    pub fn clear(&mut self) {
        let was_empty = self.items.is_empty();

        self.items.clear();
        self.total = Money::from_minor(0, self.currency);
        self.notification = None;

        if !was_empty {
            self.emit(&CartEvent::Cleared);
        }
    }

    /// Register a listener called after every mutation.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionKey
    where
        F: Fn(&CartEvent) + Send + Sync + 'static,
    {
        self.listeners.insert(Box::new(listener))
    }

    /// Remove a listener. Returns `false` if it was already removed.
    pub fn unsubscribe(&mut self, key: SubscriptionKey) -> bool {
        self.listeners.remove(key).is_some()
    }

    /// The pending "item added" notice, if any.
    pub fn notification(&self) -> Option<&CartNotification> {
        self.notification.as_ref()
    }

    /// Consume the pending "item added" notice.
    pub fn take_notification(&mut self) -> Option<CartNotification> {
        self.notification.take()
    }

    /// Lines in insertion order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// The line for `book_id`, if present.
    pub fn get(&self, book_id: BookId) -> Option<&CartItem> {
        self.items.iter().find(|line| line.book.id == book_id)
    }

    /// Whether a line exists for `book_id`.
    pub fn contains(&self, book_id: BookId) -> bool {
        self.get(book_id).is_some()
    }

    /// Sum of every line's unit price × quantity.
    pub fn total(&self) -> Money<'static, Currency> {
        self.total
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of copies across all lines.
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Get the currency of the cart.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    fn commit(&mut self, items: Vec<CartItem>, event: CartEvent) -> Result<(), CartError> {
        self.total = cart_subtotal(&items, self.currency)?;
        self.items = items;

        self.emit(&event);

        Ok(())
    }

    fn emit(&self, event: &CartEvent) {
        for listener in self.listeners.values() {
            listener(event);
        }
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new(iso::BRL)
    }
}

impl Debug for Cart {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cart")
            .field("items", &self.items)
            .field("total", &self.total)
            .field("currency", &self.currency.iso_alpha_code)
            .field("notification", &self.notification)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

fn ensure_currency(book: &Book, currency: &'static Currency) -> Result<(), CartError> {
    let book_currency = book.currency();

    if book_currency == currency {
        Ok(())
    } else {
        Err(CartError::CurrencyMismatch(
            book.id,
            book_currency.iso_alpha_code,
            currency.iso_alpha_code,
        ))
    }
}
