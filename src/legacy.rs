//! Legacy Carts
//!
//! Older storefront builds persisted carts in two shapes: a flat array of lines with the book
//! fields inlined, and an object wrapping `{livro, quantidade}` pairs with a stored total. Both
//! are normalized once, here, into a [`Cart`]. Stored totals are ignored and recomputed.

use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    books::{Book, BookId},
    cart::{Cart, CartError, CartItem},
    pricing::money_from_decimal,
};

/// Errors that can occur while normalizing a legacy cart.
#[derive(Debug, Error)]
pub enum LegacyCartError {
    /// The payload matched neither legacy shape.
    #[error("unrecognized cart payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// A price was negative or could not be represented in minor units.
    #[error("invalid price {price} for book {book_id}")]
    Price {
        /// Offending book
        book_id: BookId,

        /// Price as stored
        price: Decimal,
    },

    /// A line carried a negative or oversized quantity.
    #[error("invalid quantity {quantity} for book {book_id}")]
    Quantity {
        /// Offending book
        book_id: BookId,

        /// Quantity as stored
        quantity: i64,
    },

    /// The normalized lines could not form a cart.
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Book identifier as stored by older builds: a UUID, or a sequential number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LegacyId {
    /// UUID identifier
    Uuid(Uuid),

    /// Sequential identifier, mapped into the UUID space
    Numeric(u64),
}

impl From<LegacyId> for BookId {
    fn from(id: LegacyId) -> Self {
        match id {
            LegacyId::Uuid(uuid) => BookId::from_uuid(uuid),
            LegacyId::Numeric(number) => BookId::from_uuid(Uuid::from_u128(u128::from(number))),
        }
    }
}

/// Book fields as stored inside a legacy cart.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyBook {
    /// Book id
    pub id: LegacyId,

    /// Title
    pub titulo: String,

    /// Author
    #[serde(default)]
    pub autor: String,

    /// Unit price in major units
    pub preco: Decimal,

    /// List price in major units
    #[serde(default, rename = "precoOriginal", alias = "preco_original")]
    pub preco_original: Option<Decimal>,

    /// Cover image
    #[serde(default)]
    pub imagem: Option<String>,
}

/// A line in the flat shape: book fields and quantity side by side.
#[derive(Debug, Clone, Deserialize)]
pub struct FlatLine {
    /// Inlined book fields
    #[serde(flatten)]
    pub livro: LegacyBook,

    /// Quantity
    pub quantidade: i64,
}

/// A line in the nested shape.
#[derive(Debug, Clone, Deserialize)]
pub struct NestedLine {
    /// Book
    pub livro: LegacyBook,

    /// Quantity
    pub quantidade: i64,
}

/// The nested shape: lines plus a stored total.
#[derive(Debug, Clone, Deserialize)]
pub struct NestedCart {
    /// Lines
    pub itens: Vec<NestedLine>,

    /// Stored total; never trusted
    #[serde(default)]
    pub total: Option<Decimal>,
}

/// A cart in either legacy shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LegacyCart {
    /// `[{id, titulo, autor, preco, quantidade, imagem}]`
    Flat(Vec<FlatLine>),

    /// `{itens: [{livro, quantidade}], total}`
    Nested(NestedCart),
}

impl LegacyCart {
    /// Parse a JSON payload in either shape.
    ///
    /// # Errors
    ///
    /// Returns [`LegacyCartError::Decode`] when the payload matches neither shape.
    pub fn from_json(json: &str) -> Result<Self, LegacyCartError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Normalize into a [`Cart`] priced in `currency`.
    ///
    /// Lines with quantity 0 are dropped and repeated books are merged.
    ///
    /// # Errors
    ///
    /// Returns a [`LegacyCartError`] if a price or quantity cannot be represented, or if the
    /// resulting cart total overflows.
    pub fn into_cart(self, currency: &'static Currency) -> Result<Cart, LegacyCartError> {
        let lines: Vec<(LegacyBook, i64)> = match self {
            LegacyCart::Flat(lines) => lines
                .into_iter()
                .map(|line| (line.livro, line.quantidade))
                .collect(),
            LegacyCart::Nested(cart) => cart
                .itens
                .into_iter()
                .map(|line| (line.livro, line.quantidade))
                .collect(),
        };

        let items = lines
            .into_iter()
            .map(|(book, quantity)| normalize_line(book, quantity, currency))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Cart::with_items(items, currency)?)
    }
}

fn normalize_line(
    book: LegacyBook,
    quantity: i64,
    currency: &'static Currency,
) -> Result<CartItem, LegacyCartError> {
    let book_id = BookId::from(book.id);

    let quantity = u32::try_from(quantity)
        .map_err(|_out_of_range| LegacyCartError::Quantity { book_id, quantity })?;

    let to_money = |price: Decimal| {
        money_from_decimal(price, currency)
            .filter(|money| money.to_minor_units() >= 0)
            .ok_or(LegacyCartError::Price { book_id, price })
    };

    let mut normalized = Book::new(book_id, book.titulo, book.autor, to_money(book.preco)?);

    if let Some(original) = book.preco_original {
        normalized = normalized.with_original_price(to_money(original)?);
    }

    if let Some(image) = book.imagem {
        normalized = normalized.with_cover_image(image);
    }

    Ok(CartItem::new(normalized, quantity))
}
