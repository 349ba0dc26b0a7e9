//! Books

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::discounts::discount_percent;

/// Catalog identifier of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(Uuid);

impl BookId {
    /// Generate a new, time-ordered book id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Return the underlying UUID.
    pub const fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for BookId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for BookId {
    fn from(value: Uuid) -> Self {
        Self::from_uuid(value)
    }
}

impl FromStr for BookId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// A catalog entry that can be placed in a cart.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    /// Catalog id
    pub id: BookId,

    /// Book title
    pub title: String,

    /// Book author
    pub author: String,

    /// Unit (sale) price
    pub price: Money<'static, Currency>,

    /// List price before any markdown
    pub original_price: Option<Money<'static, Currency>>,

    /// Cover image reference
    pub cover_image: Option<String>,

    /// URL slug
    pub slug: String,
}

impl Book {
    /// Creates a new book with a slug derived from its title.
    pub fn new(
        id: BookId,
        title: impl Into<String>,
        author: impl Into<String>,
        price: Money<'static, Currency>,
    ) -> Self {
        let title = title.into();
        let slug = slugify(&title);

        Self {
            id,
            title,
            author: author.into(),
            price,
            original_price: None,
            cover_image: None,
            slug,
        }
    }

    /// Sets the list price.
    #[must_use]
    pub fn with_original_price(mut self, original_price: Money<'static, Currency>) -> Self {
        self.original_price = Some(original_price);
        self
    }

    /// Sets the cover image reference.
    #[must_use]
    pub fn with_cover_image(mut self, cover_image: impl Into<String>) -> Self {
        self.cover_image = Some(cover_image.into());
        self
    }

    /// Overrides the derived slug.
    #[must_use]
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    /// Markdown from the list price, in whole percent points.
    pub fn discount_percent(&self) -> u32 {
        discount_percent(self.original_price.as_ref(), &self.price)
    }

    /// Currency the book is priced in.
    pub fn currency(&self) -> &'static Currency {
        self.price.currency()
    }
}

/// Lowercase, hyphen-separated slug built from the alphanumeric runs of `title`.
pub fn slugify(title: &str) -> String {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
