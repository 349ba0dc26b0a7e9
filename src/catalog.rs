//! Catalog
//!
//! Books loaded from a YAML catalog file:
//!
//! ```yaml
//! books:
//!   dom-casmurro:
//!     id: 0192f4a1-7c3e-7b00-8000-000000000001
//!     title: Dom Casmurro
//!     author: Machado de Assis
//!     price: 49.90 BRL
//!     original_price: 59.90 BRL
//! ```

use std::{fs, path::Path};

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    books::{Book, BookId},
    pricing::money_from_decimal,
};

/// Catalog loading errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading the catalog file
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Books priced in more than one currency
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),
}

/// Wrapper for books in YAML
#[derive(Debug, Deserialize)]
pub struct CatalogFixture {
    /// Map of slug -> book fixture
    pub books: FxHashMap<String, BookFixture>,
}

/// Book Fixture
#[derive(Debug, Deserialize)]
pub struct BookFixture {
    /// Catalog id
    pub id: BookId,

    /// Title
    pub title: String,

    /// Author
    pub author: String,

    /// Sale price (e.g., "49.90 BRL")
    pub price: String,

    /// List price (e.g., "59.90 BRL")
    #[serde(default)]
    pub original_price: Option<String>,

    /// Cover image
    #[serde(default)]
    pub cover_image: Option<String>,
}

impl BookFixture {
    fn into_book(self, slug: String) -> Result<Book, CatalogError> {
        let price = parse_price(&self.price)?;

        let mut book = Book::new(self.id, self.title, self.author, price).with_slug(slug);

        if let Some(original_price) = self.original_price {
            book = book.with_original_price(parse_price(&original_price)?);
        }

        if let Some(cover_image) = self.cover_image {
            book = book.with_cover_image(cover_image);
        }

        Ok(book)
    }
}

/// Books available for sale, ordered by slug.
#[derive(Debug, Clone)]
pub struct Catalog {
    books: Vec<Book>,
    currency: &'static Currency,
}

impl Catalog {
    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the file cannot be read or parsed, or if a price is invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml(&contents)
    }

    /// Parse a catalog from YAML text.
    ///
    /// An empty catalog is priced in BRL.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the text cannot be parsed, if a price is invalid, or if
    /// books are priced in different currencies.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let fixture: CatalogFixture = serde_norway::from_str(yaml)?;

        let mut books = fixture
            .books
            .into_iter()
            .map(|(slug, book)| book.into_book(slug))
            .collect::<Result<Vec<_>, _>>()?;

        books.sort_by(|a, b| a.slug.cmp(&b.slug));

        let currency = books.first().map_or(iso::BRL, Book::currency);

        if let Some(other) = books.iter().find(|book| book.currency() != currency) {
            return Err(CatalogError::CurrencyMismatch(
                currency.iso_alpha_code.to_string(),
                other.currency().iso_alpha_code.to_string(),
            ));
        }

        Ok(Self { books, currency })
    }

    /// All books, ordered by slug.
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// Look up a book by slug.
    pub fn get(&self, slug: &str) -> Option<&Book> {
        self.books
            .binary_search_by(|book| book.slug.as_str().cmp(slug))
            .ok()
            .and_then(|index| self.books.get(index))
    }

    /// Look up a book by id.
    pub fn find(&self, id: BookId) -> Option<&Book> {
        self.books.iter().find(|book| book.id == id)
    }

    /// Currency shared by every book.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Number of books.
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// Whether the catalog has no books.
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

/// Parse price string (e.g., "49.90 BRL") into money, rounding to the currency's minor unit.
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY", if the amount cannot
/// be parsed as a decimal, or if the currency code is not recognized.
pub fn parse_price(s: &str) -> Result<Money<'static, Currency>, CatalogError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(CatalogError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| CatalogError::InvalidPrice(s.to_string()))?;

    let currency = iso::find(code).ok_or_else(|| CatalogError::UnknownCurrency(code.to_string()))?;

    money_from_decimal(amount, currency).ok_or_else(|| CatalogError::InvalidPrice(s.to_string()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use rusty_money::iso::BRL;
    use testresult::TestResult;

    use super::*;

    const CATALOG: &str = r"
books:
  vidas-secas:
    id: 0192f4a1-7c3e-7b00-8000-000000000002
    title: Vidas Secas
    author: Graciliano Ramos
    price: 35.00 BRL
  dom-casmurro:
    id: 0192f4a1-7c3e-7b00-8000-000000000001
    title: Dom Casmurro
    author: Machado de Assis
    price: 49.90 BRL
    original_price: 59.90 BRL
    cover_image: covers/dom-casmurro.jpg
";

    #[test]
    fn parse_price_rejects_invalid_format() {
        let result = parse_price("49.90BRL");

        assert!(matches!(result, Err(CatalogError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        let result = parse_price("49.90 ABC");

        assert!(matches!(result, Err(CatalogError::UnknownCurrency(code)) if code == "ABC"));
    }

    #[test]
    fn parse_price_reads_major_units() -> TestResult {
        assert_eq!(parse_price("49.90 BRL")?, Money::from_minor(49_90, BRL));

        Ok(())
    }

    #[test]
    fn catalog_is_ordered_by_slug() -> TestResult {
        let catalog = Catalog::from_yaml(CATALOG)?;

        let slugs: Vec<&str> = catalog.books().iter().map(|book| book.slug.as_str()).collect();

        assert_eq!(slugs, ["dom-casmurro", "vidas-secas"]);
        assert_eq!(catalog.currency(), BRL);

        Ok(())
    }

    #[test]
    fn books_carry_list_prices_and_covers() -> TestResult {
        let catalog = Catalog::from_yaml(CATALOG)?;

        let Some(book) = catalog.get("dom-casmurro") else {
            unreachable!("dom-casmurro is in the catalog");
        };

        assert_eq!(book.original_price, Some(Money::from_minor(59_90, BRL)));
        assert_eq!(book.cover_image.as_deref(), Some("covers/dom-casmurro.jpg"));
        assert_eq!(book.discount_percent(), 17);
        assert_eq!(catalog.find(book.id), Some(book));

        Ok(())
    }

    #[test]
    fn mixed_currencies_are_rejected() {
        let yaml = r"
books:
  a:
    id: 0192f4a1-7c3e-7b00-8000-000000000001
    title: A
    author: A
    price: 10.00 BRL
  b:
    id: 0192f4a1-7c3e-7b00-8000-000000000002
    title: B
    author: B
    price: 10.00 USD
";

        let result = Catalog::from_yaml(yaml);

        assert!(
            matches!(result, Err(CatalogError::CurrencyMismatch(_, _))),
            "expected CurrencyMismatch, got {result:?}"
        );
    }

    #[test]
    fn from_path_reads_files() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;

        file.write_all(CATALOG.as_bytes())?;

        let catalog = Catalog::from_path(file.path())?;

        assert_eq!(catalog.len(), 2);

        Ok(())
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = Catalog::from_path("/nonexistent/catalog.yml");

        assert!(
            matches!(result, Err(CatalogError::Io(_))),
            "expected Io, got {result:?}"
        );
    }
}
