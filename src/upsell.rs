//! Upsell
//!
//! Suggests catalog books that would bring a cart up to a bundle threshold, such as a free
//! shipping minimum or a "buy 3" offer.

use rusty_money::{Money, MoneyError, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{books::Book, cart::Cart};

/// Errors that can occur while building a recommendation.
#[derive(Debug, Error)]
pub enum UpsellError {
    /// Threshold and cart are in different currencies.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// What a cart has to reach for the bundle to apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BundleThreshold {
    /// Minimum number of copies
    Items(u64),

    /// Minimum cart total
    Spend(Money<'static, Currency>),
}

/// How far a cart is from its threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shortfall {
    /// Copies still needed
    Items(u64),

    /// Amount still to spend
    Spend(Money<'static, Currency>),
}

/// Books suggested to close a shortfall.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation<'a> {
    /// Gap between the cart and the threshold
    pub shortfall: Shortfall,

    /// Suggested books, best first
    pub books: SmallVec<[&'a Book; 4]>,
}

/// Recommend up to `limit` catalog books not already in `cart` that move it towards `threshold`.
///
/// Returns `None` when the cart already meets the threshold. For [`BundleThreshold::Items`] the
/// cheapest books are suggested, at most one per missing copy. For [`BundleThreshold::Spend`]
/// the cheapest book that closes the gap on its own comes first, followed by the remaining books
/// from cheapest up.
///
/// # Errors
///
/// Returns [`UpsellError::Money`] when the threshold is in another currency than the cart.
pub fn recommend<'a>(
    cart: &Cart,
    catalog: impl IntoIterator<Item = &'a Book>,
    threshold: BundleThreshold,
    limit: usize,
) -> Result<Option<Recommendation<'a>>, UpsellError> {
    let mut candidates: Vec<&'a Book> = catalog
        .into_iter()
        .filter(|book| !cart.contains(book.id))
        .filter(|book| book.currency() == cart.currency())
        .collect();

    candidates.sort_by(|a, b| {
        a.price
            .to_minor_units()
            .cmp(&b.price.to_minor_units())
            .then_with(|| a.title.cmp(&b.title))
    });

    match threshold {
        BundleThreshold::Items(required) => {
            let missing = required.saturating_sub(cart.item_count());

            if missing == 0 {
                return Ok(None);
            }

            let take = usize::try_from(missing).map_or(limit, |missing| missing.min(limit));

            Ok(Some(Recommendation {
                shortfall: Shortfall::Items(missing),
                books: candidates.into_iter().take(take).collect(),
            }))
        }
        BundleThreshold::Spend(required) => {
            let gap = required.sub(cart.total())?;

            if gap.to_minor_units() <= 0 {
                return Ok(None);
            }

            let closer = candidates
                .iter()
                .position(|book| book.price.to_minor_units() >= gap.to_minor_units());

            if let Some(index) = closer {
                let book = candidates.remove(index);
                candidates.insert(0, book);
            }

            Ok(Some(Recommendation {
                shortfall: Shortfall::Spend(gap),
                books: candidates.into_iter().take(limit).collect(),
            }))
        }
    }
}
