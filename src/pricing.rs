//! Pricing

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::cart::CartItem;

/// Errors that can occur while calculating line or cart totals.
#[derive(Debug, Error, PartialEq)]
pub enum TotalPriceError {
    /// Unit price multiplied by quantity does not fit in minor units.
    #[error("line subtotal overflowed: {quantity} x {unit_minor} minor units")]
    Overflow {
        /// Unit price in minor units
        unit_minor: i64,

        /// Requested quantity
        quantity: u32,
    },

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Calculates `unit price × quantity` for a single cart line.
///
/// # Errors
///
/// Returns [`TotalPriceError::Overflow`] when the product does not fit in minor units.
pub fn line_subtotal(item: &CartItem) -> Result<Money<'static, Currency>, TotalPriceError> {
    let unit = item.book().price;
    let unit_minor = unit.to_minor_units();
    let quantity = item.quantity();

    let minor = unit_minor
        .checked_mul(i64::from(quantity))
        .ok_or(TotalPriceError::Overflow {
            unit_minor,
            quantity,
        })?;

    Ok(Money::from_minor(minor, unit.currency()))
}

/// Calculates the sum of all line subtotals.
///
/// An empty slice yields zero in `currency`.
///
/// # Errors
///
/// - [`TotalPriceError::Overflow`]: a line subtotal does not fit in minor units.
/// - [`TotalPriceError::Money`]: a line is priced in a currency other than `currency`.
pub fn cart_subtotal(
    items: &[CartItem],
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, TotalPriceError> {
    items
        .iter()
        .try_fold(Money::from_minor(0, currency), |acc, item| {
            Ok(acc.add(line_subtotal(item)?)?)
        })
}

/// Converts a major-unit decimal amount (e.g. `49.90`) into money, rounding half away from zero
/// to the currency's minor unit.
///
/// Returns `None` when the amount does not fit in minor units.
pub fn money_from_decimal(
    amount: Decimal,
    currency: &'static Currency,
) -> Option<Money<'static, Currency>> {
    let scale = 10_i64.checked_pow(currency.exponent)?;

    let minor = amount
        .checked_mul(Decimal::from(scale))?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()?;

    Some(Money::from_minor(minor, currency))
}

/// Converts money into a major-unit decimal amount (e.g. `9980` BRL minor units into `99.80`).
pub fn money_to_decimal(money: &Money<'_, Currency>) -> Decimal {
    Decimal::new(money.to_minor_units(), money.currency().exponent)
}
