//! Discounts
//!
//! Markdown percentages derived from list prices, and payment-method discounts applied to the
//! checkout total. Neither is ever stored on the cart: both are recomputed from current prices.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rustc_hash::FxHashMap;
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::payment::PaymentMethod;

/// Errors specific to discount calculations.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Markdown from `original` to `price` in whole percent points.
///
/// Returns 0 when there is no list price or the list price does not exceed the sale price.
/// Otherwise `round((1 - price / original) × 100)`, rounding half away from zero.
pub fn discount_percent(
    original: Option<&Money<'_, Currency>>,
    price: &Money<'_, Currency>,
) -> u32 {
    let Some(original) = original else {
        return 0;
    };

    let original_minor = original.to_minor_units();
    let price_minor = price.to_minor_units().max(0);

    if original_minor <= price_minor {
        return 0;
    }

    let (Some(original_minor), Some(price_minor)) =
        (Decimal::from_i64(original_minor), Decimal::from_i64(price_minor))
    else {
        return 0;
    };

    ((Decimal::ONE - price_minor / original_minor) * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0)
}

/// Percentage discounts granted per payment method.
#[derive(Debug, Clone)]
pub struct PaymentDiscounts {
    rates: FxHashMap<PaymentMethod, Percentage>,
}

impl PaymentDiscounts {
    /// No payment method earns a discount.
    pub fn none() -> Self {
        Self {
            rates: FxHashMap::default(),
        }
    }

    /// Grant `percent` off the total when paying with `method`.
    #[must_use]
    pub fn with_rate(mut self, method: PaymentMethod, percent: Percentage) -> Self {
        self.rates.insert(method, percent);
        self
    }

    /// Discount rate for `method`, if any.
    pub fn rate(&self, method: PaymentMethod) -> Option<Percentage> {
        self.rates.get(&method).copied()
    }

    /// Amount taken off `subtotal` when paying with `method`.
    ///
    /// # Errors
    ///
    /// Returns [`DiscountError::PercentConversion`] when the discount cannot be represented in
    /// minor units.
    pub fn discount_for<'a>(
        &self,
        subtotal: &Money<'a, Currency>,
        method: PaymentMethod,
    ) -> Result<Money<'a, Currency>, DiscountError> {
        let discount_minor = match self.rate(method) {
            Some(percent) => percent_of_minor(&percent, subtotal.to_minor_units())?,
            None => 0,
        };

        Ok(Money::from_minor(discount_minor, subtotal.currency()))
    }

    /// `subtotal` less the discount for `method`.
    ///
    /// # Errors
    ///
    /// Returns an error if the discount cannot be calculated or subtracted.
    pub fn adjusted_total<'a>(
        &self,
        subtotal: &Money<'a, Currency>,
        method: PaymentMethod,
    ) -> Result<Money<'a, Currency>, DiscountError> {
        let discount = self.discount_for(subtotal, method)?;

        Ok(subtotal.sub(discount)?)
    }
}

impl Default for PaymentDiscounts {
    /// Pix payments earn 5% off.
    fn default() -> Self {
        Self::none().with_rate(PaymentMethod::Pix, Percentage::from(Decimal::new(5, 2)))
    }
}

/// Applies the default payment-method discount (5% for pix) to a checkout subtotal.
///
/// # Errors
///
/// Returns an error if the discount cannot be calculated or subtracted.
pub fn payment_adjusted_total<'a>(
    subtotal: &Money<'a, Currency>,
    method: PaymentMethod,
) -> Result<Money<'a, Currency>, DiscountError> {
    PaymentDiscounts::default().adjusted_total(subtotal, method)
}

/// Calculate the discount amount in minor units based on a percentage and a minor unit amount.
///
/// # Errors
///
/// Returns [`DiscountError::PercentConversion`] if the calculation overflows or cannot be
/// represented in minor units.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    ((*percent) * Decimal::ONE)
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::BRL;
    use testresult::TestResult;

    use super::*;

    fn brl(minor: i64) -> Money<'static, Currency> {
        Money::from_minor(minor, BRL)
    }

    #[test]
    fn discount_percent_of_marked_down_book() {
        assert_eq!(discount_percent(Some(&brl(100_00)), &brl(80_00)), 20);
    }

    #[test]
    fn discount_percent_is_zero_without_markdown() {
        assert_eq!(discount_percent(Some(&brl(80_00)), &brl(80_00)), 0);
        assert_eq!(discount_percent(Some(&brl(70_00)), &brl(80_00)), 0);
        assert_eq!(discount_percent(None, &brl(80_00)), 0);
    }

    #[test]
    fn discount_percent_rounds_half_up() {
        // 1 - 59.25 / 79.00 = 0.25 exactly; 1 - 66.50 / 79.90 = 0.16770...
        assert_eq!(discount_percent(Some(&brl(79_00)), &brl(59_25)), 25);
        assert_eq!(discount_percent(Some(&brl(79_90)), &brl(66_50)), 17);
        // 1 - 99.50 / 100.00 = 0.005 -> 0.5% rounds to 1
        assert_eq!(discount_percent(Some(&brl(100_00)), &brl(99_50)), 1);
    }

    #[test]
    fn pix_takes_five_percent_off() -> TestResult {
        let total = payment_adjusted_total(&brl(200_00), PaymentMethod::Pix)?;

        assert_eq!(total, brl(190_00));

        Ok(())
    }

    #[test]
    fn other_methods_pay_the_subtotal() -> TestResult {
        assert_eq!(
            payment_adjusted_total(&brl(200_00), PaymentMethod::CreditCard)?,
            brl(200_00)
        );
        assert_eq!(
            payment_adjusted_total(&brl(200_00), PaymentMethod::Boleto)?,
            brl(200_00)
        );

        Ok(())
    }

    #[test]
    fn pix_total_rounds_to_minor_units() -> TestResult {
        // 99.80 × 0.95 = 94.81
        assert_eq!(
            payment_adjusted_total(&brl(99_80), PaymentMethod::Pix)?,
            brl(94_81)
        );

        Ok(())
    }

    #[test]
    fn custom_rates_replace_the_default() -> TestResult {
        let discounts = PaymentDiscounts::none()
            .with_rate(PaymentMethod::Boleto, Percentage::from(Decimal::new(10, 2)));

        assert_eq!(
            discounts.adjusted_total(&brl(50_00), PaymentMethod::Boleto)?,
            brl(45_00)
        );
        assert_eq!(
            discounts.adjusted_total(&brl(50_00), PaymentMethod::Pix)?,
            brl(50_00)
        );
        assert_eq!(discounts.discount_for(&brl(50_00), PaymentMethod::Boleto)?, brl(5_00));

        Ok(())
    }

    #[test]
    fn percent_of_minor_overflow_returns_error() {
        let percent = Percentage::from(2.0);
        let result = percent_of_minor(&percent, i64::MAX);

        assert!(matches!(result, Err(DiscountError::PercentConversion)));
    }

    #[test]
    fn percent_of_minor_calculates_correctly() -> TestResult {
        let percent = Percentage::from(0.25);

        assert_eq!(percent_of_minor(&percent, 200)?, 50);

        Ok(())
    }
}
