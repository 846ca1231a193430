//! Cart price calculations.
//!
//! Pure functions for pricing math - no store access.

use rust_decimal::prelude::*;
use rust_decimal_macros::dec;

use crate::error::{AppError, Result};

/// Decimal places stored for prices, discounts and offer values
pub const MONEY_PLACES: u32 = 2;

/// Largest value a `NUMERIC(12, 2)` column holds
pub const MAX_AMOUNT: Decimal = dec!(9999999999.99);

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Banker's rounding rounds to the nearest even number when the value is exactly
/// halfway between two possibilities. This reduces cumulative rounding bias.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use storefront_api::cart::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Unit price after the line's own discount percentage.
///
/// A missing or zero discount leaves the price untouched. The result is exact;
/// rounding happens only when totals are presented.
pub fn final_price(price: Decimal, discount: Option<Decimal>) -> Decimal {
    match discount {
        Some(d) if d > Decimal::ZERO => price * (Decimal::ONE - d / Decimal::ONE_HUNDRED),
        _ => price,
    }
}

/// `final_price * quantity`
pub fn line_total(final_price: Decimal, quantity: i32) -> Result<Decimal> {
    final_price
        .checked_mul(Decimal::from(quantity))
        .ok_or_else(|| AppError::validation("line total is too large"))
}

/// Sum of line totals, rounded to cents
pub fn cart_total<I>(line_totals: I) -> Result<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    let sum = line_totals
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, total| acc.checked_add(total))
        .ok_or_else(|| AppError::validation("cart total is too large"))?;
    Ok(round_money(sum, MONEY_PLACES))
}

/// Check that `amount` lies in `0..=max` with at most two decimal places.
///
/// The Postgres columns are fixed at two places, so anything finer would be
/// rounded on write and read back as a different value.
pub fn validate_amount(field: &str, amount: Decimal, max: Decimal) -> Result<()> {
    if amount < Decimal::ZERO || amount > max {
        return Err(AppError::validation(format!(
            "{} must be between 0 and {}",
            field, max
        )));
    }
    if amount.normalize().scale() > MONEY_PLACES {
        return Err(AppError::validation(format!(
            "{} must have at most {} decimal places",
            field, MONEY_PLACES
        )));
    }
    Ok(())
}

pub fn validate_discount(discount: Decimal) -> Result<()> {
    validate_amount("discount", discount, Decimal::ONE_HUNDRED)
}

pub fn validate_quantity(quantity: i32) -> Result<()> {
    if quantity < 1 {
        return Err(AppError::validation("quantity must be at least 1"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_money_bankers() {
        assert_eq!(round_money(dec!(2.5), 0), dec!(2));
        assert_eq!(round_money(dec!(3.5), 0), dec!(4));
        assert_eq!(round_money(dec!(1.005), 2), dec!(1.00));
        assert_eq!(round_money(dec!(1.015), 2), dec!(1.02));
    }

    #[test]
    fn test_final_price_without_discount() {
        assert_eq!(final_price(dec!(80), None), dec!(80));
        assert_eq!(final_price(dec!(80), Some(dec!(0))), dec!(80));
    }

    #[test]
    fn test_final_price_applies_percentage() {
        let cases = [
            (dec!(100), dec!(10), dec!(90)),
            (dec!(19.99), dec!(25), dec!(14.9925)),
            (dec!(0), dec!(50), dec!(0)),
            (dec!(49.50), dec!(100), dec!(0)),
            (dec!(12.34), dec!(0.5), dec!(12.2783)),
        ];
        for (price, discount, expected) in cases {
            assert_eq!(final_price(price, Some(discount)), expected, "{} at {}%", price, discount);
            assert_eq!(
                final_price(price, Some(discount)),
                price * (Decimal::ONE - discount / Decimal::ONE_HUNDRED)
            );
        }
    }

    #[test]
    fn test_cart_total_rounds_once() {
        let totals = [
            line_total(dec!(14.9925), 2).unwrap(),
            line_total(dec!(0.005), 1).unwrap(),
        ];
        assert_eq!(cart_total(totals).unwrap(), dec!(29.99));
        assert_eq!(cart_total(Vec::<Decimal>::new()).unwrap(), dec!(0));
    }

    #[test]
    fn test_overflow_is_a_validation_error() {
        assert!(matches!(
            line_total(Decimal::MAX, 2),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            cart_total([Decimal::MAX, Decimal::ONE]),
            Err(AppError::Validation(_))
        ));
        assert_eq!(line_total(MAX_AMOUNT, i32::MAX).unwrap(), MAX_AMOUNT * Decimal::from(i32::MAX));
    }

    #[test]
    fn test_amount_scale_and_range() {
        assert!(validate_amount("price", MAX_AMOUNT, MAX_AMOUNT).is_ok());
        assert!(validate_amount("price", dec!(10.000), MAX_AMOUNT).is_ok());
        assert!(validate_amount("price", dec!(10000000000), MAX_AMOUNT).is_err());
        assert!(matches!(
            validate_amount("price", dec!(19.999), MAX_AMOUNT),
            Err(AppError::Validation(ref m)) if m.contains("decimal places")
        ));
        assert!(validate_discount(dec!(12.345)).is_err());
        assert!(validate_discount(dec!(12.34)).is_ok());
    }

    #[test]
    fn test_discount_bounds() {
        assert!(validate_discount(dec!(0)).is_ok());
        assert!(validate_discount(dec!(100)).is_ok());
        assert!(validate_discount(dec!(-0.01)).is_err());
        assert!(validate_discount(dec!(100.01)).is_err());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(1).is_ok());
    }
}
