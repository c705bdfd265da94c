//! Decimal helpers for rupee amounts.
//!
//! Amounts are `rust_decimal::Decimal` end to end so that totals are exact; the only
//! rounding happens at the currency subunit (paise) boundary.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

/// Number of decimal places kept for currency amounts.
pub const CURRENCY_SCALE: u32 = 2;

/// Smallest quantity step a customer can order (half a kilo or half a piece).
pub fn quantity_step() -> Decimal {
    Decimal::new(5, 1)
}

/// Largest amount an order column holds (`NUMERIC(12, 2)`).
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, CURRENCY_SCALE)
}

/// Largest line quantity (`NUMERIC(8, 2)`).
pub fn max_quantity() -> Decimal {
    Decimal::new(99_999_999, CURRENCY_SCALE)
}

/// `quantity × price`, rounded to the currency subunit. `None` on overflow.
pub fn line_total(quantity: Decimal, price: Decimal) -> Option<Decimal> {
    quantity
        .checked_mul(price)
        .map(|total| total.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero))
}

/// Converts a rupee amount into paise for the payment provider. Returns `None` when the
/// amount is negative or carries precision below one paisa.
pub fn to_subunits(amount: Decimal) -> Option<i64> {
    if amount.is_sign_negative() {
        return None;
    }
    let subunits = amount * Decimal::ONE_HUNDRED;
    if subunits.fract() != Decimal::ZERO {
        return None;
    }
    subunits.to_i64()
}

/// True when `quantity` is a positive whole multiple of [`quantity_step`].
pub fn is_step_multiple(quantity: Decimal) -> bool {
    quantity > Decimal::ZERO && (quantity % quantity_step()).is_zero()
}
