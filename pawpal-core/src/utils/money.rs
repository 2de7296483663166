//! Conversions between decimal prices and gateway minor units.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Convert a positive price with at most two decimal places to minor units.
///
/// Returns `None` for zero, negative, sub-paisa or out-of-range amounts.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    if amount <= Decimal::ZERO {
        return None;
    }
    let scaled = amount.checked_mul(Decimal::ONE_HUNDRED)?;
    if !scaled.fract().is_zero() {
        return None;
    }
    scaled.to_i64()
}

pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}
