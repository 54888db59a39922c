//! Rounding and comparison helpers shared by the calculators.
//!
//! Money is rounded half-up to the cent at the last step of each component;
//! rates reported to the caller are rounded to four decimal places.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a money amount to the cent, half away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Truncates a money amount to the cent.
pub fn round_down(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::ToZero)
}

/// Rounds a rate fraction to four decimal places (`0.24315` becomes `0.2432`).
pub fn round_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

/// Largest multiple of `step` that is not above `value`.
///
/// `step` must be positive; callers validate it through configuration.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::floor_to_step;
///
/// assert_eq!(floor_to_step(dec!(5.4596), dec!(0.1)), dec!(5.4));
/// assert_eq!(floor_to_step(dec!(6), dec!(0.5)), dec!(6));
/// ```
pub fn floor_to_step(
    value: Decimal,
    step: Decimal,
) -> Decimal {
    ((value / step).floor() * step).normalize()
}

/// Returns the maximum of two decimal values.
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Returns the minimum of two decimal values.
pub fn min(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a < b { a } else { b }
}
